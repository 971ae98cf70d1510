//! Asset Inventory - HTTP backend for browsing cloud asset inventory.

use std::sync::Arc;

use asset_inventory::cli::Cli;
use asset_inventory::config::Config;
use asset_inventory::db::WarehouseConnector;
use asset_inventory::error::Result;
use asset_inventory::http::{self, AppState};
use asset_inventory::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // A missing .env file is normal outside local development
    let dotenv = dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let config = load_config(&cli)?;

    logging::init(config.server.log_file.as_deref())?;
    if let Some(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    info!("Loaded config from: {}", cli.config_path().display());

    config.validate()?;

    let connector = Arc::new(WarehouseConnector::new(config.warehouse.clone()));
    let bind = config.server.bind.clone();
    let state = AppState::new(config, connector);

    http::serve(state, &bind).await
}

/// Resolves configuration with precedence: CLI flags, then environment
/// variables, then the config file, then defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_from_file(&cli.config_path())?;
    config.apply_env_overrides()?;
    cli.apply_to(&mut config);
    Ok(config)
}
