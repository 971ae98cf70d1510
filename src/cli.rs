//! Command-line argument parsing for the inventory server.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// HTTP backend serving cloud asset inventory from a SQL warehouse.
#[derive(Parser, Debug)]
#[command(name = "asset-inventory")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on (e.g., 0.0.0.0:8000)
    #[arg(short = 'b', long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Directory holding the built frontend bundle
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies flags on top of an already loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(dir) = &self.static_dir {
            config.server.static_dir = dir.clone();
        }
        if let Some(path) = &self.log_file {
            config.server.log_file = Some(path.clone());
        }
    }
}
