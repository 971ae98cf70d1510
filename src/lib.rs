//! Asset Inventory - HTTP backend for browsing cloud asset inventory held in a
//! SQL warehouse.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod logging;
pub mod query;
pub mod safety;
pub mod shaping;
