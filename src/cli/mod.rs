//! CLI module for the offline gateway
//!
//! Provides subcommands:
//! - `serve`: install and activate the configured version, then proxy (default)
//! - `provision`: populate the static partition and exit
//! - `partitions`: list the partitions in the configured store

pub mod partitions;
pub mod provision;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Offline Gateway - offline-first caching reverse proxy
#[derive(Parser)]
#[command(name = "offline-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install and activate, then serve the proxy and control API
    Serve,

    /// Provision the static partition for the configured version and exit
    Provision,

    /// List partitions in the configured store
    Partitions(partitions::PartitionsArgs),
}

/// Loads `.env` and the layered configuration
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    Ok(AppConfig::load()?)
}

/// Console logging for the one-shot commands
pub(crate) fn init_console_logging(config: &AppConfig) {
    logging::init_logging(&config.logging);
}
