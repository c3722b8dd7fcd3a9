//! plumbstock - inventory item store CLI
//!
//! Reads and writes the stored item collection in a data directory.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use plumbstock_core::{FileStorage, ItemStore, StoreConfig};

use cli::Cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::load_standard()?,
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let data_dir = config.resolved_data_dir();
    tracing::debug!("Using data directory {:?}", data_dir);
    let store = ItemStore::with_config(FileStorage::open(&data_dir)?, config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(&store, cli.command, cli.json, &mut out)
}
