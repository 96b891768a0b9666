//! # Noticias CRUD
//!
//! A small HTTP service over a JSON file of news items, plus the collector
//! that fills that file by scraping news listing pages.
//!
//! ## Usage
//!
//! ```sh
//! noticias_crud serve                  # API on http://127.0.0.1:3000
//! noticias_crud -c scraper.yaml scrape # refresh noticias.json and exit
//! ```
//!
//! ## Architecture
//!
//! 1. **Store**: the whole collection is one JSON array in one file, read and
//!    rewritten in full on every operation
//! 2. **Routes**: list, get, create, replace and delete records by position
//! 3. **Collector**: fetches listing pages, extracts teasers, replaces the file

use clap::Parser;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod http;
mod models;
mod scrapers;
mod store;
mod utils;

use cli::{Cli, Command};
use scrapers::{Collector, ScraperConfig};
use store::JsonFileStore;
use utils::ensure_writable_parent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "noticias_crud starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Err(e) = ensure_writable_parent(&args.data_file).await {
        error!(
            path = %args.data_file.display(),
            error = %e,
            "Data file directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let store = Arc::new(JsonFileStore::new(&args.data_file));
    let scraper_config = ScraperConfig::load_or_default(args.scraper_config.as_deref()).await?;
    let collector = Collector::from_config(&scraper_config)?;

    match args.command {
        Command::Serve(serve) => {
            let addr = SocketAddr::new(serve.host, serve.port);
            http::serve(addr, http::app(store, collector)).await?;
        }
        Command::Scrape => match collector.refresh(store.as_ref()).await {
            Ok(records) => {
                info!(count = records.len(), path = %store.path().display(), "Data file refreshed");
            }
            Err(e) => {
                error!(error = %e, "Scrape failed; data file left unchanged");
                return Err(e.into());
            }
        },
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}
