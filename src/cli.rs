//! Command-line interface definitions.
//!
//! Every option can also be given through an environment variable.

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Serve the record API on the default port
/// noticias_crud serve
///
/// # Serve a different data file on port 8080
/// noticias_crud -d /var/lib/noticias/noticias.json serve -p 8080
///
/// # Refresh the data file from the configured listing pages and exit
/// noticias_crud -c scraper.yaml scrape
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file holding the records
    #[arg(short, long, env = "NEWS_DATA_FILE", default_value = "noticias.json", global = true)]
    pub data_file: PathBuf,

    /// Optional path to the scraper's YAML config
    #[arg(short = 'c', long, env = "NEWS_SCRAPER_CONFIG", global = true)]
    pub scraper_config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the record API and the on-demand scraping route
    Serve(ServeArgs),
    /// Scrape the configured listing pages once, replacing the data file
    Scrape,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "NEWS_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "NEWS_PORT", default_value_t = 3000)]
    pub port: u16,
}
