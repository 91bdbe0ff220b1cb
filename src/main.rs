mod app;
mod browser;
mod fetch;
mod models;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use app::App;
use fetch::{ResultFetcher, DEFAULT_ENDPOINT};

#[derive(Parser)]
#[command(name = "jobgrid")]
#[command(about = "Job search in the terminal - fetch listings and browse them as a card grid")]
struct Cli {
    /// Listing endpoint URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Minimum time the loader stays visible, in milliseconds (0 disables)
    #[arg(long, default_value = "2000")]
    min_loader_ms: u64,

    /// HTTP connect timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; redirect with `jobgrid 2>jobgrid.log` to keep
    // them off the alternate screen.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let fetcher = ResultFetcher::new(cli.endpoint, Duration::from_secs(cli.timeout_secs))?;
    let app = App::new(Duration::from_millis(cli.min_loader_ms));

    ui::run(fetcher, app).await
}
