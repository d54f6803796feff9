use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use flexi_logger::{FileSpec, Logger, LoggerHandle};

use studybuddy::app;
use studybuddy::config::Config;

#[derive(Parser)]
#[command(name = "studybuddy")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat client for the StudyBuddy tutoring backend", long_about = None)]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(short, long)]
    server: Option<String>,

    /// Path to an alternate config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .with_server(cli.server);

    let _logger = init_logging(&config)?;
    log::info!("studybuddy starting against {}", config.server_url);

    app::run(config).await
}

/// Logs go to a file under `~/.studybuddy/logs`; the TUI owns the terminal,
/// so nothing is written to stderr.
fn init_logging(config: &Config) -> Result<LoggerHandle> {
    let log_dir = Config::state_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let handle = Logger::try_with_env_or_str(&config.log_level)?
        .log_to_file(FileSpec::default().directory(log_dir))
        .start()?;
    Ok(handle)
}
