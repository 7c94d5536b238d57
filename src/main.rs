use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use dualpane::{BrowserConfig, Commander, LocalSource, RemoteSource};

mod console;

#[derive(Parser, Debug)]
#[command(name = "dualpane")]
#[command(about = "Browse a local and a remote directory side by side through a PHP endpoint")]
#[command(version)]
struct Cli {
    /// Endpoint URL (e.g., http://example.com/path/to/shell.php)
    endpoint: String,

    /// Path to a JSON config file
    #[arg(long, env = "DUALPANE_CONFIG")]
    config: Option<PathBuf>,

    /// Starting directory for the local pane
    #[arg(long)]
    local_dir: Option<PathBuf>,

    /// Request timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "DUALPANE_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => BrowserConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => BrowserConfig::from_endpoint(cli.endpoint.clone()),
    };
    config.endpoint = cli.endpoint;
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(dir) = cli.local_dir {
        config.local_dir = Some(dir);
    }

    let local = match &config.local_dir {
        Some(dir) => LocalSource::new(dir.clone()),
        None => LocalSource::from_current_dir().context("failed to read working directory")?,
    };

    let remote = RemoteSource::connect(config)
        .await
        .context("failed to reach remote endpoint")?;

    info!(
        "dualpane v{} browsing {} and {}",
        env!("CARGO_PKG_VERSION"),
        dualpane::DirectorySource::identifier(&local),
        dualpane::DirectorySource::identifier(&remote),
    );

    let commander = Commander::new(Box::new(local), Box::new(remote))
        .await
        .context("failed to load directory listings")?;

    console::run(commander).await
}
