mod config;
mod driver;
mod partition;
mod sequential;
mod worker;
mod writer;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const CONFIG_FILE: &str = "config.toml";

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::new(CONFIG_FILE).context("Error loading config")?;
    init_tracing(&config.log_level);
    tracing::debug!("Loaded {:?}", config);

    // Any failure here is fatal: log it and exit with a non-zero status.
    if let Err(err) = driver::run(&config).await {
        tracing::error!("{:#}", err);
        return Err(err);
    }
    Ok(())
}

// RUST_LOG wins over the configured level when it is set.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
