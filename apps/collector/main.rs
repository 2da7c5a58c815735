use anyhow::{Context, Result};
use collector::{config::Config, pipeline};
use dotenv::dotenv;
use tracing::info;
use utils::{errors::COLLECTOR_CONFIG_NOT_SET, tracing::run_with_tracing};

#[tokio::main]
async fn main() {
    dotenv().ok();
    run_with_tracing(|| async { run().await }).await;
}

async fn run() -> Result<()> {
    let config_path = std::env::var("COLLECTOR_CONFIG").context(COLLECTOR_CONFIG_NOT_SET)?;
    let config = Config::load(&config_path)?;
    info!(
        config = config_path,
        organizations = config.organizations.len(),
        "Starting collection run"
    );

    let summary = pipeline::run(config).await?;

    info!(
        fetched = summary.fetched,
        merged = summary.merged,
        duplicates_dropped = summary.duplicates_dropped,
        activist = summary.activist,
        prices_attempted = summary.prices_attempted,
        prices_collected = summary.prices_collected,
        prices_failed = summary.prices_failed,
        already_done = summary.already_done,
        missing_token = summary.missing_token,
        missing_date = summary.missing_date,
        "Collection run complete"
    );

    Ok(())
}
