//! Interest accrual daemon binary

use bank_ledger::Ledger;
use interest_engine::{Config, InterestEngine, Scheduler};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting NexusTrust interest accrual engine");

    // Load configuration: file argument wins, environment otherwise
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let ledger = Arc::new(Ledger::open(config.ledger)?);
    tracing::info!("Ledger opened successfully");

    let scheduler = Scheduler::new(config.schedule, InterestEngine::new(ledger));

    tokio::select! {
        result = scheduler.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down interest accrual engine");
        }
    }

    Ok(())
}
