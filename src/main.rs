use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sundae::{Shop, StoreConfig};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .init();

    if let Err(e) = run() {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = StoreConfig::default();
    let report = Shop::run(&config).context("store run failed")?;

    info!(
        customers = report.orders.len(),
        cones = report.target(),
        verifications = report.verifications,
        "all customers billed"
    );
    for bill in &report.bills {
        info!(ticket = bill.ticket, customer = bill.customer, "bill");
    }
    Ok(())
}
