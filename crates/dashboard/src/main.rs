//! Market dashboard
//!
//! Seeds a price store from settings and prints the dashboard report as JSON

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use market_dashboard::{settings, DashboardServiceBuilder};

fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let app_config = settings::load()?;

    // Logs go to stderr; stdout carries the report
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&app_config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting market dashboard v{}", env!("CARGO_PKG_VERSION"));

    let service = DashboardServiceBuilder::new()
        .config(app_config)
        .build()
        .context("Failed to seed price store")?;

    let stats = service.store().stats();
    info!(
        "Price store: {} observations, {} commodities, {} regions",
        stats.observation_count, stats.commodity_count, stats.region_count
    );

    let report = service.report();
    if report.trend.as_ref().map_or(true, |trend| trend.is_empty()) {
        info!("No trend data for the configured commodities");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
