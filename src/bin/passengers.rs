//! Passenger transport analysis entry point.

use anyhow::Result;
use demotrend::analysis::passengers;
use std::path::Path;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let report = passengers::run(
        Path::new(passengers::DATA_DIR),
        Path::new(passengers::CHART_FILE),
    )?;

    match serde_json::to_string_pretty(&report) {
        Ok(json) => debug!("run report:\n{}", json),
        Err(e) => warn!("failed to serialize run report: {}", e),
    }
    Ok(())
}
