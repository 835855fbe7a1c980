//! Covidash - COVID-19 Argentina Mortality Dashboard
//!
//! Downloads the national case-level dataset when needed, aggregates patient
//! deaths along five dimensions, caches the aggregates as CSV and renders a
//! static single-page dashboard.

mod charts;
mod data;

use anyhow::Result;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let paths = data::DataPaths::new(".");
    let summaries = data::ensure_summaries(&paths)?;

    let index = charts::render_dashboard(&summaries, Path::new("dashboard"))?;
    info!("dashboard ready at {}", index.display());
    Ok(())
}
