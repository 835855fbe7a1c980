//! Summary Cache Module
//! One-shot startup orchestration: load the five cached summary tables, or
//! regenerate them from the raw dataset and retry once.

use anyhow::Context;
use polars::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::data::schema::{Dimension, COUNT_COLUMN};
use crate::data::{acquire, aggregate, DataPaths, DeathSummaries};

#[derive(Error, Debug)]
pub enum CacheError {
    /// A summary file is absent, unparsable, or lacks its expected columns.
    /// Regenerating from the raw dataset cures this.
    #[error("Summary cache miss: {reason} ({file})")]
    Miss { file: String, reason: String },
    /// Anything else. Regeneration would not help; surface it.
    #[error("Failed to read summary cache: {0}")]
    Fatal(#[from] std::io::Error),
}

/// Load all five summary tables from the cache directory.
pub fn load_summaries(paths: &DataPaths) -> Result<DeathSummaries, CacheError> {
    info!("attempting to load cached summary tables");
    let summaries = DeathSummaries {
        gender: load_table(paths, Dimension::Gender)?,
        age: load_table(paths, Dimension::Age)?,
        financing: load_table(paths, Dimension::Financing)?,
        province: load_table(paths, Dimension::Province)?,
        week: load_table(paths, Dimension::Week)?,
    };
    info!("summary cache warm");
    Ok(summaries)
}

fn load_table(paths: &DataPaths, dim: Dimension) -> Result<DataFrame, CacheError> {
    let path = paths.summary_file(dim);

    // Probe the file with std first so a genuine I/O failure (permissions,
    // bad disk) is not mistaken for a cache miss.
    match std::fs::metadata(&path) {
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(CacheError::Miss {
                file: path.display().to_string(),
                reason: "file not found".to_string(),
            });
        }
        Err(err) => return Err(CacheError::Fatal(err)),
    }

    let df = LazyCsvReader::new(&path)
        .with_infer_schema_length(Some(10000))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|err| CacheError::Miss {
            file: path.display().to_string(),
            reason: err.to_string(),
        })?;

    for required in [dim.column(), COUNT_COLUMN] {
        if df.column(required).is_err() {
            return Err(CacheError::Miss {
                file: path.display().to_string(),
                reason: format!("column '{required}' missing"),
            });
        }
    }
    Ok(df)
}

/// Return the five summary tables, regenerating them from the raw dataset on
/// a cache miss. The reload after regeneration is attempted exactly once; a
/// second failure is a fatal startup error.
pub fn ensure_summaries(paths: &DataPaths) -> anyhow::Result<DeathSummaries> {
    match load_summaries(paths) {
        Ok(summaries) => Ok(summaries),
        Err(CacheError::Miss { file, reason }) => {
            warn!("cache miss ({reason}, {file}); regenerating summaries");
            let raw_path = acquire::ensure_raw_dataset(paths)?;
            aggregate::aggregate(&raw_path, &paths.summary_dir())?;
            load_summaries(paths).context("summary cache unreadable after regeneration")
        }
        Err(fatal @ CacheError::Fatal(_)) => Err(fatal.into()),
    }
}
