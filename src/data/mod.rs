//! Data module - dataset acquisition, aggregation and summary caching

mod acquire;
mod aggregate;
mod cache;
pub mod schema;

pub use acquire::{ensure_raw_dataset, AcquireError};
pub use aggregate::{aggregate, AggregateError, DeathSummaries};
pub use cache::ensure_summaries;

use std::path::{Path, PathBuf};

/// Filesystem layout of the pipeline: the working directory holds the
/// downloaded archive and the extracted raw CSV; a `csv/` subdirectory holds
/// the five derived summary tables.
#[derive(Debug, Clone)]
pub struct DataPaths {
    work_dir: PathBuf,
}

impl DataPaths {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// Downloaded ZIP archive.
    pub fn archive(&self) -> PathBuf {
        self.work_dir.join("Covid19Casos.zip")
    }

    /// Extracted raw case-level CSV.
    pub fn raw_csv(&self) -> PathBuf {
        self.work_dir.join("Covid19Casos.csv")
    }

    /// Directory holding the five cached summary tables.
    pub fn summary_dir(&self) -> PathBuf {
        self.work_dir.join("csv")
    }

    /// Cached summary table for one dimension.
    pub fn summary_file(&self, dim: schema::Dimension) -> PathBuf {
        self.summary_dir().join(dim.file_name())
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}
