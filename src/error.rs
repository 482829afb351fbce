//! Error taxonomy for the reporting pipeline.
//!
//! Only conditions the caller has to act on live here. Absent datasets,
//! empty filter results and unresolvable operator columns are reported
//! through [`crate::models::ViewOutcome`] instead.

use chrono::NaiveDate;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pipeline, the data source and the cache.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("a {days}-day lookback reaches past the earliest supported date")]
    LookbackOutOfRange { days: u32 },

    #[error("no operator column found (tried {})", .tried.join(", "))]
    SchemaIncomplete { tried: Vec<String> },

    #[error("source '{source_name}' is unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("cache file {}: {reason}", .path.display())]
    Cache { path: PathBuf, reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
