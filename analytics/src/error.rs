//! Analytics error types

use shared::SharedError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Analytics error types
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Failed to load exclusion words from {path}: {message}")]
    ExclusionLoad { path: PathBuf, message: String },

    #[error("No exclusion word file configured")]
    NoExclusionSource,

    #[error("Storage error: {0}")]
    Storage(#[from] SharedError),
}
