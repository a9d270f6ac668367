//! Crate-level error type.
//!
//! Tracking itself cannot fail; errors only arise at the edges, when loading
//! layouts, scripts, configuration and reports from disk.

use crate::config::ConfigError;
use crate::insights::InsightsError;
use crate::page::source::SourceError;
use thiserror::Error;

/// Errors surfaced by the file-facing helpers of this crate.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("event source error: {0}")]
    Source(#[from] SourceError),

    #[error("insights error: {0}")]
    Insights(#[from] InsightsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid page layout: {0}")]
    Layout(#[from] serde_json::Error),
}

/// Result type for file-facing helpers.
pub type Result<T> = std::result::Result<T, TrackerError>;
