//! Offline analysis of tracked button events.
//!
//! Recorded events are grouped per button type and page variant, scored, and
//! turned into a report with recommendations.

pub mod metrics;
pub mod report;

use thiserror::Error;

// Re-export commonly used types
pub use metrics::{compute_button_metrics, read_tracked_events, ButtonMetrics};
pub use report::{generate_insights, ButtonInsights, InsightsReport, PerformanceSummary};

/// Errors raised while reading events or writing reports.
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: invalid tracked event: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
