//! Page load performance derived from the navigation timing record.

use serde::{Deserialize, Serialize};

/// The subset of the navigation timing record the tracker reads.
///
/// All values are milliseconds relative to the navigation start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationTiming {
    pub request_start: f64,
    pub response_end: f64,
    pub dom_content_loaded_event_start: f64,
    pub dom_content_loaded_event_end: f64,
    pub load_event_start: f64,
    pub load_event_end: f64,
}

/// Rounded page performance figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePerformance {
    pub load_time: i64,
    pub dom_content_loaded: i64,
    /// Request start to response end. Reported under this name for
    /// continuity with existing dashboards; it is not a paint metric.
    pub first_paint: i64,
}

impl From<&NavigationTiming> for PagePerformance {
    fn from(timing: &NavigationTiming) -> Self {
        Self {
            load_time: round_ms(timing.load_event_end - timing.load_event_start),
            dom_content_loaded: round_ms(
                timing.dom_content_loaded_event_end - timing.dom_content_loaded_event_start,
            ),
            first_paint: round_ms(timing.response_end - timing.request_start),
        }
    }
}

fn round_ms(ms: f64) -> i64 {
    ms.round() as i64
}
