//! Per-element hover tracking.
//!
//! Each interactive element owns one [`HoverSession`]. Entering starts a hover,
//! leaving finalizes it and retains the duration until the next click. A click
//! reads the engagement so far without changing the hover phase.

use chrono::{DateTime, Duration, Utc};

/// Hover phase of a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverPhase {
    Idle,
    Hovering { since: DateTime<Utc> },
}

/// Engagement measured when an element is clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEngagement {
    /// Duration of the last completed hover
    pub hover_duration: Duration,
    /// Time spent on the current hover plus the retained duration
    pub total_engagement: Duration,
}

/// Hover state for one element.
#[derive(Debug, Clone)]
pub struct HoverSession {
    phase: HoverPhase,
    retained: Duration,
}

impl Default for HoverSession {
    fn default() -> Self {
        Self::new()
    }
}

impl HoverSession {
    pub fn new() -> Self {
        Self {
            phase: HoverPhase::Idle,
            retained: Duration::zero(),
        }
    }

    pub fn phase(&self) -> HoverPhase {
        self.phase
    }

    pub fn is_hovering(&self) -> bool {
        matches!(self.phase, HoverPhase::Hovering { .. })
    }

    /// Duration retained from the last completed hover.
    pub fn retained(&self) -> Duration {
        self.retained
    }

    /// Pointer entered: start a new hover cycle.
    pub fn enter(&mut self, now: DateTime<Utc>) {
        self.phase = HoverPhase::Hovering { since: now };
    }

    /// Pointer left: finalize the hover and retain its duration.
    ///
    /// Returns `None` when no hover was in progress.
    pub fn leave(&mut self, now: DateTime<Utc>) -> Option<Duration> {
        match self.phase {
            HoverPhase::Idle => None,
            HoverPhase::Hovering { since } => {
                let duration = non_negative(now - since);
                self.retained = duration;
                self.phase = HoverPhase::Idle;
                Some(duration)
            }
        }
    }

    /// Element clicked: measure engagement and consume the retained duration.
    pub fn click(&mut self, now: DateTime<Utc>) -> ClickEngagement {
        let current = match self.phase {
            HoverPhase::Idle => Duration::zero(),
            HoverPhase::Hovering { since } => non_negative(now - since),
        };
        let engagement = ClickEngagement {
            hover_duration: self.retained,
            total_engagement: current + self.retained,
        };
        self.retained = Duration::zero();
        engagement
    }
}

// Host clocks are not guaranteed monotonic.
fn non_negative(duration: Duration) -> Duration {
    duration.max(Duration::zero())
}
