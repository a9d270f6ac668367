//! Page-wide engagement state.
//!
//! The visitor starts engaged. Qualifying activity keeps them engaged and
//! re-arms an inactivity deadline; when the deadline expires they become
//! disengaged. A periodic heartbeat reports engaged time once it reaches the
//! configured threshold.

use crate::core::timers::TimerHandle;
use chrono::{DateTime, Duration, Utc};

/// Engagement state for one page session.
#[derive(Debug, Clone)]
pub struct EngagementState {
    session_start: DateTime<Utc>,
    is_engaged: bool,
    inactivity_deadline: Option<TimerHandle>,
}

impl EngagementState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            session_start: now,
            is_engaged: true,
            inactivity_deadline: None,
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.is_engaged
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    pub fn inactivity_deadline(&self) -> Option<TimerHandle> {
        self.inactivity_deadline
    }

    /// Store the handle of a new inactivity deadline, returning the previous one.
    pub fn replace_deadline(&mut self, handle: Option<TimerHandle>) -> Option<TimerHandle> {
        std::mem::replace(&mut self.inactivity_deadline, handle)
    }

    /// Register user activity. Returns true if the visitor was re-engaged.
    pub fn record_activity(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_engaged {
            return false;
        }
        self.is_engaged = true;
        self.session_start = now;
        true
    }

    /// The inactivity deadline expired.
    pub fn expire(&mut self) {
        self.is_engaged = false;
        self.inactivity_deadline = None;
    }

    /// Whole seconds engaged since the last reset.
    pub fn engaged_secs(&self, now: DateTime<Utc>) -> i64 {
        round_secs(now - self.session_start)
    }

    /// Heartbeat check. Returns the engaged seconds to report, if any, and
    /// resets the session start when it does.
    pub fn heartbeat(&mut self, now: DateTime<Utc>, threshold: Duration) -> Option<i64> {
        if !self.is_engaged {
            return None;
        }
        let secs = self.engaged_secs(now);
        if secs < threshold.num_seconds() {
            return None;
        }
        self.session_start = now;
        Some(secs)
    }
}

/// Round a duration to whole seconds, half away from zero.
pub fn round_secs(duration: Duration) -> i64 {
    (duration.num_milliseconds() as f64 / 1000.0).round() as i64
}
