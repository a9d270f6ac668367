//! Core functionality of the landing tracker.
//!
//! This module contains:
//! - Tracked events and the analytics sink they are emitted to
//! - Per-element hover, scroll depth and engagement state
//! - The timer queue for deferred work
//! - The interaction tracker tying it all together

pub mod engagement;
pub mod event;
pub mod hover;
pub mod performance;
pub mod scroll;
pub mod sink;
pub mod timers;
pub mod tracker;

// Re-export commonly used types
pub use engagement::EngagementState;
pub use event::{ParamValue, Params, TrackedEvent};
pub use hover::{ClickEngagement, HoverPhase, HoverSession};
pub use performance::{NavigationTiming, PagePerformance};
pub use scroll::{scroll_percent, ScrollDepthTracker, SCROLL_THRESHOLDS};
pub use sink::{
    AnalyticsSink, Emitter, JsonLinesSink, RecordingSink, SharedVariant, SinkError, EVENT_TYPE,
    UNKNOWN_VARIANT,
};
pub use timers::{TimerHandle, TimerQueue};
pub use tracker::{
    InteractionTracker, Transform, UiEffect, BUTTON_TYPE_CTA, BUTTON_TYPE_FEATURE,
    BUTTON_TYPE_NAVIGATION,
};
