//! Landing Tracker - interaction analytics for landing pages.
//!
//! This library turns page interactions (hovers, clicks, scrolling, form
//! submissions, page load and unload) into named analytics events with a flat
//! parameter bag, and tells the host which cosmetic effects to apply.
//!
//! # Guarantees
//!
//! - **Sink optional**: Without an analytics sink every emission is skipped
//!   silently. Nothing is queued or retried, and UI effects still happen.
//! - **Scroll depth once**: Each of the 25/50/75/100% thresholds is reported
//!   at most once per page.
//! - **No blocking**: Handlers are synchronous; deferred work is kept in a
//!   timer queue that the host advances.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Landing Tracker                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────┐       │
//! │  │ Page events │──▶│ Interaction  │──▶│   Emitter   │──▶ sink│
//! │  │ (host/replay│   │   Tracker    │   │ (+ variant) │       │
//! │  └─────────────┘   └──────────────┘   └─────────────┘       │
//! │                       │        │              │              │
//! │                       ▼        ▼              ▼              │
//! │                 UI effects   Timers    ┌─────────────┐       │
//! │                                        │Transparency │       │
//! │                                        │    Log      │       │
//! │                                        └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use landing_tracker::{
//!     config::TrackerSettings,
//!     core::{Emitter, InteractionTracker, RecordingSink, SharedVariant},
//!     page::{CallToAction, ElementRef, PageEvent, PageLayout},
//! };
//!
//! let layout = PageLayout {
//!     cta: Some(CallToAction::default()),
//!     ..Default::default()
//! };
//! let sink = RecordingSink::new();
//! let emitter = Emitter::new(Some(Box::new(sink.clone())), SharedVariant::default());
//! let now = Utc::now();
//!
//! let mut tracker = InteractionTracker::start(layout, emitter, TrackerSettings::default(), now);
//! tracker.dispatch(now, &PageEvent::Click { target: ElementRef::Cta });
//!
//! assert_eq!(sink.names(), vec!["page_view", "cta_click", "button_interaction_success"]);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod insights;
pub mod page;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use config::{Config, TrackerSettings};
pub use core::{
    AnalyticsSink, Emitter, InteractionTracker, RecordingSink, SharedVariant, TrackedEvent,
    UiEffect,
};
pub use error::TrackerError;
pub use insights::{compute_button_metrics, generate_insights, InsightsReport};
pub use page::{ElementRef, PageEvent, PageLayout, TimedEvent};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Every event the tracker can emit, with what triggers it.
pub const EVENT_CATALOG: &[(&str, &str)] = &[
    ("page_view", "tracker started"),
    ("time_on_page", "page unloaded (seconds since start)"),
    ("button_hover_start", "pointer entered the call-to-action"),
    ("button_hover_end", "pointer left the call-to-action"),
    ("cta_click", "call-to-action clicked"),
    ("button_interaction_success", "call-to-action click handled"),
    ("feature_hover_start", "pointer entered a feature card"),
    ("feature_hover_end", "pointer left a feature card"),
    ("feature_click", "feature card clicked"),
    ("feature_interaction_success", "feature card click handled"),
    ("nav_hover_start", "pointer entered a navigation link"),
    ("nav_hover_end", "pointer left a navigation link"),
    ("navigation_click", "navigation link clicked"),
    ("navigation_success", "navigation link click handled"),
    ("form_submit", "a form was submitted"),
    ("external_link_click", "link to an absolute http(s) URL clicked"),
    ("page_performance", "load completed with navigation timing"),
    ("scroll_depth", "a 25/50/75/100% scroll threshold was reached"),
    ("user_engagement", "heartbeat while engaged for the threshold"),
];
