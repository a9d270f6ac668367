//! Page-side inputs of the tracker.
//!
//! This module describes the page structure the tracker queries, the typed
//! events the host delivers, and sources that produce those events from a
//! recorded script or a live feed.

pub mod layout;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use layout::{is_absolute_url, CallToAction, FeatureCard, Form, Link, PageLayout};
pub use source::{
    load_script, parse_script, replay, spawn_line_source, LiveDriver, SourceError, TimedEffect,
};
pub use types::{ActivityKind, ElementRef, PageEvent, TimedEvent};
