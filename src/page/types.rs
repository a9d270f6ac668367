//! Typed page events delivered by the host to the tracker.
//!
//! These types describe WHAT happened on the page and to which element. They
//! carry no DOM handles: elements are addressed by their position in the
//! [`PageLayout`](crate::page::PageLayout) collections.

use crate::core::performance::NavigationTiming;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to an interactive element of the page layout.
///
/// Indices are 0-based positions in the matching layout collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ElementRef {
    /// The primary call-to-action button
    Cta,
    /// A feature card
    Feature(usize),
    /// A link inside the navigation region
    NavLink(usize),
    /// A form element
    Form(usize),
    /// Any other anchor on the page
    Anchor(usize),
}

/// User activity kinds that keep the visitor engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
}

/// A page-level or element-level event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// Pointer entered an element
    PointerEnter { target: ElementRef },
    /// Pointer left an element
    PointerLeave { target: ElementRef },
    /// Element was clicked
    Click { target: ElementRef },
    /// A form was submitted
    Submit { form: usize },
    /// The window scrolled
    Scroll {
        offset_y: f64,
        document_height: f64,
        viewport_height: f64,
    },
    /// Generic user activity (pointer, keyboard, touch)
    Activity { kind: ActivityKind },
    /// The load event completed
    Load {
        #[serde(default)]
        timing: Option<NavigationTiming>,
    },
    /// The page is being unloaded
    Unload,
}

impl PageEvent {
    /// The activity kind this event counts as, if any.
    ///
    /// Scrolling is both a tracked event and a sign of activity.
    pub fn activity(&self) -> Option<ActivityKind> {
        match self {
            PageEvent::Activity { kind } => Some(*kind),
            PageEvent::Scroll { .. } => Some(ActivityKind::Scroll),
            _ => None,
        }
    }

    /// Short name used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PageEvent::PointerEnter { .. } => "pointer_enter",
            PageEvent::PointerLeave { .. } => "pointer_leave",
            PageEvent::Click { .. } => "click",
            PageEvent::Submit { .. } => "submit",
            PageEvent::Scroll { .. } => "scroll",
            PageEvent::Activity { .. } => "activity",
            PageEvent::Load { .. } => "load",
            PageEvent::Unload => "unload",
        }
    }
}

/// A page event stamped with the time it occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at: DateTime<Utc>,
    pub event: PageEvent,
}

impl TimedEvent {
    pub fn new(at: DateTime<Utc>, event: PageEvent) -> Self {
        Self { at, event }
    }

    /// Stamp an event with the current time.
    pub fn now(event: PageEvent) -> Self {
        Self::new(Utc::now(), event)
    }
}
