//! The interaction tracker.
//!
//! One [`InteractionTracker`] exists per page session. It is started once the
//! page structure is known, then driven by the host:
//!
//! - [`InteractionTracker::dispatch`] for every page event,
//! - [`InteractionTracker::advance`] to fire deferred work that is due.
//!
//! Both return the [`UiEffect`]s the host must apply to the page. Handlers are
//! synchronous and never block; deferred work (the second stage of the CTA
//! animation, the performance report, the engagement heartbeat and the
//! inactivity deadline) lives in a [`TimerQueue`].

use crate::config::TrackerSettings;
use crate::core::engagement::{round_secs, EngagementState};
use crate::core::event::TrackedEvent;
use crate::core::hover::{ClickEngagement, HoverSession};
use crate::core::performance::{NavigationTiming, PagePerformance};
use crate::core::scroll::{scroll_percent, ScrollDepthTracker};
use crate::core::sink::Emitter;
use crate::core::timers::{TimerHandle, TimerQueue};
use crate::page::layout::PageLayout;
use crate::page::types::{ElementRef, PageEvent};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// `button_type` of the call-to-action.
pub const BUTTON_TYPE_CTA: &str = "cta";
/// `button_type` of feature cards.
pub const BUTTON_TYPE_FEATURE: &str = "feature";
/// `button_type` of navigation links.
pub const BUTTON_TYPE_NAVIGATION: &str = "navigation";

/// Fallback label of submitted forms without an id.
const DEFAULT_FORM_LABEL: &str = "contact_form";

/// A CSS transform applied to an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Scale(f64),
    TranslateY(f64),
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Scale(factor) => write!(f, "scale({factor})"),
            Transform::TranslateY(px) if *px == 0.0 => write!(f, "translateY(0)"),
            Transform::TranslateY(px) => write!(f, "translateY({px}px)"),
        }
    }
}

/// A change the host must apply to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEffect {
    /// Suppress the default action of the event on this element
    PreventDefault { target: ElementRef },
    SetTransform {
        target: ElementRef,
        transform: Transform,
    },
    SetTransition { target: ElementRef, value: String },
    /// Surface a confirmation message to the visitor
    ShowMessage(String),
}

/// Deferred tracker work.
#[derive(Debug, Clone)]
enum TrackerTimer {
    Heartbeat,
    InactivityDeadline,
    CtaSettle,
    PerformanceReport(Option<NavigationTiming>),
}

/// Tracks interactions of one page session and emits analytics events.
pub struct InteractionTracker {
    layout: PageLayout,
    emitter: Emitter,
    settings: TrackerSettings,
    hover: HashMap<ElementRef, HoverSession>,
    external_links: HashSet<ElementRef>,
    scroll: ScrollDepthTracker,
    engagement: EngagementState,
    timers: TimerQueue<TrackerTimer>,
    started_at: DateTime<Utc>,
    load_seen: bool,
    torn_down: bool,
}

impl InteractionTracker {
    /// Initialize tracking for a page whose structure is available.
    ///
    /// Emits `page_view`, starts the engagement heartbeat and arms the first
    /// inactivity deadline.
    pub fn start(
        layout: PageLayout,
        emitter: Emitter,
        settings: TrackerSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let mut hover = HashMap::new();
        if layout.cta.is_some() {
            hover.insert(ElementRef::Cta, HoverSession::new());
        }
        for i in 0..layout.features.len() {
            hover.insert(ElementRef::Feature(i), HoverSession::new());
        }
        for i in 0..layout.nav_links.len() {
            hover.insert(ElementRef::NavLink(i), HoverSession::new());
        }
        let external_links = layout.external_links().into_iter().collect();

        let mut timers = TimerQueue::new();
        let interval = settings.heartbeat_interval();
        match now.checked_add_signed(interval) {
            Some(first) => {
                timers.schedule_repeating(first, interval, TrackerTimer::Heartbeat);
            }
            None => {
                tracing::warn!(?interval, "heartbeat interval out of range, heartbeat disabled");
            }
        }

        let mut tracker = Self {
            layout,
            emitter,
            settings,
            hover,
            external_links,
            scroll: ScrollDepthTracker::new(),
            engagement: EngagementState::new(now),
            timers,
            started_at: now,
            load_seen: false,
            torn_down: false,
        };
        tracker.arm_inactivity(now);

        tracing::info!(
            features = tracker.layout.features.len(),
            nav_links = tracker.layout.nav_links.len(),
            forms = tracker.layout.forms.len(),
            sink = tracker.emitter.has_sink(),
            "interaction tracker started"
        );

        let page_view = TrackedEvent::new("page_view")
            .with("page_title", tracker.layout.title.as_str())
            .with("page_location", tracker.layout.url.as_str())
            .with("page_variant", tracker.emitter.variant().current());
        tracker.emitter.emit(page_view);

        tracker
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn engagement(&self) -> &EngagementState {
        &self.engagement
    }

    pub fn scroll_depth(&self) -> &ScrollDepthTracker {
        &self.scroll
    }

    pub fn hover_session(&self, element: ElementRef) -> Option<&HoverSession> {
        self.hover.get(&element)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the page has been unloaded.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// When the next deferred work is due.
    pub fn next_deadline(&mut self) -> Option<DateTime<Utc>> {
        self.timers.next_due()
    }

    /// Handle one page event.
    ///
    /// Deferred work due at or before `now` runs first. Work scheduled by this
    /// event runs on a later [`advance`](Self::advance).
    pub fn dispatch(&mut self, now: DateTime<Utc>, event: &PageEvent) -> Vec<UiEffect> {
        let mut effects = self.advance(now);
        if self.torn_down {
            tracing::debug!(event = event.kind_name(), "page torn down, ignoring event");
            return effects;
        }
        if let Some(log) = self.emitter.transparency_log() {
            log.record_page_event();
        }

        if event.activity().is_some() {
            self.on_activity(now);
        }

        match event {
            PageEvent::PointerEnter { target } => self.on_pointer_enter(*target, now, &mut effects),
            PageEvent::PointerLeave { target } => self.on_pointer_leave(*target, now, &mut effects),
            PageEvent::Click { target } => self.on_click(*target, now, &mut effects),
            PageEvent::Submit { form } => self.on_submit(*form),
            PageEvent::Scroll {
                offset_y,
                document_height,
                viewport_height,
            } => self.on_scroll(*offset_y, *document_height, *viewport_height),
            PageEvent::Activity { .. } => {}
            PageEvent::Load { timing } => self.on_load(*timing, now),
            PageEvent::Unload => self.on_unload(now),
        }

        effects
    }

    /// Fire every timer due at or before `now`.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Vec<UiEffect> {
        let mut effects = Vec::new();
        while let Some((at, handle, timer)) = self.timers.pop_due(now) {
            self.fire(at, handle, timer, &mut effects);
        }
        effects
    }

    fn fire(
        &mut self,
        at: DateTime<Utc>,
        handle: TimerHandle,
        timer: TrackerTimer,
        effects: &mut Vec<UiEffect>,
    ) {
        match timer {
            TrackerTimer::Heartbeat => {
                let threshold = self.settings.engagement_threshold();
                if let Some(secs) = self.engagement.heartbeat(at, threshold) {
                    self.emitter.emit(
                        TrackedEvent::new("user_engagement")
                            .with("event_category", "engagement")
                            .with("value", secs),
                    );
                }
            }
            TrackerTimer::InactivityDeadline => {
                if self.engagement.inactivity_deadline() == Some(handle) {
                    tracing::debug!("visitor inactive");
                    self.engagement.expire();
                }
            }
            TrackerTimer::CtaSettle => effects.push(UiEffect::SetTransform {
                target: ElementRef::Cta,
                transform: Transform::TranslateY(-2.0),
            }),
            TrackerTimer::PerformanceReport(timing) => {
                let Some(timing) = timing else {
                    tracing::debug!("no navigation timing available");
                    return;
                };
                let perf = PagePerformance::from(&timing);
                self.emitter.emit(
                    TrackedEvent::new("page_performance")
                        .with("event_category", "performance")
                        .with("load_time", perf.load_time)
                        .with("dom_content_loaded", perf.dom_content_loaded)
                        .with("first_paint", perf.first_paint),
                );
            }
        }
    }

    fn on_activity(&mut self, now: DateTime<Utc>) {
        if self.engagement.record_activity(now) {
            tracing::debug!("visitor re-engaged");
        }
        self.arm_inactivity(now);
    }

    // Last write wins: any pending deadline is replaced.
    fn arm_inactivity(&mut self, now: DateTime<Utc>) {
        let timeout = self.settings.inactivity_timeout();
        let handle = self.schedule_after(now, timeout, TrackerTimer::InactivityDeadline);
        if let Some(previous) = self.engagement.replace_deadline(handle) {
            self.timers.cancel(previous);
        }
    }

    // Timers that would land outside the representable range are dropped.
    fn schedule_after(
        &mut self,
        now: DateTime<Utc>,
        delay: Duration,
        timer: TrackerTimer,
    ) -> Option<TimerHandle> {
        match now.checked_add_signed(delay) {
            Some(at) => Some(self.timers.schedule_once(at, timer)),
            None => {
                tracing::warn!(?delay, ?timer, "timer out of range, not scheduled");
                None
            }
        }
    }

    fn on_pointer_enter(
        &mut self,
        target: ElementRef,
        now: DateTime<Utc>,
        effects: &mut Vec<UiEffect>,
    ) {
        let Some(session) = self.hover.get_mut(&target) else {
            return;
        };
        session.enter(now);

        match target {
            ElementRef::Cta => {
                let event = self
                    .cta_event("button_hover_start")
                    .with("event_category", "engagement");
                self.emitter.emit(event);
            }
            ElementRef::Feature(i) => {
                effects.push(UiEffect::SetTransition {
                    target,
                    value: "transform 0.3s ease".to_string(),
                });
                effects.push(UiEffect::SetTransform {
                    target,
                    transform: Transform::TranslateY(-5.0),
                });
                let event = self.feature_event("feature_hover_start", i);
                self.emitter.emit(event);
            }
            ElementRef::NavLink(i) => {
                let event = self.nav_event("nav_hover_start", i);
                self.emitter.emit(event);
            }
            ElementRef::Form(_) | ElementRef::Anchor(_) => {}
        }
    }

    fn on_pointer_leave(
        &mut self,
        target: ElementRef,
        now: DateTime<Utc>,
        effects: &mut Vec<UiEffect>,
    ) {
        let Some(session) = self.hover.get_mut(&target) else {
            return;
        };
        let duration = session.leave(now);

        if let ElementRef::Feature(_) = target {
            effects.push(UiEffect::SetTransform {
                target,
                transform: Transform::TranslateY(0.0),
            });
        }

        let Some(duration) = duration else {
            return;
        };
        let event = match target {
            ElementRef::Cta => self
                .cta_event("button_hover_end")
                .with("event_category", "engagement"),
            ElementRef::Feature(i) => self.feature_event("feature_hover_end", i),
            ElementRef::NavLink(i) => self.nav_event("nav_hover_end", i),
            ElementRef::Form(_) | ElementRef::Anchor(_) => return,
        };
        self.emitter
            .emit(event.with("hover_duration", duration.num_milliseconds()));
    }

    fn on_click(&mut self, target: ElementRef, now: DateTime<Utc>, effects: &mut Vec<UiEffect>) {
        let engagement = self.hover.get_mut(&target).map(|s| s.click(now));

        match (target, engagement) {
            (ElementRef::Cta, Some(engagement)) => {
                effects.push(UiEffect::PreventDefault { target });

                let click = self
                    .cta_event("cta_click")
                    .with("event_category", "engagement")
                    .with("value", 1i64);
                self.emitter.emit(with_engagement(click, &engagement));
                let success = self
                    .cta_event("button_interaction_success")
                    .with("event_category", "conversion");
                self.emitter.emit(with_engagement(success, &engagement));

                effects.push(UiEffect::SetTransform {
                    target,
                    transform: Transform::Scale(0.95),
                });
                let delay = self.settings.cta_settle_delay();
                self.schedule_after(now, delay, TrackerTimer::CtaSettle);
                effects.push(UiEffect::ShowMessage(
                    self.settings.confirmation_message.clone(),
                ));
            }
            (ElementRef::Feature(i), Some(engagement)) => {
                let click = self.feature_event("feature_click", i).with("value", 1i64);
                self.emitter.emit(with_engagement(click, &engagement));
                let success = self.feature_event("feature_interaction_success", i);
                self.emitter.emit(with_engagement(success, &engagement));
            }
            (ElementRef::NavLink(i), Some(engagement)) => {
                let click = self.nav_event("navigation_click", i).with("value", 1i64);
                self.emitter.emit(with_engagement(click, &engagement));
                let success = self.nav_event("navigation_success", i);
                self.emitter.emit(with_engagement(success, &engagement));
            }
            _ => {}
        }

        if self.external_links.contains(&target) {
            if let Some(href) = self.layout.href_of(target) {
                let event = TrackedEvent::new("external_link_click")
                    .with("event_category", "outbound")
                    .with("event_label", href)
                    .with("value", 1i64);
                self.emitter.emit(event);
            }
        }
    }

    fn on_submit(&mut self, form: usize) {
        let Some(element) = self.layout.forms.get(form) else {
            return;
        };
        let label = element.id.as_deref().unwrap_or(DEFAULT_FORM_LABEL);
        let event = TrackedEvent::new("form_submit")
            .with("event_category", "conversion")
            .with("event_label", label)
            .with("form_index", form + 1)
            .with("value", 1i64);
        self.emitter.emit(event);
    }

    fn on_scroll(&mut self, offset_y: f64, document_height: f64, viewport_height: f64) {
        let Some(percent) = scroll_percent(offset_y, document_height, viewport_height) else {
            return;
        };
        for threshold in self.scroll.observe(percent) {
            self.emitter.emit(
                TrackedEvent::new("scroll_depth")
                    .with("event_category", "engagement")
                    .with("value", threshold),
            );
        }
    }

    fn on_load(&mut self, timing: Option<NavigationTiming>, now: DateTime<Utc>) {
        if self.load_seen {
            return;
        }
        self.load_seen = true;
        self.timers
            .schedule_once(now, TrackerTimer::PerformanceReport(timing));
    }

    fn on_unload(&mut self, now: DateTime<Utc>) {
        let seconds = round_secs(non_negative(now - self.started_at));
        self.emitter.emit(
            TrackedEvent::new("time_on_page")
                .with("event_category", "engagement")
                .with("value", seconds),
        );

        self.timers.clear();
        self.engagement.replace_deadline(None);
        self.torn_down = true;
        tracing::info!(seconds, "page unloaded, tracking stopped");
    }

    fn cta_event(&self, name: &str) -> TrackedEvent {
        let label = self
            .layout
            .cta
            .as_ref()
            .map(|cta| cta.label.as_str())
            .unwrap_or_default();
        TrackedEvent::new(name)
            .with("event_label", label)
            .with("button_type", BUTTON_TYPE_CTA)
    }

    fn feature_event(&self, name: &str, index: usize) -> TrackedEvent {
        TrackedEvent::new(name)
            .with("event_category", "engagement")
            .with("event_label", format!("feature_{}", index + 1))
            .with("feature_index", index + 1)
            .with("feature_title", self.layout.feature_title(index))
            .with("button_type", BUTTON_TYPE_FEATURE)
    }

    fn nav_event(&self, name: &str, index: usize) -> TrackedEvent {
        let text = self
            .layout
            .nav_links
            .get(index)
            .map(|link| link.text.trim())
            .unwrap_or_default();
        TrackedEvent::new(name)
            .with("event_category", "navigation")
            .with("event_label", text)
            .with("nav_index", index + 1)
            .with("button_type", BUTTON_TYPE_NAVIGATION)
    }
}

fn with_engagement(event: TrackedEvent, engagement: &ClickEngagement) -> TrackedEvent {
    event
        .with(
            "hover_duration",
            engagement.hover_duration.num_milliseconds(),
        )
        .with(
            "total_engagement",
            engagement.total_engagement.num_milliseconds(),
        )
}

fn non_negative(duration: Duration) -> Duration {
    duration.max(Duration::zero())
}
