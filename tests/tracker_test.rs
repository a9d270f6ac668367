//! Integration tests for the interaction tracker

use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;

use landing_tracker::{
    config::TrackerSettings,
    core::{
        Emitter, InteractionTracker, NavigationTiming, RecordingSink, SharedVariant, Transform,
        UiEffect,
    },
    page::{
        ActivityKind, CallToAction, ElementRef, FeatureCard, Form, Link, PageEvent, PageLayout,
    },
    transparency::create_shared_log,
};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-22T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn secs(s: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(s)
}

fn millis(ms: i64) -> DateTime<Utc> {
    t0() + Duration::milliseconds(ms)
}

fn landing_page() -> PageLayout {
    PageLayout {
        title: "Acme".to_string(),
        url: "https://acme.example/".to_string(),
        cta: Some(CallToAction::default()),
        features: vec![
            FeatureCard {
                heading: Some("  Instant setup ".to_string()),
            },
            FeatureCard {
                heading: Some("   ".to_string()),
            },
            FeatureCard { heading: None },
        ],
        nav_links: vec![
            Link {
                text: " Pricing ".to_string(),
                href: "#pricing".to_string(),
            },
            Link {
                text: "Docs".to_string(),
                href: "HTTPS://docs.acme.example".to_string(),
            },
        ],
        forms: vec![
            Form {
                id: Some("signup".to_string()),
            },
            Form { id: None },
        ],
        anchors: vec![Link {
            text: "Blog".to_string(),
            href: "http://blog.acme.example".to_string(),
        }],
    }
}

fn start_with(sink: &RecordingSink, variant: SharedVariant) -> InteractionTracker {
    let emitter = Emitter::new(Some(Box::new(sink.clone())), variant);
    InteractionTracker::start(landing_page(), emitter, TrackerSettings::default(), t0())
}

fn start(sink: &RecordingSink) -> InteractionTracker {
    start_with(sink, SharedVariant::default())
}

fn scroll_to(offset_y: f64) -> PageEvent {
    PageEvent::Scroll {
        offset_y,
        document_height: 1100.0,
        viewport_height: 100.0,
    }
}

fn activity() -> PageEvent {
    PageEvent::Activity {
        kind: ActivityKind::PointerMove,
    }
}

fn values(sink: &RecordingSink, name: &str) -> Vec<f64> {
    sink.named(name)
        .iter()
        .filter_map(|e| e.number("value"))
        .collect()
}

#[test]
fn test_scroll_thresholds_fire_once() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.dispatch(secs(1), &scroll_to(300.0));
    tracker.dispatch(secs(2), &scroll_to(100.0));
    tracker.dispatch(secs(3), &scroll_to(600.0));
    assert_eq!(values(&sink, "scroll_depth"), vec![25.0, 50.0]);

    // Jumping to the bottom reports every remaining threshold in order.
    tracker.dispatch(secs(4), &scroll_to(1000.0));
    tracker.dispatch(secs(5), &scroll_to(0.0));
    tracker.dispatch(secs(6), &scroll_to(1000.0));
    assert_eq!(values(&sink, "scroll_depth"), vec![25.0, 50.0, 75.0, 100.0]);
    assert_eq!(tracker.scroll_depth().max_depth_reported(), 100);
}

#[test]
fn test_unscrollable_page_reports_nothing() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.dispatch(
        secs(1),
        &PageEvent::Scroll {
            offset_y: 0.0,
            document_height: 800.0,
            viewport_height: 800.0,
        },
    );
    assert!(sink.named("scroll_depth").is_empty());
}

#[test]
fn test_cta_hover_duration() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.dispatch(millis(1_000), &PageEvent::PointerEnter { target: ElementRef::Cta });
    tracker.dispatch(millis(2_500), &PageEvent::PointerLeave { target: ElementRef::Cta });

    let end = &sink.named("button_hover_end")[0];
    assert_eq!(end.number("hover_duration"), Some(1500.0));
    assert_eq!(end.text("event_label"), Some("get_started_button"));
    assert_eq!(end.text("button_type"), Some("cta"));
    assert_eq!(end.text("page_variant"), Some("unknown"));
}

#[test]
fn test_leave_without_enter_is_ignored() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.dispatch(secs(1), &PageEvent::PointerLeave { target: ElementRef::Cta });
    assert!(sink.named("button_hover_end").is_empty());
}

#[test]
fn test_cta_click_sequence() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.dispatch(millis(0), &PageEvent::PointerEnter { target: ElementRef::Cta });
    tracker.dispatch(millis(800), &PageEvent::PointerLeave { target: ElementRef::Cta });
    tracker.dispatch(millis(1_000), &PageEvent::PointerEnter { target: ElementRef::Cta });
    sink.clear();

    let effects = tracker.dispatch(millis(1_300), &PageEvent::Click { target: ElementRef::Cta });
    assert_eq!(
        effects,
        vec![
            UiEffect::PreventDefault {
                target: ElementRef::Cta
            },
            UiEffect::SetTransform {
                target: ElementRef::Cta,
                transform: Transform::Scale(0.95)
            },
            UiEffect::ShowMessage("Welcome! This is where your journey begins.".to_string()),
        ]
    );
    assert_eq!(sink.names(), vec!["cta_click", "button_interaction_success"]);

    let click = &sink.named("cta_click")[0];
    assert_eq!(click.number("hover_duration"), Some(800.0));
    assert_eq!(click.number("total_engagement"), Some(1100.0));
    assert_eq!(click.number("value"), Some(1.0));
    let success = &sink.named("button_interaction_success")[0];
    assert_eq!(success.text("event_category"), Some("conversion"));

    // The settle stage runs 150ms later.
    assert!(tracker.advance(millis(1_449)).is_empty());
    assert_eq!(
        tracker.advance(millis(1_450)),
        vec![UiEffect::SetTransform {
            target: ElementRef::Cta,
            transform: Transform::TranslateY(-2.0)
        }]
    );

    // The retained hover was consumed by the click.
    sink.clear();
    tracker.dispatch(millis(2_000), &PageEvent::Click { target: ElementRef::Cta });
    let click = &sink.named("cta_click")[0];
    assert_eq!(click.number("hover_duration"), Some(0.0));
    assert_eq!(click.number("total_engagement"), Some(1000.0));
}

#[test]
fn test_without_sink_effects_still_apply() {
    let log = create_shared_log();
    let emitter = Emitter::disabled(SharedVariant::default()).with_transparency_log(log.clone());
    let mut tracker =
        InteractionTracker::start(landing_page(), emitter, TrackerSettings::default(), t0());

    let effects = tracker.dispatch(secs(1), &PageEvent::Click { target: ElementRef::Cta });
    assert!(effects.contains(&UiEffect::ShowMessage(
        "Welcome! This is where your journey begins.".to_string()
    )));
    assert!(effects.contains(&UiEffect::PreventDefault {
        target: ElementRef::Cta
    }));

    let stats = log.stats();
    assert_eq!(stats.events_emitted, 0);
    // page_view, cta_click, button_interaction_success
    assert_eq!(stats.events_suppressed, 3);
    assert_eq!(stats.page_events, 1);
}

#[test]
fn test_variant_is_read_at_emission() {
    let sink = RecordingSink::new();
    let variant = SharedVariant::new(Some("original".to_string()));
    let mut tracker = start_with(&sink, variant.clone());

    variant.set("colors");
    tracker.dispatch(secs(1), &PageEvent::Submit { form: 0 });

    assert_eq!(sink.named("page_view")[0].text("page_variant"), Some("original"));
    assert_eq!(sink.named("form_submit")[0].text("page_variant"), Some("colors"));
}

#[test]
fn test_heartbeat_reports_and_resets() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    // Activity keeps the visitor engaged past the first inactivity deadline.
    tracker.dispatch(secs(20), &activity());
    tracker.advance(secs(30));
    assert_eq!(values(&sink, "user_engagement"), vec![30.0]);

    tracker.dispatch(secs(45), &activity());
    tracker.advance(secs(60));
    assert_eq!(values(&sink, "user_engagement"), vec![30.0, 30.0]);

    let engagement = &sink.named("user_engagement")[0];
    assert_eq!(engagement.text("event_category"), Some("engagement"));
}

#[test]
fn test_heartbeat_below_threshold_is_silent() {
    let sink = RecordingSink::new();
    let settings = TrackerSettings {
        engagement_threshold: std::time::Duration::from_secs(40),
        inactivity_timeout: std::time::Duration::from_secs(300),
        ..Default::default()
    };
    let emitter = Emitter::new(Some(Box::new(sink.clone())), SharedVariant::default());
    let mut tracker = InteractionTracker::start(landing_page(), emitter, settings, t0());

    tracker.advance(secs(30));
    assert!(sink.named("user_engagement").is_empty());

    // Nothing was reset, so the next beat reports the full minute.
    tracker.advance(secs(60));
    assert_eq!(values(&sink, "user_engagement"), vec![60.0]);
}

#[test]
fn test_inactivity_after_exactly_timeout() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.dispatch(secs(10), &activity());
    tracker.advance(millis(39_999));
    assert!(tracker.engagement().is_engaged());

    tracker.advance(secs(40));
    assert!(!tracker.engagement().is_engaged());

    // No heartbeat while disengaged.
    tracker.advance(secs(60));
    assert_eq!(values(&sink, "user_engagement"), vec![30.0]);

    // Activity re-engages and restarts the engaged clock.
    tracker.dispatch(secs(65), &PageEvent::Activity { kind: ActivityKind::KeyPress });
    assert!(tracker.engagement().is_engaged());
    assert_eq!(tracker.engagement().session_start(), secs(65));
}

#[test]
fn test_inactivity_armed_at_start() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.advance(secs(30));
    assert!(!tracker.engagement().is_engaged());
    // The heartbeat due at the same instant ran first.
    assert_eq!(values(&sink, "user_engagement"), vec![30.0]);
}

#[test]
fn test_page_performance_after_load() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    let timing = NavigationTiming {
        request_start: 10.0,
        response_end: 130.4,
        dom_content_loaded_event_start: 400.0,
        dom_content_loaded_event_end: 412.6,
        load_event_start: 700.0,
        load_event_end: 725.0,
    };
    tracker.dispatch(secs(1), &PageEvent::Load { timing: Some(timing) });
    assert!(sink.named("page_performance").is_empty());

    tracker.advance(secs(1));
    let perf = &sink.named("page_performance")[0];
    assert_eq!(perf.number("load_time"), Some(25.0));
    assert_eq!(perf.number("dom_content_loaded"), Some(13.0));
    assert_eq!(perf.number("first_paint"), Some(120.0));
    assert_eq!(perf.text("event_category"), Some("performance"));

    // Only the first load counts.
    tracker.dispatch(secs(2), &PageEvent::Load { timing: Some(timing) });
    tracker.advance(secs(2));
    assert_eq!(sink.named("page_performance").len(), 1);
}

#[test]
fn test_load_without_timing_emits_nothing() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.dispatch(secs(1), &PageEvent::Load { timing: None });
    tracker.advance(secs(2));
    assert!(sink.named("page_performance").is_empty());
}

#[test]
fn test_form_submit_labels() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.dispatch(secs(1), &PageEvent::Submit { form: 0 });
    tracker.dispatch(secs(2), &PageEvent::Submit { form: 1 });

    let submits = sink.named("form_submit");
    assert_eq!(submits.len(), 2);
    assert_eq!(submits[0].text("event_label"), Some("signup"));
    assert_eq!(submits[0].number("form_index"), Some(1.0));
    assert_eq!(submits[1].text("event_label"), Some("contact_form"));
    assert_eq!(submits[1].number("form_index"), Some(2.0));
    assert_eq!(submits[1].text("event_category"), Some("conversion"));
}

#[test]
fn test_feature_titles_and_lift() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    let effects = tracker.dispatch(
        secs(1),
        &PageEvent::PointerEnter {
            target: ElementRef::Feature(1),
        },
    );
    assert_eq!(
        effects,
        vec![
            UiEffect::SetTransition {
                target: ElementRef::Feature(1),
                value: "transform 0.3s ease".to_string()
            },
            UiEffect::SetTransform {
                target: ElementRef::Feature(1),
                transform: Transform::TranslateY(-5.0)
            },
        ]
    );
    let effects = tracker.dispatch(
        secs(2),
        &PageEvent::PointerLeave {
            target: ElementRef::Feature(1),
        },
    );
    assert_eq!(
        effects,
        vec![UiEffect::SetTransform {
            target: ElementRef::Feature(1),
            transform: Transform::TranslateY(0.0)
        }]
    );

    tracker.dispatch(secs(3), &PageEvent::Click { target: ElementRef::Feature(0) });
    tracker.dispatch(secs(4), &PageEvent::Click { target: ElementRef::Feature(2) });

    let hover_start = &sink.named("feature_hover_start")[0];
    assert_eq!(hover_start.text("feature_title"), Some("Feature 2"));
    assert_eq!(hover_start.text("event_label"), Some("feature_2"));
    assert_eq!(hover_start.number("feature_index"), Some(2.0));
    assert_eq!(
        sink.named("feature_hover_end")[0].number("hover_duration"),
        Some(1000.0)
    );

    let titles: Vec<String> = sink
        .named("feature_click")
        .iter()
        .filter_map(|e| e.text("feature_title").map(str::to_string))
        .collect();
    assert_eq!(titles, vec!["Instant setup", "Feature 3"]);
}

#[test]
fn test_navigation_and_external_links() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);
    sink.clear();

    tracker.dispatch(secs(1), &PageEvent::PointerEnter { target: ElementRef::NavLink(0) });
    tracker.dispatch(secs(2), &PageEvent::Click { target: ElementRef::NavLink(0) });
    assert_eq!(
        sink.names(),
        vec!["nav_hover_start", "navigation_click", "navigation_success"]
    );
    assert_eq!(sink.named("navigation_click")[0].text("event_label"), Some("Pricing"));
    assert_eq!(sink.named("navigation_click")[0].number("nav_index"), Some(1.0));

    sink.clear();
    tracker.dispatch(secs(3), &PageEvent::Click { target: ElementRef::NavLink(1) });
    tracker.dispatch(secs(4), &PageEvent::Click { target: ElementRef::Anchor(0) });
    assert_eq!(
        sink.names(),
        vec![
            "navigation_click",
            "navigation_success",
            "external_link_click",
            "external_link_click"
        ]
    );
    let labels: Vec<String> = sink
        .named("external_link_click")
        .iter()
        .filter_map(|e| e.text("event_label").map(str::to_string))
        .collect();
    assert_eq!(
        labels,
        vec!["HTTPS://docs.acme.example", "http://blog.acme.example"]
    );
}

#[test]
fn test_time_on_page_rounds() {
    let sink = RecordingSink::new();
    let mut tracker = start(&sink);

    tracker.dispatch(millis(41_499), &PageEvent::Unload);
    assert_eq!(values(&sink, "time_on_page"), vec![41.0]);
    assert!(tracker.is_torn_down());
}
