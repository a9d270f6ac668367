//! Demonstration of the landing tracker driven by a scripted visit.
//!
//! This example shows how to:
//! 1. Describe the page layout
//! 2. Start a tracker with a recording sink and a transparency log
//! 3. Dispatch page events and advance deferred work
//! 4. Analyze the tracked events into button insights
//!
//! Run with: cargo run --example landing_demo

use chrono::{Duration, Utc};

use landing_tracker::{
    config::TrackerSettings,
    core::{Emitter, InteractionTracker, NavigationTiming, RecordingSink, SharedVariant},
    insights::{compute_button_metrics, InsightsReport},
    page::{CallToAction, ElementRef, FeatureCard, Link, PageEvent, PageLayout},
    transparency::create_shared_log,
};

fn main() {
    println!("Landing Tracker - Demo");
    println!("======================");
    println!();

    let layout = PageLayout {
        title: "Acme - Build faster".to_string(),
        url: "https://acme.example/".to_string(),
        cta: Some(CallToAction::default()),
        features: vec![
            FeatureCard {
                heading: Some("Instant setup".to_string()),
            },
            FeatureCard { heading: None },
        ],
        nav_links: vec![
            Link {
                text: "Pricing".to_string(),
                href: "#pricing".to_string(),
            },
            Link {
                text: "Docs".to_string(),
                href: "https://docs.acme.example".to_string(),
            },
        ],
        ..Default::default()
    };

    let sink = RecordingSink::new();
    let log = create_shared_log();
    let variant = SharedVariant::new(Some("original".to_string()));
    let emitter =
        Emitter::new(Some(Box::new(sink.clone())), variant).with_transparency_log(log.clone());

    let t0 = Utc::now();
    let at = |ms: i64| t0 + Duration::milliseconds(ms);
    let mut tracker = InteractionTracker::start(layout, emitter, TrackerSettings::default(), t0);

    let visit = [
        (
            100,
            PageEvent::Load {
                timing: Some(NavigationTiming {
                    request_start: 12.0,
                    response_end: 140.0,
                    dom_content_loaded_event_start: 300.0,
                    dom_content_loaded_event_end: 318.0,
                    load_event_start: 520.0,
                    load_event_end: 545.0,
                }),
            },
        ),
        (
            2_000,
            PageEvent::Scroll {
                offset_y: 1_400.0,
                document_height: 3_000.0,
                viewport_height: 800.0,
            },
        ),
        (
            4_000,
            PageEvent::PointerEnter {
                target: ElementRef::Feature(0),
            },
        ),
        (
            5_200,
            PageEvent::PointerLeave {
                target: ElementRef::Feature(0),
            },
        ),
        (
            6_000,
            PageEvent::PointerEnter {
                target: ElementRef::Cta,
            },
        ),
        (
            7_500,
            PageEvent::Click {
                target: ElementRef::Cta,
            },
        ),
        (
            8_000,
            PageEvent::Click {
                target: ElementRef::NavLink(1),
            },
        ),
    ];

    for (ms, event) in &visit {
        for effect in tracker.dispatch(at(*ms), event) {
            println!("  +{ms:>6}ms  {effect:?}");
        }
        for effect in tracker.advance(at(*ms)) {
            println!("  +{ms:>6}ms  {effect:?}");
        }
    }

    // Let the CTA animation settle and the first heartbeat fire.
    for effect in tracker.advance(at(30_000)) {
        println!("  +{:>6}ms  {effect:?}", 30_000);
    }
    tracker.dispatch(at(41_000), &PageEvent::Unload);

    println!();
    println!("Tracked events:");
    for event in sink.events() {
        println!("  {:<28} {:?}", event.name, event.parameters);
    }

    println!();
    let events = sink.events();
    let report = InsightsReport::new(events.len(), compute_button_metrics(&events));
    println!("{}", report.notification_text());

    println!();
    println!("{}", log.summary());
}
