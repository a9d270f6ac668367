//! Per-button metrics aggregated from tracked events.

use crate::core::event::TrackedEvent;
use crate::core::sink::UNKNOWN_VARIANT;
use crate::insights::InsightsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;

/// Click events counted towards a button.
const CLICK_EVENTS: [&str; 3] = ["cta_click", "navigation_click", "feature_click"];

/// Events that start a hover.
const HOVER_START_EVENTS: [&str; 3] = ["button_hover_start", "nav_hover_start", "feature_hover_start"];

/// Events that carry a completed hover duration.
const HOVER_END_EVENTS: [&str; 3] = ["button_hover_end", "nav_hover_end", "feature_hover_end"];

/// Weight of the click-through rate in the engagement score.
const CTR_WEIGHT: f64 = 0.4;
/// Weight of the average hover duration (in seconds).
const HOVER_WEIGHT: f64 = 0.3;
/// Weight of the click count (per ten clicks).
const CLICK_WEIGHT: f64 = 0.3;

/// Aggregated performance of one button type on one page variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonMetrics {
    /// `{button_type}_{page_variant}`
    pub button_id: String,
    pub button_type: String,
    pub page_variant: String,
    pub total_clicks: u64,
    pub total_hovers: u64,
    /// Average completed hover in milliseconds
    pub avg_hover_duration: f64,
    /// Average total engagement at click time in milliseconds
    pub avg_engagement: f64,
    pub click_through_rate: f64,
    pub engagement_score: f64,
    pub conversion_rate: f64,
}

#[derive(Default)]
struct ButtonGroup {
    clicks: u64,
    hovers: u64,
    hover_durations: Vec<f64>,
    engagement_times: Vec<f64>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Group button events by button type and page variant and score each group.
///
/// Events that are neither clicks nor hovers are ignored. Results are ordered
/// by `button_id`.
pub fn compute_button_metrics(events: &[TrackedEvent]) -> Vec<ButtonMetrics> {
    let mut groups: BTreeMap<(String, String), ButtonGroup> = BTreeMap::new();

    for event in events {
        let name = event.name.as_str();
        let is_click = CLICK_EVENTS.contains(&name);
        let is_hover_start = HOVER_START_EVENTS.contains(&name);
        let is_hover_end = HOVER_END_EVENTS.contains(&name);
        if !(is_click || is_hover_start || is_hover_end) {
            continue;
        }

        let button_type = event.text("button_type").unwrap_or("unknown").to_string();
        let variant = event
            .text("page_variant")
            .unwrap_or(UNKNOWN_VARIANT)
            .to_string();
        let group = groups.entry((button_type, variant)).or_default();

        if is_click {
            group.clicks += 1;
            group
                .engagement_times
                .push(event.number("total_engagement").unwrap_or(0.0));
        }
        if is_hover_start {
            group.hovers += 1;
        }
        if is_hover_end {
            group
                .hover_durations
                .push(event.number("hover_duration").unwrap_or(0.0));
        }
    }

    groups
        .into_iter()
        .map(|((button_type, page_variant), group)| {
            let avg_hover_duration = mean(&group.hover_durations);
            let click_through_rate = if group.hovers > 0 {
                group.clicks as f64 / group.hovers as f64
            } else {
                0.0
            };
            let engagement_score = click_through_rate * CTR_WEIGHT
                + (avg_hover_duration / 1000.0) * HOVER_WEIGHT
                + (group.clicks as f64 / 10.0) * CLICK_WEIGHT;

            ButtonMetrics {
                button_id: format!("{button_type}_{page_variant}"),
                button_type,
                page_variant,
                total_clicks: group.clicks,
                total_hovers: group.hovers,
                avg_hover_duration,
                avg_engagement: mean(&group.engagement_times),
                click_through_rate,
                engagement_score,
                conversion_rate: click_through_rate,
            }
        })
        .collect()
}

/// Read tracked events written as JSON lines.
///
/// Accepts the output of [`JsonLinesSink`](crate::core::sink::JsonLinesSink):
/// extra fields such as `event_type` are ignored.
pub fn read_tracked_events<R: BufRead>(reader: R) -> Result<Vec<TrackedEvent>, InsightsError> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| InsightsError::Parse {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}
