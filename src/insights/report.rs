//! Insights and recommendations derived from button metrics.

use crate::insights::metrics::ButtonMetrics;
use crate::insights::InsightsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Placeholder used when there is nothing to analyze.
pub const NO_DATA: &str = "No data available";

/// Scores above this are called out as excellent.
const EXCELLENT_SCORE: f64 = 0.7;
/// Scores below this are called out as needing work.
const POOR_SCORE: f64 = 0.3;
/// Average hover (ms) above which buttons seem hard to commit to.
const LONG_HOVER_MS: f64 = 2000.0;
/// Click-through rate below which visibility is questioned.
const LOW_CTR: f64 = 0.5;

/// Aggregate figures across all analyzed buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_buttons_analyzed: usize,
    pub average_engagement_score: f64,
    pub best_engagement_score: f64,
    pub worst_engagement_score: f64,
    pub most_clicked_button: String,
    pub highest_ctr_button: String,
}

/// Findings of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonInsights {
    pub best_performing_button: String,
    pub worst_performing_button: String,
    pub most_engaging_variant: String,
    pub button_recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_summary: Option<PerformanceSummary>,
}

// First element with the greatest key, like a stable max.
fn first_max_by<'a>(
    metrics: &'a [ButtonMetrics],
    key: impl Fn(&ButtonMetrics) -> f64,
) -> Option<&'a ButtonMetrics> {
    metrics.iter().fold(None, |best, m| match best {
        Some(b) if key(m) <= key(b) => Some(b),
        _ => Some(m),
    })
}

fn first_min_by<'a>(
    metrics: &'a [ButtonMetrics],
    key: impl Fn(&ButtonMetrics) -> f64,
) -> Option<&'a ButtonMetrics> {
    first_max_by(metrics, |m| -key(m))
}

fn describe(metric: &ButtonMetrics) -> String {
    format!("{} on {}", metric.button_type, metric.page_variant)
}

/// Generate insights and recommendations from button metrics.
pub fn generate_insights(metrics: &[ButtonMetrics]) -> ButtonInsights {
    let (Some(best), Some(worst)) = (
        first_max_by(metrics, |m| m.engagement_score),
        first_min_by(metrics, |m| m.engagement_score),
    ) else {
        return ButtonInsights {
            best_performing_button: NO_DATA.to_string(),
            worst_performing_button: NO_DATA.to_string(),
            most_engaging_variant: NO_DATA.to_string(),
            button_recommendations: vec!["Insufficient data for analysis".to_string()],
            performance_summary: None,
        };
    };

    let mut variant_scores: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for metric in metrics {
        variant_scores
            .entry(metric.page_variant.as_str())
            .or_default()
            .push(metric.engagement_score);
    }
    let most_engaging_variant = variant_scores
        .iter()
        .map(|(variant, scores)| (*variant, scores.iter().sum::<f64>() / scores.len() as f64))
        .fold(None::<(&str, f64)>, |best, (variant, mean)| match best {
            Some((_, best_mean)) if mean <= best_mean => best,
            _ => Some((variant, mean)),
        })
        .map(|(variant, _)| variant.to_string())
        .unwrap_or_else(|| NO_DATA.to_string());

    let mut recommendations = Vec::new();
    if best.engagement_score > EXCELLENT_SCORE {
        recommendations.push(format!(
            "{} button on {} is performing excellently",
            best.button_type, best.page_variant
        ));
    }
    if worst.engagement_score < POOR_SCORE {
        recommendations.push(format!(
            "{} button on {} needs improvement",
            worst.button_type, worst.page_variant
        ));
    }
    if best.avg_hover_duration > LONG_HOVER_MS {
        recommendations.push(
            "Consider making buttons more prominent: users are hovering for a long time"
                .to_string(),
        );
    }
    if best.click_through_rate < LOW_CTR {
        recommendations
            .push("Focus on improving button visibility and call-to-action clarity".to_string());
    }

    let total_score: f64 = metrics.iter().map(|m| m.engagement_score).sum();
    let most_clicked = first_max_by(metrics, |m| m.total_clicks as f64).unwrap_or(best);
    let highest_ctr = first_max_by(metrics, |m| m.click_through_rate).unwrap_or(best);

    ButtonInsights {
        best_performing_button: describe(best),
        worst_performing_button: describe(worst),
        most_engaging_variant,
        button_recommendations: recommendations,
        performance_summary: Some(PerformanceSummary {
            total_buttons_analyzed: metrics.len(),
            average_engagement_score: total_score / metrics.len() as f64,
            best_engagement_score: best.engagement_score,
            worst_engagement_score: worst.engagement_score,
            most_clicked_button: most_clicked.button_id.clone(),
            highest_ctr_button: highest_ctr.button_id.clone(),
        }),
    }
}

/// A saved analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub events_analyzed: usize,
    pub metrics: Vec<ButtonMetrics>,
    pub insights: ButtonInsights,
}

impl InsightsReport {
    /// Analyze metrics into a new report.
    pub fn new(events_analyzed: usize, metrics: Vec<ButtonMetrics>) -> Self {
        let insights = generate_insights(&metrics);
        Self {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            events_analyzed,
            metrics,
            insights,
        }
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), InsightsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Plain-text rendering for notifications.
    pub fn notification_text(&self) -> String {
        let insights = &self.insights;
        let mut text = format!(
            "Button Analytics Report\n\
             \n\
             Best Performing Button: {}\n\
             Worst Performing Button: {}\n\
             Most Engaging Variant: {}\n\
             \n\
             Recommendations:",
            insights.best_performing_button,
            insights.worst_performing_button,
            insights.most_engaging_variant
        );
        if insights.button_recommendations.is_empty() {
            text.push_str("\n- none");
        }
        for recommendation in &insights.button_recommendations {
            text.push_str("\n- ");
            text.push_str(recommendation);
        }
        text
    }
}
