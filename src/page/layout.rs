//! Structural description of the landing page.
//!
//! The page template owns the DOM; the tracker only needs to know which
//! interactive elements exist and the little text it reports about them.
//! Missing collections deserialize as empty and an absent call-to-action is a
//! valid layout.

use crate::error::TrackerError;
use crate::page::types::ElementRef;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The primary call-to-action button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToAction {
    /// Label reported with CTA events
    #[serde(default = "default_cta_label")]
    pub label: String,
}

fn default_cta_label() -> String {
    "get_started_button".to_string()
}

impl Default for CallToAction {
    fn default() -> Self {
        Self {
            label: default_cta_label(),
        }
    }
}

/// A feature card, optionally containing a heading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCard {
    #[serde(default)]
    pub heading: Option<String>,
}

/// An anchor element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub href: String,
}

/// A form element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(default)]
    pub id: Option<String>,
}

/// Everything the tracker queries from the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub cta: Option<CallToAction>,
    #[serde(default)]
    pub features: Vec<FeatureCard>,
    #[serde(default)]
    pub nav_links: Vec<Link>,
    #[serde(default)]
    pub forms: Vec<Form>,
    /// Anchors outside the navigation region
    #[serde(default)]
    pub anchors: Vec<Link>,
}

impl PageLayout {
    /// Parse a layout from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a layout from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TrackerError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Display title of a feature card (1-based `Feature N` fallback).
    pub fn feature_title(&self, index: usize) -> String {
        self.features
            .get(index)
            .and_then(|card| card.heading.as_deref())
            .map(str::trim)
            .filter(|heading| !heading.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Feature {}", index + 1))
    }

    /// The href of an anchor-like element, if the element is a link.
    pub fn href_of(&self, element: ElementRef) -> Option<&str> {
        match element {
            ElementRef::NavLink(i) => self.nav_links.get(i).map(|l| l.href.as_str()),
            ElementRef::Anchor(i) => self.anchors.get(i).map(|l| l.href.as_str()),
            _ => None,
        }
    }

    /// All links whose destination is an absolute http(s) URL.
    pub fn external_links(&self) -> Vec<ElementRef> {
        let nav = (0..self.nav_links.len()).map(ElementRef::NavLink);
        let other = (0..self.anchors.len()).map(ElementRef::Anchor);
        nav.chain(other)
            .filter(|element| self.href_of(*element).is_some_and(is_absolute_url))
            .collect()
    }

    /// Check whether an element exists in this layout.
    pub fn contains(&self, element: ElementRef) -> bool {
        match element {
            ElementRef::Cta => self.cta.is_some(),
            ElementRef::Feature(i) => i < self.features.len(),
            ElementRef::NavLink(i) => i < self.nav_links.len(),
            ElementRef::Form(i) => i < self.forms.len(),
            ElementRef::Anchor(i) => i < self.anchors.len(),
        }
    }
}

/// Whether an href starts with an absolute `http:` or `https:` scheme.
pub fn is_absolute_url(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PageLayout {
        PageLayout {
            title: "Landing".to_string(),
            url: "https://example.com/".to_string(),
            cta: Some(CallToAction::default()),
            features: vec![
                FeatureCard {
                    heading: Some("Fast".to_string()),
                },
                FeatureCard { heading: None },
            ],
            nav_links: vec![
                Link {
                    text: " Colors ".to_string(),
                    href: "/colors".to_string(),
                },
                Link {
                    text: "Docs".to_string(),
                    href: "https://docs.example.com".to_string(),
                },
            ],
            forms: vec![],
            anchors: vec![Link {
                text: "GitHub".to_string(),
                href: "HTTP://github.com".to_string(),
            }],
        }
    }

    #[test]
    fn test_feature_title_fallback() {
        let layout = sample();
        assert_eq!(layout.feature_title(0), "Fast");
        assert_eq!(layout.feature_title(1), "Feature 2");
        assert_eq!(layout.feature_title(7), "Feature 8");
    }

    #[test]
    fn test_external_links() {
        let layout = sample();
        assert_eq!(
            layout.external_links(),
            vec![ElementRef::NavLink(1), ElementRef::Anchor(0)]
        );
    }

    #[test]
    fn test_absolute_url_detection() {
        assert!(is_absolute_url("https://a.b"));
        assert!(is_absolute_url("http://a.b"));
        assert!(!is_absolute_url("/relative"));
        assert!(!is_absolute_url("mailto:me@example.com"));
        assert!(!is_absolute_url("#top"));
    }

    #[test]
    fn test_sparse_layout_json() {
        let layout = PageLayout::from_json(r#"{"title":"Only a title"}"#).unwrap();
        assert!(layout.cta.is_none());
        assert!(layout.features.is_empty());
        assert!(!layout.contains(ElementRef::Cta));

        let layout = PageLayout::from_json(r#"{"cta":{}}"#).unwrap();
        assert_eq!(layout.cta.unwrap().label, "get_started_button");
    }
}
