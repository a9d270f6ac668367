//! Scroll depth tracking.
//!
//! Depth is reported in quarter buckets. Each threshold is reported at most
//! once per page lifetime; scrolling back up never re-fires a threshold.

/// Depth thresholds in percent, ascending.
pub const SCROLL_THRESHOLDS: [u8; 4] = [25, 50, 75, 100];

/// Scroll position as a rounded percentage of the scrollable height.
///
/// Returns `None` when the page is not scrollable.
pub fn scroll_percent(offset_y: f64, document_height: f64, viewport_height: f64) -> Option<i64> {
    let scrollable = document_height - viewport_height;
    if !(scrollable > 0.0) || !offset_y.is_finite() {
        return None;
    }
    Some((offset_y / scrollable * 100.0).round() as i64)
}

/// Page-wide scroll depth state.
#[derive(Debug, Clone, Default)]
pub struct ScrollDepthTracker {
    max_depth_reported: u8,
}

impl ScrollDepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deepest threshold reported so far (0 if none).
    pub fn max_depth_reported(&self) -> u8 {
        self.max_depth_reported
    }

    /// Record a scroll percentage and return newly crossed thresholds.
    pub fn observe(&mut self, percent: i64) -> Vec<u8> {
        let crossed: Vec<u8> = SCROLL_THRESHOLDS
            .iter()
            .copied()
            .filter(|&t| t > self.max_depth_reported && i64::from(t) <= percent)
            .collect();

        if let Some(&deepest) = crossed.last() {
            self.max_depth_reported = deepest;
        }
        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_percent() {
        assert_eq!(scroll_percent(0.0, 2000.0, 1000.0), Some(0));
        assert_eq!(scroll_percent(500.0, 2000.0, 1000.0), Some(50));
        assert_eq!(scroll_percent(1000.0, 2000.0, 1000.0), Some(100));
        assert_eq!(scroll_percent(246.0, 2000.0, 1000.0), Some(25));
        assert_eq!(scroll_percent(100.0, 800.0, 800.0), None);
        assert_eq!(scroll_percent(0.0, 600.0, 800.0), None);
    }

    #[test]
    fn test_thresholds_fire_once() {
        let mut tracker = ScrollDepthTracker::new();

        assert_eq!(tracker.observe(30), vec![25]);
        assert_eq!(tracker.observe(10), Vec::<u8>::new());
        assert_eq!(tracker.observe(60), vec![50]);
        assert_eq!(tracker.observe(60), Vec::<u8>::new());
        assert_eq!(tracker.max_depth_reported(), 50);
    }

    #[test]
    fn test_jump_reports_every_crossed_threshold() {
        let mut tracker = ScrollDepthTracker::new();
        assert_eq!(tracker.observe(100), vec![25, 50, 75, 100]);
        assert_eq!(tracker.observe(140), Vec::<u8>::new());
        assert_eq!(tracker.max_depth_reported(), 100);
    }

    #[test]
    fn test_below_first_threshold() {
        let mut tracker = ScrollDepthTracker::new();
        assert!(tracker.observe(24).is_empty());
        assert!(tracker.observe(-5).is_empty());
        assert_eq!(tracker.max_depth_reported(), 0);
    }
}
