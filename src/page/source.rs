//! Page event sources.
//!
//! Events reach the tracker either from a recorded script (JSON lines of
//! [`TimedEvent`]) or live, one [`PageEvent`] per line, stamped on arrival by
//! a reader thread and handed over through a bounded channel.

use crate::core::tracker::{InteractionTracker, UiEffect};
use crate::page::types::{PageEvent, TimedEvent};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Capacity of the live event channel.
const LIVE_CHANNEL_CAPACITY: usize = 1_024;

/// Errors raised while reading page events.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read events: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid event: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: event at {at} is earlier than the previous event")]
    OutOfOrder { line: usize, at: DateTime<Utc> },
}

/// A UI effect together with the time it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEffect {
    pub at: DateTime<Utc>,
    pub effect: UiEffect,
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parse a recorded session script.
///
/// Blank lines and lines starting with `#` are skipped. Timestamps must not go
/// backwards.
pub fn parse_script<R: BufRead>(reader: R) -> Result<Vec<TimedEvent>, SourceError> {
    let mut events: Vec<TimedEvent> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if is_skippable(&line) {
            continue;
        }
        let number = index + 1;
        let event: TimedEvent = serde_json::from_str(&line).map_err(|source| {
            SourceError::Parse {
                line: number,
                source,
            }
        })?;

        if let Some(previous) = events.last() {
            if event.at < previous.at {
                return Err(SourceError::OutOfOrder {
                    line: number,
                    at: event.at,
                });
            }
        }
        events.push(event);
    }

    Ok(events)
}

/// Parse a recorded session script from a file.
pub fn load_script(path: &Path) -> Result<Vec<TimedEvent>, SourceError> {
    let file = File::open(path)?;
    parse_script(BufReader::new(file))
}

/// Feed recorded events through a tracker.
///
/// Each event is dispatched at its own timestamp and deferred work is advanced
/// right after it. Timers fire at their own due time, so effects carry the
/// instant they were produced. With `until`, timers keep running up to that
/// instant.
pub fn replay(
    tracker: &mut InteractionTracker,
    events: &[TimedEvent],
    until: Option<DateTime<Utc>>,
) -> Vec<TimedEffect> {
    let mut effects = Vec::new();

    for event in events {
        run_timers(tracker, event.at, &mut effects);
        stamp(&mut effects, event.at, tracker.dispatch(event.at, &event.event));
        stamp(&mut effects, event.at, tracker.advance(event.at));
    }

    if let Some(until) = until {
        run_timers(tracker, until, &mut effects);
    }

    effects
}

fn run_timers(
    tracker: &mut InteractionTracker,
    until: DateTime<Utc>,
    effects: &mut Vec<TimedEffect>,
) {
    while let Some(due) = tracker.next_deadline().filter(|due| *due <= until) {
        let batch = tracker.advance(due);
        stamp(effects, due, batch);
    }
}

fn stamp(effects: &mut Vec<TimedEffect>, at: DateTime<Utc>, batch: Vec<UiEffect>) {
    effects.extend(batch.into_iter().map(|effect| TimedEffect { at, effect }));
}

/// Drives a tracker from a live feed without letting time run backwards.
///
/// Events are stamped when read, so one can arrive carrying an instant earlier
/// than timers already fired by [`advance`](Self::advance). Such events are
/// dispatched at the last advanced instant instead.
pub struct LiveDriver {
    tracker: InteractionTracker,
    clock: DateTime<Utc>,
}

impl LiveDriver {
    pub fn new(tracker: InteractionTracker) -> Self {
        let clock = tracker.started_at();
        Self { tracker, clock }
    }

    pub fn tracker(&self) -> &InteractionTracker {
        &self.tracker
    }

    /// Latest instant the tracker has been driven to.
    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    /// Dispatch a live event at `max(event.at, clock)`.
    pub fn dispatch(&mut self, event: &TimedEvent) -> Vec<TimedEffect> {
        let at = self.catch_up(event.at);
        let mut effects = Vec::new();
        stamp(&mut effects, at, self.tracker.dispatch(at, &event.event));
        effects
    }

    /// Fire timers due up to `now`, or up to the clock if `now` is behind it.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Vec<TimedEffect> {
        let at = self.catch_up(now);
        let mut effects = Vec::new();
        stamp(&mut effects, at, self.tracker.advance(at));
        effects
    }

    fn catch_up(&mut self, at: DateTime<Utc>) -> DateTime<Utc> {
        self.clock = self.clock.max(at);
        self.clock
    }
}

/// Read live page events from `reader` on a background thread.
///
/// Each line is one [`PageEvent`] and is stamped with the time it was read.
/// Malformed lines are logged and skipped. The thread ends at end of input or
/// when the receiver is dropped.
pub fn spawn_line_source<R>(reader: R) -> (Receiver<TimedEvent>, JoinHandle<()>)
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = bounded(LIVE_CHANNEL_CAPACITY);

    let handle = thread::spawn(move || {
        for (index, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "stopped reading page events");
                    break;
                }
            };
            if is_skippable(&line) {
                continue;
            }
            match serde_json::from_str::<PageEvent>(&line) {
                Ok(event) => {
                    if sender.send(TimedEvent::now(event)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(line = index + 1, error = %e, "skipping malformed page event");
                }
            }
        }
        tracing::debug!("page event source finished");
    });

    (receiver, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::types::ElementRef;
    use std::io::Cursor;

    #[test]
    fn test_parse_script_skips_comments() {
        let script = r#"
# a visitor hovers the CTA
{"at":"2024-01-22T10:00:00Z","event":{"type":"pointer_enter","target":{"kind":"cta"}}}

{"at":"2024-01-22T10:00:01Z","event":{"type":"click","target":{"kind":"cta"}}}
"#;
        let events = parse_script(Cursor::new(script)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1].event,
            PageEvent::Click {
                target: ElementRef::Cta
            }
        );
    }

    #[test]
    fn test_parse_script_reports_line() {
        let script = "{\"at\":\"2024-01-22T10:00:00Z\",\"event\":{\"type\":\"unload\"}}\nnot json\n";
        let err = parse_script(Cursor::new(script)).unwrap_err();
        assert!(matches!(err, SourceError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_script_rejects_time_travel() {
        let script = concat!(
            "{\"at\":\"2024-01-22T10:00:05Z\",\"event\":{\"type\":\"unload\"}}\n",
            "{\"at\":\"2024-01-22T10:00:01Z\",\"event\":{\"type\":\"unload\"}}\n",
        );
        let err = parse_script(Cursor::new(script)).unwrap_err();
        assert!(matches!(err, SourceError::OutOfOrder { line: 2, .. }));
    }

    #[test]
    fn test_live_driver_never_dispatches_in_the_past() {
        use crate::config::TrackerSettings;
        use crate::core::sink::{Emitter, SharedVariant};
        use crate::page::layout::PageLayout;
        use crate::page::types::ActivityKind;
        use chrono::Duration;

        let t0 = DateTime::parse_from_rfc3339("2024-01-22T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let tracker = InteractionTracker::start(
            PageLayout::default(),
            Emitter::disabled(SharedVariant::default()),
            TrackerSettings::default(),
            t0,
        );
        let mut driver = LiveDriver::new(tracker);

        // The inactivity deadline fires before a queued activity is drained.
        driver.advance(t0 + Duration::seconds(31));
        assert!(!driver.tracker().engagement().is_engaged());

        let late = TimedEvent::new(
            t0 + Duration::seconds(29),
            PageEvent::Activity {
                kind: ActivityKind::KeyPress,
            },
        );
        driver.dispatch(&late);
        assert!(driver.tracker().engagement().is_engaged());
        assert_eq!(
            driver.tracker().engagement().session_start(),
            t0 + Duration::seconds(31)
        );

        // A stale wall-clock reading does not rewind either.
        driver.advance(t0 + Duration::seconds(10));
        assert_eq!(driver.clock(), t0 + Duration::seconds(31));
    }

    #[test]
    fn test_line_source_skips_bad_lines() {
        let input = concat!(
            "{\"type\":\"activity\",\"kind\":\"key_press\"}\n",
            "garbage\n",
            "{\"type\":\"unload\"}\n",
        );
        let (receiver, handle) = spawn_line_source(Cursor::new(input));
        handle.join().unwrap();

        let events: Vec<PageEvent> = receiver.try_iter().map(|e| e.event).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], PageEvent::Unload);
    }
}
