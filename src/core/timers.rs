//! Deterministic timer queue for deferred tracker work.
//!
//! The tracker never sleeps. One-shot and repeating timers are kept here and
//! fired by the host advancing the clock. Timers fire in due order; timers due
//! at the same instant fire in the order they were scheduled.

use chrono::{DateTime, Duration, Utc};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct TimerEntry<T> {
    payload: T,
    every: Option<Duration>,
}

/// A queue of pending timers carrying payloads of type `T`.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<(DateTime<Utc>, u64, TimerHandle)>>,
    entries: HashMap<TimerHandle, TimerEntry<T>>,
    next_seq: u64,
}

impl<T: Clone> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Schedule a timer that fires once at `at`.
    pub fn schedule_once(&mut self, at: DateTime<Utc>, payload: T) -> TimerHandle {
        self.insert(at, payload, None)
    }

    /// Schedule a timer that first fires at `first` and then every `every`.
    pub fn schedule_repeating(
        &mut self,
        first: DateTime<Utc>,
        every: Duration,
        payload: T,
    ) -> TimerHandle {
        self.insert(first, payload, Some(every))
    }

    fn insert(&mut self, at: DateTime<Utc>, payload: T, every: Option<Duration>) -> TimerHandle {
        let seq = self.next_seq();
        let handle = TimerHandle(seq);
        self.entries.insert(handle, TimerEntry { payload, every });
        self.heap.push(Reverse((at, seq, handle)));
        handle
    }

    /// Cancel a timer. Cancelling an already fired or cancelled timer is a no-op.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    /// Cancel every pending timer.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.entries.clear();
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Due time of the next live timer.
    pub fn next_due(&mut self) -> Option<DateTime<Utc>> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse((at, _, _))| *at)
    }

    /// Pop the next timer due at or before `now`.
    ///
    /// Repeating timers are rescheduled relative to their own due time, so a
    /// late `advance` fires every missed period.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, TimerHandle, T)> {
        self.discard_cancelled();
        let Reverse((at, _, handle)) = *self.heap.peek()?;
        if at > now {
            return None;
        }
        self.heap.pop();

        let entry = self.entries.get(&handle)?.clone();
        let next = entry
            .every
            .filter(|every| *every > Duration::zero())
            .and_then(|every| at.checked_add_signed(every));
        match next {
            Some(next) => {
                let seq = self.next_seq();
                self.heap.push(Reverse((next, seq, handle)));
            }
            None => {
                self.entries.remove(&handle);
            }
        }
        Some((at, handle, entry.payload))
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, _, handle))) = self.heap.peek() {
            if self.entries.contains_key(handle) {
                break;
            }
            self.heap.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-22T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(t0() + Duration::seconds(2), "late");
        queue.schedule_once(t0() + Duration::seconds(1), "early");
        queue.schedule_once(t0() + Duration::seconds(1), "early-second");

        let now = t0() + Duration::seconds(5);
        let fired: Vec<&str> = std::iter::from_fn(|| queue.pop_due(now).map(|(_, _, p)| p)).collect();
        assert_eq!(fired, vec!["early", "early-second", "late"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_not_due_yet() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(t0() + Duration::seconds(1), ());
        assert!(queue.pop_due(t0()).is_none());
        assert_eq!(queue.next_due(), Some(t0() + Duration::seconds(1)));
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_once(t0(), "x");
        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert!(queue.pop_due(t0() + Duration::seconds(1)).is_none());
        assert_eq!(queue.next_due(), None);
    }

    #[test]
    fn test_repeating_catches_up() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_repeating(t0() + Duration::seconds(30), Duration::seconds(30), "tick");

        let now = t0() + Duration::seconds(95);
        let mut fired = Vec::new();
        while let Some((at, h, _)) = queue.pop_due(now) {
            assert_eq!(h, handle);
            fired.push(at);
        }
        assert_eq!(
            fired,
            vec![
                t0() + Duration::seconds(30),
                t0() + Duration::seconds(60),
                t0() + Duration::seconds(90),
            ]
        );
        assert!(queue.is_pending(handle));
        assert_eq!(queue.next_due(), Some(t0() + Duration::seconds(120)));
    }

    #[test]
    fn test_repeating_stops_at_end_of_time() {
        let mut queue = TimerQueue::new();
        let last = DateTime::<Utc>::MAX_UTC;
        queue.schedule_repeating(last, Duration::hours(1), "tick");

        assert_eq!(queue.pop_due(last).map(|(at, _, p)| (at, p)), Some((last, "tick")));
        assert!(queue.is_empty());
        assert_eq!(queue.next_due(), None);
    }
}
