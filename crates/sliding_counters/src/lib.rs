//! Counters over a sliding window of timestamped events, for answering
//! questions like "how many `read-end` events landed in the last second"
//! while a long-running harness streams by.

#![deny(unused_must_use)]
#![warn(rust_2018_idioms, unreachable_pub)]

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Per-label event counters that only remember events newer than a moving
/// horizon. [`inc`](Self::inc) records an event, [`forget_before`](Self::forget_before)
/// advances the horizon, and [`stat`](Self::stat) snapshots the live totals.
///
/// Timestamps must be non-decreasing across [`inc`](Self::inc) calls, as the
/// expiry scan stops at the first event inside the window.
#[derive(Clone, Debug, Default)]
pub struct SlidingCounters<C> {
    queue: VecDeque<(u64, C)>,
    stat: HashMap<C, u64>,
}

impl<C> SlidingCounters<C>
where
    C: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        SlidingCounters {
            queue: VecDeque::new(),
            stat: HashMap::new(),
        }
    }

    /// Number of distinct labels with at least one live event.
    pub fn active_labels(&self) -> usize {
        self.stat.len()
    }

    /// Live total for one label.
    pub fn count(&self, label: &C) -> u64 {
        self.stat.get(label).copied().unwrap_or(0)
    }

    /// Drops every event with a timestamp strictly before `ts`.
    pub fn forget_before(&mut self, ts: u64) {
        while self.queue.front().map_or(false, |(at, _)| *at < ts) {
            if let Some((_, label)) = self.queue.pop_front() {
                if let Some(count) = self.stat.get_mut(&label) {
                    *count -= 1;
                    if *count == 0 {
                        self.stat.remove(&label);
                    }
                }
            }
        }
    }

    /// Records one event with the given label at time `ts`.
    pub fn inc(&mut self, ts: u64, label: C) {
        *self.stat.entry(label.clone()).or_insert(0) += 1;
        self.queue.push_back((ts, label));
    }

    /// Live totals for the given labels, in the same order. Labels with no
    /// live events report zero.
    pub fn stat(&self, labels: &[C]) -> Vec<u64> {
        labels.iter().map(|label| self.count(label)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn can_count_per_label() {
        let mut counters = SlidingCounters::new();
        counters.inc(1, "get");
        counters.inc(2, "put");
        counters.inc(3, "get");
        assert_eq!(counters.count(&"get"), 2);
        assert_eq!(counters.count(&"put"), 1);
        assert_eq!(counters.count(&"del"), 0);
    }

    #[test]
    fn forgets_events_behind_the_horizon() {
        let mut counters = SlidingCounters::new();
        counters.inc(10, "get");
        counters.inc(20, "get");
        counters.inc(30, "put");

        counters.forget_before(21);
        assert_eq!(counters.stat(&["get", "put"]), vec![0, 1]);
        assert_eq!(counters.active_labels(), 1);

        // The horizon only moves forward, so re-applying is a no-op.
        counters.forget_before(21);
        assert_eq!(counters.stat(&["get", "put"]), vec![0, 1]);
    }

    #[test]
    fn keeps_events_at_the_horizon() {
        let mut counters = SlidingCounters::new();
        counters.inc(10, "get");
        counters.forget_before(10);
        assert_eq!(counters.count(&"get"), 1);
    }

    #[test]
    fn reports_stats_in_label_order() {
        let mut counters = SlidingCounters::new();
        counters.inc(1, "b");
        counters.inc(1, "a");
        counters.inc(2, "a");
        assert_eq!(counters.stat(&["a", "b", "c"]), vec![2, 1, 0]);
    }

    #[test]
    fn drops_empty_labels() {
        let mut counters = SlidingCounters::new();
        counters.inc(1, "get");
        counters.inc(2, "put");
        counters.forget_before(2);
        assert_eq!(counters.active_labels(), 1);
        counters.forget_before(3);
        assert_eq!(counters.active_labels(), 0);
        assert_eq!(counters.stat(&["get", "put"]), vec![0, 0]);
    }
}
