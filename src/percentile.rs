//! Sliding-window percentile estimation over named metrics.
//!
//! Bounded-memory and approximate: each key keeps the most recent
//! `window_len` samples in a ring and answers interpolated percentile
//! queries once the ring has filled. Intended for admission statistics such
//! as live-connection depth, sampled from a single loop; there is no
//! internal locking, so sharing one tracker across threads requires
//! external synchronization (or one tracker per thread, merged elsewhere).

use std::collections::HashMap;

/// Default ring capacity per key.
const DEFAULT_WINDOW_LEN: usize = 1024;

/// Ring of the most recent samples for one key.
#[derive(Debug)]
struct SampleWindow {
    values: Vec<i64>,
    /// Next overwrite position once the ring is full.
    next: usize,
}

/// Per-key sliding-window percentile tracker.
#[derive(Debug)]
pub struct PercentileTracker {
    window_len: usize,
    windows: HashMap<String, SampleWindow>,
}

impl Default for PercentileTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_LEN)
    }
}

impl PercentileTracker {
    /// Create a tracker keeping `window_len` samples per key.
    pub fn new(window_len: usize) -> Self {
        assert!(window_len > 0, "window length must be at least 1");
        Self {
            window_len,
            windows: HashMap::new(),
        }
    }

    /// Record one sample for `key`.
    ///
    /// While the ring is filling the sample is appended; once full it
    /// overwrites the oldest entry and the ring index advances, so the
    /// window always holds the most recent `window_len` observations.
    pub fn record(&mut self, key: &str, value: i64) {
        let window_len = self.window_len;
        let win = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| SampleWindow {
                values: Vec::with_capacity(window_len),
                next: 0,
            });
        if win.values.len() < window_len {
            win.values.push(value);
            return;
        }
        win.values[win.next] = value;
        win.next = (win.next + 1) % window_len;
    }

    /// Interpolated percentile for `key` at `fraction` in `[0, 1]`.
    ///
    /// Returns `None` until the key's ring has filled to capacity at least
    /// once; a partially filled window would make early estimates
    /// misleading. `fraction` is clamped into `[0, 1]`, and `1.0` returns
    /// the maximum sample directly.
    pub fn percentile(&self, key: &str, fraction: f64) -> Option<f64> {
        let win = self.windows.get(key)?;
        if win.values.len() < self.window_len {
            return None;
        }
        let fraction = fraction.clamp(0.0, 1.0);

        let mut sorted = win.values.clone();
        sorted.sort_unstable();

        let n = sorted.len();
        let x = (n - 1) as f64 * fraction;
        let i = x as usize;
        let frac = x - i as f64;
        if i + 1 >= n {
            return Some(sorted[n - 1] as f64);
        }
        // Weighted combination of the two bracketing order statistics,
        // not a snap to sorted[i]
        Some((1.0 - frac) * sorted[i] as f64 + frac * sorted[i + 1] as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_unavailable() {
        let tracker = PercentileTracker::new(4);
        assert_eq!(tracker.percentile("depth", 0.5), None);
    }

    #[test]
    fn test_unavailable_until_window_full() {
        let mut tracker = PercentileTracker::new(4);
        for v in [7, 1, 5] {
            tracker.record("depth", v);
        }
        assert_eq!(tracker.percentile("depth", 0.5), None);

        tracker.record("depth", 3);
        // Sorted window [1, 3, 5, 7], rank 1.5
        assert_eq!(tracker.percentile("depth", 0.5), Some(4.0));
    }

    #[test]
    fn test_ring_overwrites_oldest() {
        let mut tracker = PercentileTracker::new(3);
        for v in [1, 2, 3, 4] {
            tracker.record("depth", v);
        }
        // Live window is {4, 2, 3}: slot 0 was overwritten
        assert_eq!(tracker.percentile("depth", 0.0), Some(2.0));
        assert_eq!(tracker.percentile("depth", 0.5), Some(3.0));
        assert_eq!(tracker.percentile("depth", 1.0), Some(4.0));
    }

    #[test]
    fn test_interpolation_at_exact_rank() {
        let mut tracker = PercentileTracker::new(4);
        for v in [40, 10, 30, 20] {
            tracker.record("depth", v);
        }
        // x = 3 * (1/3) = 1.0 exactly, no fractional part
        assert_eq!(tracker.percentile("depth", 1.0 / 3.0), Some(20.0));
    }

    #[test]
    fn test_interpolation_between_ranks() {
        let mut tracker = PercentileTracker::new(4);
        for v in [10, 20, 30, 40] {
            tracker.record("depth", v);
        }
        // x = 3 * 0.75 = 2.25: 0.75 * 30 + 0.25 * 40
        assert_eq!(tracker.percentile("depth", 0.75), Some(32.5));
    }

    #[test]
    fn test_full_fraction_returns_maximum() {
        let mut tracker = PercentileTracker::new(4);
        for v in [2, 9, 4, 6] {
            tracker.record("depth", v);
        }
        assert_eq!(tracker.percentile("depth", 1.0), Some(9.0));
        // Out-of-range fractions clamp instead of indexing past the window
        assert_eq!(tracker.percentile("depth", 2.5), Some(9.0));
        assert_eq!(tracker.percentile("depth", -0.5), Some(2.0));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = PercentileTracker::new(2);
        tracker.record("a", 1);
        tracker.record("a", 2);
        tracker.record("b", 100);

        assert_eq!(tracker.percentile("a", 1.0), Some(2.0));
        assert_eq!(tracker.percentile("b", 0.5), None);
    }
}
