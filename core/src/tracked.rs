//! Running totals for configured name patterns.

use serde::Serialize;

use crate::pattern::LinePattern;

/// Accumulated delta totals per tracked pattern.
///
/// Totals accumulate from process start and are never reset. A raw source
/// line may match several patterns and contributes its summed per-CPU delta
/// to each of them, regardless of the exclusion policy and of which pass
/// produced the delta (the warm-up pass contributes the absolute baseline
/// counts, since every row starts from zero).
#[derive(Debug, Clone, Default)]
pub struct TrackedTotals {
    entries: Vec<TrackedEntry>,
}

#[derive(Debug, Clone)]
struct TrackedEntry {
    pattern: LinePattern,
    total: i64,
}

impl TrackedTotals {
    /// Build the totals for an ordered list of tracked patterns.
    #[must_use]
    pub fn new(patterns: Vec<LinePattern>) -> Self {
        Self {
            entries: patterns
                .into_iter()
                .map(|pattern| TrackedEntry { pattern, total: 0 })
                .collect(),
        }
    }

    /// Number of tracked patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no patterns are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a row's summed per-CPU delta to every pattern matching the raw
    /// source line.
    pub fn record(&mut self, line: &str, delta_sum: i64) {
        for entry in &mut self.entries {
            if entry.pattern.matches(line) {
                entry.total += delta_sum;
            }
        }
    }

    /// Snapshot of the totals with derived per-CPU and per-second figures.
    ///
    /// Degenerate divisors (zero online CPUs, zero interval) yield zeros
    /// rather than a division error.
    #[must_use]
    pub fn summaries(&self, online_cpus: usize, interval_secs: u64) -> Vec<TrackedSummary> {
        self.entries
            .iter()
            .map(|entry| {
                let total = entry.total;
                let per_second = safe_div(total as f64, interval_secs as f64);
                TrackedSummary {
                    label: entry.pattern.to_string(),
                    total,
                    per_cpu: safe_div(total as f64, online_cpus as f64),
                    per_second,
                    per_second_per_cpu: safe_div(per_second, online_cpus as f64),
                }
            })
            .collect()
    }
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// One summary line worth of figures for a tracked pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedSummary {
    /// Textual form of the tracked pattern.
    pub label: String,
    /// Accumulated delta sum since process start.
    pub total: i64,
    /// Total divided by the online-CPU count.
    pub per_cpu: f64,
    /// Total divided by the sampling interval.
    pub per_second: f64,
    /// Total divided by the interval and the online-CPU count.
    pub per_second_per_cpu: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(patterns: &[&str]) -> TrackedTotals {
        TrackedTotals::new(patterns.iter().map(|p| p.parse().unwrap()).collect())
    }

    #[test]
    fn test_record_accumulates_without_reset() {
        let mut totals = totals(&["eth"]);
        totals.record(" 95:  5  5  eth0", 10);
        totals.record(" 95:  1  0  eth0", 1);
        totals.record(" 96:  9  9  nvme0", 18);

        let summary = &totals.summaries(2, 1)[0];
        assert_eq!(summary.label, "eth");
        assert_eq!(summary.total, 11);
    }

    #[test]
    fn test_row_contributes_to_every_matching_pattern() {
        let mut totals = totals(&["eth", "^ 95"]);
        totals.record(" 95:  5  5  eth0", 10);

        let summaries = totals.summaries(2, 1);
        assert_eq!(summaries[0].total, 10);
        assert_eq!(summaries[1].total, 10);
    }

    #[test]
    fn test_summary_figures() {
        let mut totals = totals(&["eth"]);
        totals.record("eth0", 70);

        let summary = &totals.summaries(4, 2)[0];
        assert_eq!(summary.total, 70);
        assert!((summary.per_cpu - 17.5).abs() < f64::EPSILON);
        assert!((summary.per_second - 35.0).abs() < f64::EPSILON);
        assert!((summary.per_second_per_cpu - 8.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_divisors_yield_zeros() {
        let mut totals = totals(&["eth"]);
        totals.record("eth0", 70);

        let summary = &totals.summaries(0, 0)[0];
        assert_eq!(summary.total, 70);
        assert_eq!(summary.per_cpu, 0.0);
        assert_eq!(summary.per_second, 0.0);
        assert_eq!(summary.per_second_per_cpu, 0.0);
    }

    #[test]
    fn test_negative_deltas_are_signed() {
        let mut totals = totals(&["eth"]);
        totals.record("eth0", -3);
        assert_eq!(totals.summaries(1, 1)[0].total, -3);
    }
}
