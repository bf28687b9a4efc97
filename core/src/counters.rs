//! Per-source counter tables: current values, per-cycle deltas, change flags.
//!
//! Both kernel counter sources share one line grammar: a header of CPU
//! column labels, then one row per interrupt vector (or softirq class)
//! shaped `name: count count ... description tokens`. The counts are the
//! leading run of all-digit tokens; everything from the first non-digit
//! token onward is an opaque description tail.

use std::collections::BTreeMap;

use crate::pattern::{self, LinePattern};
use crate::tracked::TrackedTotals;
use crate::{MonitorError, Result};

/// One interrupt vector (or softirq class) worth of state.
#[derive(Debug, Clone)]
pub struct CounterRow {
    /// Vector number or symbolic name, e.g. `95` or `TIMER`.
    pub name: String,
    /// Most recent raw per-CPU counters.
    pub current: Vec<u64>,
    /// Per-CPU deltas from the latest collection cycle.
    pub delta: Vec<i64>,
    /// Opaque trailing description tokens (controller, type, device).
    pub tail: Vec<String>,
    /// Whether any non-excluded cycle after the warm-up pass saw a
    /// non-zero delta. Monotonic for the process lifetime.
    pub ever_changed: bool,
}

impl CounterRow {
    fn new(name: String, cpus: usize) -> Self {
        Self {
            name,
            current: vec![0; cpus],
            delta: vec![0; cpus],
            tail: Vec::new(),
            ever_changed: false,
        }
    }

    /// Sum of the per-CPU deltas from the latest cycle.
    #[must_use]
    pub fn delta_sum(&self) -> i64 {
        self.delta.iter().sum()
    }

    /// Whether the row name is purely numeric (a hardware vector number).
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        !self.name.is_empty() && self.name.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Mapping from row name to row state for one counter source.
///
/// Rows are created the first time a name is observed and never removed;
/// stale rows are harmless since only ever-changed rows are rendered.
/// Iteration is in lexicographic name order.
#[derive(Debug, Clone, Default)]
pub struct CounterTable {
    rows: BTreeMap<String, CounterRow>,
}

impl CounterTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows observed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows have been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CounterRow> {
        self.rows.get(name)
    }

    /// Rows in lexicographic name order.
    pub fn rows(&self) -> impl Iterator<Item = &CounterRow> {
        self.rows.values()
    }

    /// Apply one source snapshot (body lines, header already consumed).
    ///
    /// For every row line: find or create the row, compute each per-CPU
    /// delta against the previous sample BEFORE overwriting the current
    /// value, refresh the description tail, and flag `ever_changed` when
    /// this is not the first pass, the raw line matches no exclusion
    /// pattern, and some delta is non-zero. Independently of both checks,
    /// the row's summed delta feeds every matching tracked pattern.
    ///
    /// # Errors
    ///
    /// Returns a parse error for rows with no `name:` prefix or fewer than
    /// `online_cpus` counter columns.
    pub fn apply<'a, I>(
        &mut self,
        lines: I,
        online_cpus: usize,
        first_pass: bool,
        exclude: &[LinePattern],
        totals: &mut TrackedTotals,
    ) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            self.apply_line(line, online_cpus, first_pass, exclude, totals)?;
        }
        Ok(())
    }

    fn apply_line(
        &mut self,
        line: &str,
        online_cpus: usize,
        first_pass: bool,
        exclude: &[LinePattern],
        totals: &mut TrackedTotals,
    ) -> Result<()> {
        let parsed = RowLine::parse(line, online_cpus)?;
        let row = self
            .rows
            .entry(parsed.name.clone())
            .or_insert_with(|| CounterRow::new(parsed.name, online_cpus));

        let mut moved = false;
        for (cpu, &value) in parsed.counts.iter().enumerate() {
            // Delta against the previous sample, then overwrite.
            let delta = value.wrapping_sub(row.current[cpu]) as i64;
            row.delta[cpu] = delta;
            row.current[cpu] = value;
            if delta != 0 {
                moved = true;
            }
        }
        row.tail = parsed.tail;

        if moved && !first_pass && !pattern::any_match(exclude, line) {
            row.ever_changed = true;
        }

        totals.record(line, row.delta_sum());
        Ok(())
    }
}

struct RowLine {
    name: String,
    counts: Vec<u64>,
    tail: Vec<String>,
}

impl RowLine {
    /// Parse one `name: count count ... tail` row.
    ///
    /// The softirq table carries columns for possible-but-offline CPUs;
    /// all-digit tokens beyond the online-CPU count are dropped. Once the
    /// first non-digit token appears the rest of the line is tail, digits
    /// included.
    fn parse(line: &str, online_cpus: usize) -> Result<Self> {
        let (name, rest) = line
            .split_once(':')
            .ok_or_else(|| MonitorError::parse(format!("counter line without a name: {line}")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(MonitorError::parse(format!("counter line with an empty name: {line}")));
        }

        let mut counts = Vec::with_capacity(online_cpus);
        let mut tail = Vec::new();
        for token in rest.split_whitespace() {
            if tail.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
                if counts.len() < online_cpus {
                    let value = token.parse::<u64>().map_err(|_| {
                        MonitorError::parse(format!("counter out of range in row {name}: {token}"))
                    })?;
                    counts.push(value);
                }
                continue;
            }
            tail.push(token.to_owned());
        }

        if counts.len() < online_cpus {
            return Err(MonitorError::parse(format!(
                "row {name} has {} of {online_cpus} expected counters",
                counts.len()
            )));
        }

        Ok(Self {
            name: name.to_owned(),
            counts,
            tail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_one(
        table: &mut CounterTable,
        line: &str,
        cpus: usize,
        first_pass: bool,
        exclude: &[LinePattern],
        totals: &mut TrackedTotals,
    ) {
        table
            .apply([line], cpus, first_pass, exclude, totals)
            .unwrap();
    }

    #[test]
    fn test_row_line_parse() {
        let row = RowLine::parse(" 95:  10  20  30  0  IR-PCI-MSI  eth0", 4).unwrap();
        assert_eq!(row.name, "95");
        assert_eq!(row.counts, vec![10, 20, 30, 0]);
        assert_eq!(row.tail, vec!["IR-PCI-MSI", "eth0"]);
    }

    #[test]
    fn test_row_line_symbolic_name_and_worded_tail() {
        let row = RowLine::parse("NMI:  0  0  0  0  Non-maskable interrupts", 4).unwrap();
        assert_eq!(row.name, "NMI");
        assert_eq!(row.counts, vec![0; 4]);
        assert_eq!(row.tail, vec!["Non-maskable", "interrupts"]);
    }

    #[test]
    fn test_digit_tokens_after_tail_stay_in_tail() {
        let row = RowLine::parse(" 95:  1  2  IR-PCI-MSI  queue  3", 2).unwrap();
        assert_eq!(row.counts, vec![1, 2]);
        assert_eq!(row.tail, vec!["IR-PCI-MSI", "queue", "3"]);
    }

    #[test]
    fn test_extra_numeric_columns_are_dropped() {
        // Softirq tables expose columns for possible-but-offline CPUs.
        let row = RowLine::parse("NET_RX:  1  2  3  4  5  6", 4).unwrap();
        assert_eq!(row.counts, vec![1, 2, 3, 4]);
        assert!(row.tail.is_empty());
    }

    #[test]
    fn test_short_row_is_a_parse_error() {
        assert!(RowLine::parse("ERR:  0", 4).is_err());
        assert!(RowLine::parse("no-colon-here", 4).is_err());
        assert!(RowLine::parse(":  1  2  3  4", 4).is_err());
    }

    #[test]
    fn test_first_pass_sets_baseline_without_flagging() {
        let mut table = CounterTable::new();
        let mut totals = TrackedTotals::default();
        apply_one(&mut table, " 95:  10  20  eth0", 2, true, &[], &mut totals);

        let row = table.get("95").unwrap();
        assert_eq!(row.current, vec![10, 20]);
        assert_eq!(row.delta, vec![10, 20]);
        assert!(!row.ever_changed);
    }

    #[test]
    fn test_delta_computed_before_overwrite() {
        let mut table = CounterTable::new();
        let mut totals = TrackedTotals::default();
        apply_one(&mut table, " 95:  10  20  eth0", 2, true, &[], &mut totals);
        apply_one(&mut table, " 95:  15  25  eth0", 2, false, &[], &mut totals);

        let row = table.get("95").unwrap();
        assert_eq!(row.current, vec![15, 25]);
        assert_eq!(row.delta, vec![5, 5]);
        assert_eq!(row.delta_sum(), 10);
        assert!(row.ever_changed);
    }

    #[test]
    fn test_excluded_row_never_flags_but_still_feeds_totals() {
        let exclude: Vec<LinePattern> = vec!["eth".parse().unwrap()];
        let mut table = CounterTable::new();
        let mut totals = TrackedTotals::new(vec!["eth".parse().unwrap()]);

        apply_one(&mut table, " 95:  10  20  eth0", 2, true, &exclude, &mut totals);
        apply_one(&mut table, " 95:  15  25  eth0", 2, false, &exclude, &mut totals);

        let row = table.get("95").unwrap();
        assert_eq!(row.delta, vec![5, 5]);
        assert!(!row.ever_changed);
        // Baseline sum (30) plus the second-pass delta (10).
        assert_eq!(totals.summaries(2, 1)[0].total, 40);
    }

    #[test]
    fn test_ever_changed_is_monotonic() {
        let mut table = CounterTable::new();
        let mut totals = TrackedTotals::default();
        apply_one(&mut table, "TIMER:  1  1", 2, true, &[], &mut totals);
        apply_one(&mut table, "TIMER:  2  1", 2, false, &[], &mut totals);
        assert!(table.get("TIMER").unwrap().ever_changed);

        // A later all-zero-delta cycle must not clear the flag.
        apply_one(&mut table, "TIMER:  2  1", 2, false, &[], &mut totals);
        let row = table.get("TIMER").unwrap();
        assert_eq!(row.delta, vec![0, 0]);
        assert!(row.ever_changed);
    }

    #[test]
    fn test_rows_iterate_in_name_order() {
        let mut table = CounterTable::new();
        let mut totals = TrackedTotals::default();
        for line in ["TIMER:  1", " 95:  1", "NET_RX:  1", " 103:  1"] {
            apply_one(&mut table, line, 1, true, &[], &mut totals);
        }
        let names: Vec<&str> = table.rows().map(|row| row.name.as_str()).collect();
        assert_eq!(names, vec!["103", "95", "NET_RX", "TIMER"]);
    }

    #[test]
    fn test_numeric_name_detection() {
        let mut table = CounterTable::new();
        let mut totals = TrackedTotals::default();
        apply_one(&mut table, " 95:  1", 1, true, &[], &mut totals);
        apply_one(&mut table, "NET_RX:  1", 1, true, &[], &mut totals);
        assert!(table.get("95").unwrap().is_numeric());
        assert!(!table.get("NET_RX").unwrap().is_numeric());
    }
}
