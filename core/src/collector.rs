//! Snapshot collectors for the kernel interrupt counter sources.
//!
//! Two sources share the table grammar: `/proc/interrupts` (hardware
//! vectors) and `/proc/softirqs` (softirq classes). The hardware header
//! defines the process-wide online-CPU count; the softirq table may carry
//! extra columns for possible-but-offline CPUs, which are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use crate::counters::{CounterRow, CounterTable};
use crate::pattern::LinePattern;
use crate::tracked::TrackedTotals;
use crate::{MonitorError, Result};

/// Default hardware-interrupt counter source.
pub const PROC_INTERRUPTS: &str = "/proc/interrupts";

/// Default soft-interrupt counter source.
pub const PROC_SOFTIRQS: &str = "/proc/softirqs";

/// Owned state for one monitor run.
///
/// Created at startup, mutated once per collection cycle by the collectors,
/// and shared with the presenter by reference. There is exactly one thread
/// of control, so no interior locking is needed.
#[derive(Debug)]
pub struct MonitorState {
    /// Hardware-interrupt table.
    pub hardware: CounterTable,
    /// Soft-interrupt table.
    pub soft: CounterTable,
    /// Running totals for the tracked patterns.
    pub totals: TrackedTotals,
    online_cpus: usize,
    cycles: u64,
    exclude: Vec<LinePattern>,
}

impl MonitorState {
    /// Build the state for one run from the tracked and exclusion pattern
    /// lists.
    #[must_use]
    pub fn new(track: Vec<LinePattern>, exclude: Vec<LinePattern>) -> Self {
        Self {
            hardware: CounterTable::new(),
            soft: CounterTable::new(),
            totals: TrackedTotals::new(track),
            online_cpus: 0,
            cycles: 0,
            exclude,
        }
    }

    /// Online-CPU count pinned by the first hardware collection (0 before
    /// it).
    #[must_use]
    pub fn online_cpus(&self) -> usize {
        self.online_cpus
    }

    /// Completed collection cycles (0 while warming up).
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Whether the next collection is the warm-up (baseline) pass.
    #[must_use]
    pub fn is_warmup(&self) -> bool {
        self.cycles == 0
    }

    /// Mark the current collection cycle as complete.
    pub fn finish_cycle(&mut self) {
        self.cycles += 1;
    }

    /// Changed rows from both tables, merged in lexicographic name order.
    #[must_use]
    pub fn changed_rows(&self) -> Vec<&CounterRow> {
        let mut rows: Vec<&CounterRow> = self
            .hardware
            .rows()
            .chain(self.soft.rows())
            .filter(|row| row.ever_changed)
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    fn apply_hardware(&mut self, text: &str) -> Result<()> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| MonitorError::parse("empty hardware-interrupt source"))?;
        let columns = parse_header(header)?;
        // The count stays pinned for the process lifetime; a later header
        // with a different width is ignored.
        if self.online_cpus == 0 {
            self.online_cpus = columns;
        }
        let first = self.cycles == 0;
        self.hardware
            .apply(lines, self.online_cpus, first, &self.exclude, &mut self.totals)
    }

    fn apply_soft(&mut self, text: &str) -> Result<()> {
        if self.online_cpus == 0 {
            return Err(MonitorError::parse(
                "soft-interrupt collection before the hardware header pinned the CPU count",
            ));
        }
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| MonitorError::parse("empty soft-interrupt source"))?;
        parse_header(header)?;
        let first = self.cycles == 0;
        self.soft
            .apply(lines, self.online_cpus, first, &self.exclude, &mut self.totals)
    }
}

/// Reads the hardware-interrupt source into the hardware table.
///
/// The first collection parses the CPU column header and pins the
/// process-wide online-CPU count. A read failure is fatal: the monitor
/// cannot run without its primary data source.
#[derive(Debug, Clone)]
pub struct HardIrqCollector {
    path: PathBuf,
}

impl Default for HardIrqCollector {
    fn default() -> Self {
        Self {
            path: PathBuf::from(PROC_INTERRUPTS),
        }
    }
}

impl HardIrqCollector {
    /// Collector over an alternate source path.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Source path this collector reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the source and fold the snapshot into the state.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the source is unreadable and a parse error
    /// for malformed content; both are fatal for the run.
    pub fn collect(&self, state: &mut MonitorState) -> Result<()> {
        let text = read_source(&self.path)?;
        self.collect_from_str(&text, state)
    }

    /// Fold an in-memory snapshot into the state.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed content.
    pub fn collect_from_str(&self, text: &str, state: &mut MonitorState) -> Result<()> {
        state.apply_hardware(text)
    }
}

/// Reads the soft-interrupt source into the soft table.
///
/// Requires the online-CPU count pinned by [`HardIrqCollector`]; only the
/// first that-many numeric columns per row are consulted.
#[derive(Debug, Clone)]
pub struct SoftIrqCollector {
    path: PathBuf,
}

impl Default for SoftIrqCollector {
    fn default() -> Self {
        Self {
            path: PathBuf::from(PROC_SOFTIRQS),
        }
    }
}

impl SoftIrqCollector {
    /// Collector over an alternate source path.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Source path this collector reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the source and fold the snapshot into the state.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the source is unreadable and a parse error
    /// for malformed content; both are fatal for the run.
    pub fn collect(&self, state: &mut MonitorState) -> Result<()> {
        let text = read_source(&self.path)?;
        self.collect_from_str(&text, state)
    }

    /// Fold an in-memory snapshot into the state.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed content or when called before
    /// the hardware header pinned the CPU count.
    pub fn collect_from_str(&self, text: &str, state: &mut MonitorState) -> Result<()> {
        state.apply_soft(text)
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| MonitorError::io(path.display().to_string(), e))
}

fn parse_header(line: &str) -> Result<usize> {
    let columns = line
        .split_whitespace()
        .filter(|token| token.starts_with("CPU"))
        .count();
    if columns == 0 {
        return Err(MonitorError::parse(format!(
            "counter source header without CPU columns: {line}"
        )));
    }
    Ok(columns)
}
