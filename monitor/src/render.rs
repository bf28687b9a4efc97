//! Terminal and JSON presentation of one monitoring cycle.
//!
//! The text view clears the screen each cycle and shows three blocks: the
//! per-CPU utilization table, the interrupt delta block (only rows that
//! ever changed, both tables merged in name order), and one summary line
//! per tracked pattern. Numeric vector rows get an affinity block looked
//! up fresh on every render.

use serde::Serialize;

use irqwatch_rs_core::{AffinityInfo, AffinityLookup, CounterRow, MonitorState, TrackedSummary};

use crate::cpustat::CpuUtil;

/// ANSI clear-screen-and-home prefix for the live text view.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Renders one cycle as a terminal screen or a JSON record.
#[derive(Debug, Clone)]
pub struct Presenter {
    interval: u64,
    affinity: AffinityLookup,
}

impl Presenter {
    /// Presenter over the default `/proc/irq` affinity base.
    #[must_use]
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            affinity: AffinityLookup::default(),
        }
    }

    /// Presenter over an alternate affinity lookup.
    #[must_use]
    pub fn with_affinity(interval: u64, affinity: AffinityLookup) -> Self {
        Self { interval, affinity }
    }

    /// Render the text screen (without the clear prefix).
    #[must_use]
    pub fn render_text(&self, state: &MonitorState, cpus: &[CpuUtil]) -> String {
        let online = state.online_cpus();
        let mut out = String::new();

        out.push_str(&format!(
            "irqwatch  interval {}s  cpus {}  cycle {}\n\n",
            self.interval,
            online,
            state.cycles()
        ));

        if !cpus.is_empty() {
            out.push_str(
                " CPU    %usr   %nice    %sys %iowait    %irq   %soft  %steal  %guest   %idle\n",
            );
            for cpu in cpus {
                out.push_str(&format!(
                    "{:>4}  {:>6.2}  {:>6.2}  {:>6.2} {:>7.2}  {:>6.2}  {:>6.2}  {:>6.2}  {:>6.2}  {:>6.2}\n",
                    cpu.cpu,
                    cpu.usr,
                    cpu.nice,
                    cpu.sys,
                    cpu.iowait,
                    cpu.irq,
                    cpu.soft,
                    cpu.steal,
                    cpu.guest,
                    cpu.idle
                ));
            }
            out.push('\n');
        }

        let changed = state.changed_rows();
        if changed.is_empty() {
            out.push_str("no interrupt activity yet\n");
        } else {
            out.push_str(&format!("{:<10}", "irq"));
            for cpu in 0..online {
                out.push_str(&format!("{:>11}", format!("CPU{cpu}")));
            }
            out.push('\n');
            for row in changed {
                out.push_str(&self.render_row(row));
            }
        }

        let summaries = state.totals.summaries(online, self.interval);
        if !summaries.is_empty() {
            out.push('\n');
            for summary in &summaries {
                out.push_str(&render_summary(summary));
            }
        }

        out
    }

    fn render_row(&self, row: &CounterRow) -> String {
        let mut line = format!("{:<10}", row.name);
        for delta in &row.delta {
            line.push_str(&format!("{delta:>11}"));
        }
        if !row.tail.is_empty() {
            line.push_str("  ");
            line.push_str(&row.tail.join(" "));
        }
        if row.is_numeric() {
            line.push_str("  ");
            line.push_str(&self.affinity.lookup(&row.name).display());
        }
        line.push('\n');
        line
    }

    /// Render one cycle as a single-line JSON record.
    ///
    /// # Errors
    ///
    /// Returns a serialization error, which should not occur for these
    /// types.
    pub fn render_json(
        &self,
        state: &MonitorState,
        cpus: &[CpuUtil],
    ) -> serde_json::Result<String> {
        let rows = state
            .changed_rows()
            .into_iter()
            .map(|row| SnapshotRow {
                name: &row.name,
                delta: &row.delta,
                tail: &row.tail,
                affinity: row
                    .is_numeric()
                    .then(|| self.affinity.lookup(&row.name)),
            })
            .collect();

        serde_json::to_string(&Snapshot {
            cycle: state.cycles(),
            online_cpus: state.online_cpus(),
            interval: self.interval,
            cpus,
            rows,
            totals: state.totals.summaries(state.online_cpus(), self.interval),
        })
    }
}

fn render_summary(summary: &TrackedSummary) -> String {
    format!(
        "{}: total {}  per-cpu {:.2}  per-sec {:.2}  per-sec-per-cpu {:.2}\n",
        summary.label,
        summary.total,
        summary.per_cpu,
        summary.per_second,
        summary.per_second_per_cpu
    )
}

/// One cycle's machine-readable record.
#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    cycle: u64,
    online_cpus: usize,
    interval: u64,
    cpus: &'a [CpuUtil],
    rows: Vec<SnapshotRow<'a>>,
    totals: Vec<TrackedSummary>,
}

#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    name: &'a str,
    delta: &'a [i64],
    tail: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    affinity: Option<AffinityInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use irqwatch_rs_core::{HardIrqCollector, LinePattern, SoftIrqCollector};

    const HARD_PASS_1: &str = "\
            CPU0       CPU1
  95:         10         20  IR-PCI-MSI  eth0
 LOC:        100        100  Local timer interrupts
";

    const HARD_PASS_2: &str = "\
            CPU0       CPU1
  95:         15         25  IR-PCI-MSI  eth0
 LOC:        100        100  Local timer interrupts
";

    const SOFT_PASS_1: &str = "\
                    CPU0       CPU1
      NET_RX:          5          5
";

    const SOFT_PASS_2: &str = "\
                    CPU0       CPU1
      NET_RX:          8          5
";

    fn reported_state(track: &[&str]) -> MonitorState {
        let track: Vec<LinePattern> = track.iter().map(|p| p.parse().unwrap()).collect();
        let mut state = MonitorState::new(track, Vec::new());
        let hard = HardIrqCollector::default();
        let soft = SoftIrqCollector::default();

        hard.collect_from_str(HARD_PASS_1, &mut state).unwrap();
        soft.collect_from_str(SOFT_PASS_1, &mut state).unwrap();
        state.finish_cycle();
        hard.collect_from_str(HARD_PASS_2, &mut state).unwrap();
        soft.collect_from_str(SOFT_PASS_2, &mut state).unwrap();
        state
    }

    fn cpus() -> Vec<CpuUtil> {
        vec![CpuUtil {
            cpu: 0,
            usr: 1.0,
            nice: 0.0,
            sys: 0.5,
            iowait: 0.0,
            irq: 0.0,
            soft: 0.2,
            steal: 0.0,
            guest: 0.0,
            idle: 98.3,
        }]
    }

    fn test_presenter(interval: u64) -> (Presenter, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let presenter =
            Presenter::with_affinity(interval, AffinityLookup::with_base(tmp.path()));
        (presenter, tmp)
    }

    #[test]
    fn test_text_screen_blocks() {
        let state = reported_state(&["eth"]);
        let (presenter, _tmp) = test_presenter(2);
        let text = presenter.render_text(&state, &cpus());

        assert!(text.starts_with("irqwatch  interval 2s  cpus 2  cycle 1\n"));
        assert!(text.contains("%usr"));
        assert!(text.contains("98.30"));

        // Changed rows only, in name order, with deltas and tails.
        let row_95 = text.lines().find(|l| l.starts_with("95")).unwrap();
        assert!(row_95.contains("IR-PCI-MSI eth0"));
        assert!(row_95.contains("hint=none,aff=none"));
        let net_rx = text.lines().find(|l| l.starts_with("NET_RX")).unwrap();
        assert!(!net_rx.contains("hint="));

        // Summary: total 30 (warm-up baseline) + 10 (second pass) = 40.
        assert!(text.contains("eth: total 40  per-cpu 20.00  per-sec 20.00  per-sec-per-cpu 10.00"));
    }

    #[test]
    fn test_unchanged_rows_are_not_rendered() {
        let state = reported_state(&[]);
        let (presenter, _tmp) = test_presenter(1);
        let text = presenter.render_text(&state, &cpus());
        assert!(!text.lines().any(|l| l.starts_with("LOC")));
    }

    #[test]
    fn test_quiet_state_renders_placeholder() {
        let mut state = MonitorState::new(Vec::new(), Vec::new());
        HardIrqCollector::default()
            .collect_from_str(HARD_PASS_1, &mut state)
            .unwrap();
        state.finish_cycle();

        let (presenter, _tmp) = test_presenter(1);
        let text = presenter.render_text(&state, &cpus());
        assert!(text.contains("no interrupt activity yet"));
    }

    #[test]
    fn test_affinity_files_feed_the_row() {
        let state = reported_state(&[]);
        let (presenter, tmp) = test_presenter(1);
        let dir = tmp.path().join("95");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("affinity_hint"), "0000000f\n").unwrap();
        std::fs::write(dir.join("smp_affinity_list"), "0-7\n").unwrap();

        let text = presenter.render_text(&state, &[]);
        let row_95 = text.lines().find(|l| l.starts_with("95")).unwrap();
        assert!(row_95.contains("hint=0-3,aff=0-7"));
    }

    #[test]
    fn test_json_record() {
        let state = reported_state(&["eth"]);
        let (presenter, _tmp) = test_presenter(1);
        let json = presenter.render_json(&state, &cpus()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["online_cpus"], 2);
        assert_eq!(value["rows"][0]["name"], "95");
        assert_eq!(value["rows"][0]["delta"][0], 5);
        assert_eq!(value["rows"][0]["affinity"]["hint"], "none");
        assert_eq!(value["rows"][1]["name"], "NET_RX");
        assert!(value["rows"][1].get("affinity").is_none());
        assert_eq!(value["totals"][0]["total"], 40);
    }

    #[test]
    fn test_zero_cpu_summary_is_rendered_without_panicking() {
        // A state that never saw a hardware header has zero online CPUs.
        let state = MonitorState::new(vec!["eth".parse().unwrap()], Vec::new());
        let (presenter, _tmp) = test_presenter(0);
        let text = presenter.render_text(&state, &[]);
        assert!(text.contains("eth: total 0  per-cpu 0.00  per-sec 0.00  per-sec-per-cpu 0.00"));
    }
}
