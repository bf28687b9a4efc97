//! CPU utilization via the external `mpstat` collaborator.
//!
//! The monitor shells out to `mpstat -P ALL <interval> 1` once per cycle.
//! Awaiting the child is also the program's tick: mpstat sleeps for the
//! sampling interval before printing its report, so the loop needs no
//! separate sleep.

use serde::Serialize;
use tokio::process::Command;

use irqwatch_rs_core::{MonitorError, Result};

/// Default CPU-statistics collaborator binary.
pub const MPSTAT: &str = "mpstat";

/// One CPU's utilization breakdown over the last interval, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuUtil {
    /// CPU number.
    pub cpu: usize,
    /// User time.
    pub usr: f64,
    /// Niced user time.
    pub nice: f64,
    /// Kernel time.
    pub sys: f64,
    /// I/O wait time.
    pub iowait: f64,
    /// Hardware interrupt time.
    pub irq: f64,
    /// Soft interrupt time.
    pub soft: f64,
    /// Time stolen by the hypervisor.
    pub steal: f64,
    /// Guest time.
    pub guest: f64,
    /// Idle time.
    pub idle: f64,
}

/// Spawns the collaborator and parses its per-CPU report.
#[derive(Debug, Clone)]
pub struct CpuStatsCollector {
    command: String,
    interval: u64,
}

impl CpuStatsCollector {
    /// Collector over the default `mpstat` binary.
    #[must_use]
    pub fn new(interval: u64) -> Self {
        Self {
            command: MPSTAT.to_owned(),
            interval,
        }
    }

    /// Collector over an alternate command.
    #[must_use]
    pub fn with_command(command: impl Into<String>, interval: u64) -> Self {
        Self {
            command: command.into(),
            interval,
        }
    }

    /// Run one sampling round. This call blocks for the configured
    /// interval while the collaborator samples.
    ///
    /// # Errors
    ///
    /// Returns an unavailable error when the collaborator cannot be
    /// spawned or exits with a failure status; the monitor cannot pace
    /// itself without it.
    pub async fn collect(&self) -> Result<Vec<CpuUtil>> {
        let output = Command::new(&self.command)
            .arg("-P")
            .arg("ALL")
            .arg(self.interval.to_string())
            .arg("1")
            .output()
            .await
            .map_err(|e| MonitorError::unavailable(format!("{}: {e}", self.command)))?;

        if !output.status.success() {
            return Err(MonitorError::unavailable(format!(
                "{} exited with {}",
                self.command, output.status
            )));
        }

        Ok(parse_output(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Probe whether the collaborator can be spawned at all.
    ///
    /// # Errors
    ///
    /// Returns an unavailable error when spawning fails.
    pub async fn check(&self) -> Result<()> {
        Command::new(&self.command)
            .arg("-V")
            .output()
            .await
            .map(|_| ())
            .map_err(|e| MonitorError::unavailable(format!("{}: {e}", self.command)))
    }
}

/// Parse an mpstat report into per-CPU records.
///
/// Data lines carry twelve fields: `time ampm cpu %usr %nice %sys %iowait
/// %irq %soft %steal %guest %idle`. The banner, blank lines, column
/// headers (containing `CPU`), the `all` aggregate, `Average` rows, and
/// anything else non-conforming are skipped.
#[must_use]
pub fn parse_output(text: &str) -> Vec<CpuUtil> {
    let mut cpus = Vec::new();

    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 12 || line.contains("CPU") || fields[0].starts_with("Average") {
            continue;
        }
        if fields[2] == "all" {
            continue;
        }
        let Ok(cpu) = fields[2].parse::<usize>() else {
            continue;
        };

        let mut values = [0f64; 9];
        let mut conforming = true;
        for (slot, field) in values.iter_mut().zip(&fields[3..12]) {
            match field.parse::<f64>() {
                Ok(value) => *slot = value,
                Err(_) => {
                    conforming = false;
                    break;
                }
            }
        }
        if !conforming {
            continue;
        }

        cpus.push(CpuUtil {
            cpu,
            usr: values[0],
            nice: values[1],
            sys: values[2],
            iowait: values[3],
            irq: values[4],
            soft: values[5],
            steal: values[6],
            guest: values[7],
            idle: values[8],
        });
    }

    cpus
}
