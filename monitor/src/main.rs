//! irqwatch-rs-monitor: live kernel interrupt monitor binary.
//!
//! Tracks per-cycle deltas of `/proc/interrupts` and `/proc/softirqs`
//! alongside the per-CPU utilization reported by mpstat, and redraws the
//! terminal once per sampling interval.

use clap::Parser;
use irqwatch_rs_core::{
    GlobalConfig, HardIrqCollector, LinePattern, MonitorState, SoftIrqCollector,
};
use irqwatch_rs_monitor::cpustat::CpuStatsCollector;
use irqwatch_rs_monitor::render::{Presenter, CLEAR_SCREEN};
use std::io::{self, Write};
use std::process;

/// Command-line arguments for the interrupt monitor.
#[derive(Parser)]
#[command(name = "irqwatch-rs-monitor")]
#[command(about = "Live kernel interrupt and per-CPU load monitor")]
#[command(version)]
#[command(author)]
struct Args {
    /// Sampling interval in seconds
    #[arg(value_parser = validate_interval)]
    interval: Option<u64>,

    /// Track a name pattern in the running totals (repeatable; a leading ^ selects prefix match)
    #[arg(long, value_name = "PATTERN")]
    track: Vec<String>,

    /// Exclude lines matching a pattern from the change report (repeatable)
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// One-shot mode (report a single cycle and exit)
    #[arg(short, long)]
    once: bool,

    /// Emit one JSON record per cycle instead of the live screen
    #[arg(long)]
    json: bool,

    /// Verify the counter sources and mpstat are available and exit
    #[arg(long)]
    check: bool,

    /// Generate example config file and exit
    #[arg(long)]
    generate_config: bool,
}

/// Validate that the interval is a positive number of seconds.
fn validate_interval(s: &str) -> Result<u64, String> {
    let interval = s
        .parse::<u64>()
        .map_err(|_| "Interval must be a positive integer".to_owned())?;

    if interval == 0 {
        return Err("Interval must be at least 1 second".to_owned());
    }

    Ok(interval)
}

fn parse_patterns(texts: &[String], what: &str) -> Vec<LinePattern> {
    texts
        .iter()
        .map(|text| match text.parse() {
            Ok(pattern) => pattern,
            Err(e) => {
                eprintln!("Invalid {what} pattern {text:?}: {e}");
                process::exit(1);
            }
        })
        .collect()
}

/// Main entry point for the interrupt monitor.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle config generation
    if args.generate_config {
        if let Some(config_path) = GlobalConfig::default_config_path() {
            GlobalConfig::save_example_config_to_file(&config_path)?;
            println!("Generated example config at: {}", config_path.display());
        } else {
            eprintln!("Could not determine config directory");
            process::exit(1);
        }
        return Ok(());
    }

    // Load global configuration and apply command line overrides
    let config = GlobalConfig::load().unwrap_or_default();
    let interval = args.interval.unwrap_or_else(|| config.interval.max(1));
    let track_texts = if args.track.is_empty() {
        config.track.clone()
    } else {
        args.track.clone()
    };
    let exclude_texts = if args.exclude.is_empty() {
        config.exclude.clone()
    } else {
        args.exclude.clone()
    };
    let track = parse_patterns(&track_texts, "--track");
    let exclude = parse_patterns(&exclude_texts, "--exclude");

    let hard = HardIrqCollector::default();
    let soft = SoftIrqCollector::default();
    let cpu_stats = CpuStatsCollector::new(interval);

    // Check availability if requested
    if args.check {
        match check_collectors(&hard, &soft, &cpu_stats).await {
            Ok(()) => {
                println!("interrupt monitor collectors are available");
                return Ok(());
            }
            Err(e) => {
                eprintln!("Collector check failed: {e}");
                process::exit(1);
            }
        }
    }

    let mut state = MonitorState::new(track, exclude);
    let presenter = Presenter::new(interval);

    // Warm-up pass: establish counter baselines without reporting.
    if let Err(e) = collect_tables(&hard, &soft, &mut state) {
        eprintln!("Failed to read interrupt counters: {e}");
        process::exit(1);
    }
    state.finish_cycle();

    loop {
        if let Err(e) = collect_tables(&hard, &soft, &mut state) {
            eprintln!("Failed to read interrupt counters: {e}");
            process::exit(1);
        }

        // The collaborator samples for the whole interval; this await is
        // the loop's tick.
        let cpus = match cpu_stats.collect().await {
            Ok(cpus) => cpus,
            Err(e) => {
                eprintln!("Failed to collect CPU statistics: {e}");
                process::exit(1);
            }
        };

        if args.json {
            println!("{}", presenter.render_json(&state, &cpus)?);
        } else {
            print!("{}{}", CLEAR_SCREEN, presenter.render_text(&state, &cpus));
        }
        io::stdout().flush()?;

        state.finish_cycle();
        if args.once {
            break;
        }
    }

    Ok(())
}

fn collect_tables(
    hard: &HardIrqCollector,
    soft: &SoftIrqCollector,
    state: &mut MonitorState,
) -> irqwatch_rs_core::Result<()> {
    hard.collect(state)?;
    soft.collect(state)
}

async fn check_collectors(
    hard: &HardIrqCollector,
    soft: &SoftIrqCollector,
    cpu_stats: &CpuStatsCollector,
) -> irqwatch_rs_core::Result<()> {
    let mut probe = MonitorState::new(Vec::new(), Vec::new());
    hard.collect(&mut probe)?;
    soft.collect(&mut probe)?;
    cpu_stats.check().await
}
