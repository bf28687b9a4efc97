//! Live kernel interrupt monitoring for irqwatch-rs.
//!
//! This crate is the binary side of the monitor: the CPU-statistics
//! collaborator wrapper and the presenter. The delta-tracking engine
//! (counter tables, collectors, cpulist encoding) lives in
//! `irqwatch-rs-core`.

pub mod cpustat;
pub mod render;

pub use cpustat::{CpuStatsCollector, CpuUtil};
pub use render::Presenter;
