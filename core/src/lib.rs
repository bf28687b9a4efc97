//! # irqwatch-rs-core
//!
//! Core library for the irqwatch-rs interrupt monitor providing the
//! delta-tracking engine over the kernel interrupt counter tables.
//!
//! ## Features
//!
//! - **Counter tables** - per-vector, per-CPU current values and deltas
//! - **Collectors** - `/proc/interrupts` and `/proc/softirqs` snapshots
//! - **CPU list encoding** - affinity bitmasks to `0-3,17` range strings
//! - **Tracked totals** - running delta sums for configured name patterns
//! - **Affinity lookup** - per-vector hint/assignment read at render time
//! - **Configuration management** - RON-based configuration with defaults
//! - **Error handling** - error types with context
//!
//! ## Quick Start
//!
//! ```rust
//! use irqwatch_rs_core::{HardIrqCollector, MonitorState};
//!
//! let mut state = MonitorState::new(Vec::new(), Vec::new());
//! let collector = HardIrqCollector::default();
//!
//! // The first pass establishes baselines; later passes produce deltas
//! // and flag the rows whose counters moved.
//! collector.collect_from_str("       CPU0  CPU1\n 95:  10  20  eth0\n", &mut state)?;
//! state.finish_cycle();
//! # Ok::<(), irqwatch_rs_core::MonitorError>(())
//! ```

pub mod affinity;
pub mod collector;
pub mod config;
pub mod counters;
pub mod cpulist;
pub mod pattern;
pub mod tracked;

pub use affinity::{AffinityInfo, AffinityLookup};
pub use collector::{HardIrqCollector, MonitorState, SoftIrqCollector};
pub use config::GlobalConfig;
pub use counters::{CounterRow, CounterTable};
pub use pattern::LinePattern;
pub use tracked::{TrackedSummary, TrackedTotals};

/// Result type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Common error types for monitor operations.
///
/// The counter sources are the monitor's primary inputs: failing to read or
/// parse one of them is unrecoverable for the run and propagates up to the
/// binary, which reports it and exits.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// I/O error on a counter source or configuration file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A counter source did not match the expected line shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what failed to parse.
        message: String,
    },

    /// A required external collaborator is missing or failed.
    #[error("Collaborator unavailable: {reason}")]
    Unavailable {
        /// Reason why the collaborator is unavailable.
        reason: String,
    },

    /// Configuration error (invalid pattern, malformed config file, etc.).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration issue.
        message: String,
    },
}

impl MonitorError {
    /// Create a new I/O error carrying the offending path.
    pub fn io<P: Into<String>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a new parse error with a simple message.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new unavailable error.
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
