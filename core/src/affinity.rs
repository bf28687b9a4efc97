//! Per-vector affinity lookup.
//!
//! Numeric interrupt vectors carry two optional kernel files under
//! `/proc/irq/<n>/`: `affinity_hint` (hexadecimal bitmask) and
//! `smp_affinity_list` (cpulist string). Both are read on demand at render
//! time and never cached across cycles; an absent or unreadable file
//! renders as the literal `none`.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::cpulist;

/// Default base directory for the per-vector affinity files.
pub const PROC_IRQ: &str = "/proc/irq";

/// Affinity hint and assignment for one numeric vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffinityInfo {
    /// Range-encoded `affinity_hint` mask, or `none`.
    pub hint: String,
    /// Raw `smp_affinity_list` content, or `none`.
    pub assigned: String,
}

impl AffinityInfo {
    /// The render form, `hint=<range-or-none>,aff=<raw-range-or-none>`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("hint={},aff={}", self.hint, self.assigned)
    }
}

/// Render-time reader for the per-vector affinity files.
#[derive(Debug, Clone)]
pub struct AffinityLookup {
    base: PathBuf,
}

impl Default for AffinityLookup {
    fn default() -> Self {
        Self {
            base: PathBuf::from(PROC_IRQ),
        }
    }
}

impl AffinityLookup {
    /// Lookup over an alternate base directory.
    #[must_use]
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Read both affinity files for a vector.
    ///
    /// Missing files are not an error; each half independently falls back
    /// to `none`. A hint that fails to parse as a hex mask also falls back
    /// to `none`.
    #[must_use]
    pub fn lookup(&self, irq: &str) -> AffinityInfo {
        let dir = self.base.join(irq);

        let hint = fs::read_to_string(dir.join("affinity_hint"))
            .ok()
            .and_then(|text| cpulist::mask_from_hex(&text).ok())
            .map(cpulist::mask_to_list)
            .unwrap_or_else(|| "none".to_owned());

        let assigned = fs::read_to_string(dir.join("smp_affinity_list"))
            .ok()
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "none".to_owned());

        AffinityInfo { hint, assigned }
    }
}
