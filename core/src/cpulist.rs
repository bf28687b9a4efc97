//! CPU list encoding between affinity bitmasks and kernel-style range strings.
//!
//! The kernel exposes interrupt affinity both as a hexadecimal bitmask
//! (`affinity_hint`) and as a "cpulist" range string (`smp_affinity_list`).
//! This module converts between the two representations for masks of up to
//! 64 CPUs.

use crate::{MonitorError, Result};

/// Encode a 64-bit affinity mask as a kernel-style CPU list.
///
/// Bit `i` set means CPU `i` is a member. The bits are scanned from least
/// to most significant over 0..=63; runs of consecutive set bits compress
/// into inclusive `lo-hi` ranges and single members render as bare numbers,
/// comma-joined. An empty mask encodes as the literal `none`.
///
/// # Examples
///
/// ```rust
/// use irqwatch_rs_core::cpulist;
///
/// assert_eq!(cpulist::mask_to_list(0), "none");
/// assert_eq!(cpulist::mask_to_list(0b1111), "0-3");
/// assert_eq!(cpulist::mask_to_list(0b10100), "2,4");
/// ```
#[must_use]
pub fn mask_to_list(mask: u64) -> String {
    if mask == 0 {
        return "none".to_owned();
    }

    let mut parts = Vec::new();
    let mut cpu = 0u32;
    while cpu < 64 {
        if mask & (1u64 << cpu) == 0 {
            cpu += 1;
            continue;
        }
        let lo = cpu;
        while cpu + 1 < 64 && mask & (1u64 << (cpu + 1)) != 0 {
            cpu += 1;
        }
        if lo == cpu {
            parts.push(lo.to_string());
        } else {
            parts.push(format!("{lo}-{cpu}"));
        }
        cpu += 1;
    }

    parts.join(",")
}

/// Parse a kernel-style CPU list back into a 64-bit mask.
///
/// Accepts the same shape [`mask_to_list`] produces: `none` (or an empty
/// string) for the empty mask, otherwise comma-separated bare numbers and
/// inclusive `lo-hi` ranges.
///
/// # Errors
///
/// Returns a parse error for CPU numbers above 63, inverted ranges, or
/// tokens that are not numbers.
pub fn list_to_mask(list: &str) -> Result<u64> {
    let list = list.trim();
    if list.is_empty() || list == "none" {
        return Ok(0);
    }

    let mut mask = 0u64;
    for part in list.split(',') {
        let part = part.trim();
        if let Some((lo, hi)) = part.split_once('-') {
            let lo = parse_cpu(lo)?;
            let hi = parse_cpu(hi)?;
            if lo > hi {
                return Err(MonitorError::parse(format!("inverted CPU range: {part}")));
            }
            for cpu in lo..=hi {
                mask |= 1u64 << cpu;
            }
        } else {
            mask |= 1u64 << parse_cpu(part)?;
        }
    }

    Ok(mask)
}

/// Parse the contents of an `affinity_hint` file into a 64-bit mask.
///
/// The kernel formats the hint as comma-separated 32-bit hexadecimal
/// groups, most significant first (for example `00000005,800a000f`); a
/// plain hex value with or without a `0x` prefix is accepted as well. Only
/// the low 64 bits are represented.
///
/// # Errors
///
/// Returns a parse error for empty input or non-hexadecimal groups.
pub fn mask_from_hex(text: &str) -> Result<u64> {
    let text = text.trim();
    let text = text.strip_prefix("0x").unwrap_or(text);
    if text.is_empty() {
        return Err(MonitorError::parse("empty affinity mask"));
    }

    if !text.contains(',') {
        return u64::from_str_radix(text, 16)
            .map_err(|_| MonitorError::parse(format!("invalid hex mask: {text}")));
    }

    let mut mask = 0u64;
    for group in text.split(',') {
        let group = group.trim();
        let value = u32::from_str_radix(group, 16)
            .map_err(|_| MonitorError::parse(format!("invalid hex mask group: {group}")))?;
        mask = (mask << 32) | u64::from(value);
    }
    Ok(mask)
}

fn parse_cpu(token: &str) -> Result<u32> {
    let cpu = token
        .trim()
        .parse::<u32>()
        .map_err(|_| MonitorError::parse(format!("invalid CPU number: {token}")))?;
    if cpu > 63 {
        return Err(MonitorError::parse(format!(
            "CPU {cpu} outside the 64-bit mask"
        )));
    }
    Ok(cpu)
}
