//! Resource-limit string parsing.
//!
//! Memory limits are written as an integer followed by a binary unit suffix
//! (`512MB`, `2GB`, `10K`). Two-letter suffixes are matched first, then the
//! one-letter forms. CPU shares are plain base-10 integers.

use crate::error::ParseError;

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;
const TIB: u64 = GIB * 1024;

/// Known memory suffixes in match order.
const MEMORY_UNITS: &[(&str, u64)] = &[
    ("KB", KIB),
    ("MB", MIB),
    ("GB", GIB),
    ("TB", TIB),
    ("K", KIB),
    ("M", MIB),
    ("G", GIB),
    ("T", TIB),
];

/// Parse a memory limit such as `512MB` into bytes.
///
/// Input is trimmed and matched case-insensitively.
///
/// # Errors
///
/// Returns [`ParseError::InvalidMemory`] when the unit is unknown, the numeric
/// prefix is not a non-negative integer, or the result overflows `i64`.
pub fn parse_memory_bytes(value: &str) -> Result<i64, ParseError> {
    let normalized = value.trim().to_ascii_uppercase();
    let invalid = |reason: String| ParseError::InvalidMemory {
        value: String::from(value),
        reason,
    };

    let Some((digits, multiplier)) = MEMORY_UNITS.iter().find_map(|&(suffix, multiplier)| {
        normalized
            .strip_suffix(suffix)
            .map(|digits| (digits, multiplier))
    }) else {
        return Err(invalid(format!("unknown unit in '{normalized}'")));
    };

    let amount = digits
        .parse::<u64>()
        .map_err(|error| invalid(error.to_string()))?;

    amount
        .checked_mul(multiplier)
        .and_then(|bytes| i64::try_from(bytes).ok())
        .ok_or_else(|| invalid(String::from("value is too large")))
}

/// Parse a relative CPU-share weight.
///
/// # Errors
///
/// Returns [`ParseError::InvalidCpuShares`] when the trimmed input is not a
/// base-10 integer.
pub fn parse_cpu_shares(value: &str) -> Result<i64, ParseError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|error| ParseError::InvalidCpuShares {
            value: String::from(value),
            reason: error.to_string(),
        })
}
