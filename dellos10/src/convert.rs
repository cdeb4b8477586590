//! Sentinel values and lenient string coercion.
//!
//! The device omits fields freely. Every record the driver returns is
//! complete: a missing value becomes one of the sentinels below instead of
//! an empty string or a zero that could be mistaken for real data.

/// Sentinel for a string the device did not report.
pub const UNKNOWN: &str = "N/A";

/// Sentinel for an integer the device did not report.
pub const UNKNOWN_INT: i64 = -1;

/// Sentinel for a float the device did not report.
pub const UNKNOWN_FLOAT: f64 = -1.0;

/// Sentinel for a boolean the device did not report.
pub const UNKNOWN_BOOL: bool = false;

/// Convert a device string to an integer, falling back to [`UNKNOWN_INT`].
///
/// Accepts both `&str` and `Option<&str>`:
///
/// ```rust
/// use dellos10::convert::{convert_int, UNKNOWN_INT};
///
/// assert_eq!(convert_int("42"), 42);
/// assert_eq!(convert_int(""), UNKNOWN_INT);
/// assert_eq!(convert_int(None), UNKNOWN_INT);
/// ```
pub fn convert_int<'a>(value: impl Into<Option<&'a str>>) -> i64 {
    match value.into().map(str::trim) {
        Some(v) if !v.is_empty() => v.parse().unwrap_or(UNKNOWN_INT),
        _ => UNKNOWN_INT,
    }
}

/// Convert a device string to a float, falling back to [`UNKNOWN_FLOAT`].
pub fn convert_float<'a>(value: impl Into<Option<&'a str>>) -> f64 {
    match value.into().map(str::trim) {
        Some(v) if !v.is_empty() => v.parse().unwrap_or(UNKNOWN_FLOAT),
        _ => UNKNOWN_FLOAT,
    }
}

/// Convert a device string to a boolean, falling back to [`UNKNOWN_BOOL`].
///
/// Explicit negatives (`false`, `no`, `down`, `disabled`, `0`) are false.
/// Any other non-empty value counts as set.
pub fn convert_bool<'a>(value: impl Into<Option<&'a str>>) -> bool {
    match value.into().map(str::trim) {
        Some(v) if !v.is_empty() => !matches!(
            v.to_ascii_lowercase().as_str(),
            "false" | "no" | "down" | "disabled" | "0"
        ),
        _ => UNKNOWN_BOOL,
    }
}

/// Owned string, or [`UNKNOWN`] when the device sent nothing.
pub fn or_unknown(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}
