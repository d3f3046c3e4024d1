//! Utility functions and helpers

use thiserror::Error;

/// Error returned when a flags value cannot be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFlagsError {
    #[error("empty flags value")]
    Empty,

    #[error("invalid flags value '{0}'")]
    Invalid(String),

    #[error("flags value '{0}' does not fit in 32 bits")]
    OutOfRange(String),
}

/// Parse a flags value (e.g., "577", "-1", "0x241", "0o1101", "0b11")
///
/// Values above `i32::MAX` but within `u32` are reinterpreted as the
/// same 32-bit pattern, so `0xffffffff` parses to `-1`.
pub fn parse_flags_value(s: &str) -> Result<i32, ParseFlagsError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseFlagsError::Empty);
    }

    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (radix, digits) = if let Some(d) = strip_radix_prefix(unsigned, 'x') {
        (16, d)
    } else if let Some(d) = strip_radix_prefix(unsigned, 'o') {
        (8, d)
    } else if let Some(d) = strip_radix_prefix(unsigned, 'b') {
        (2, d)
    } else {
        (10, unsigned)
    };

    let digits = digits.replace('_', "");
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(ParseFlagsError::Invalid(s.to_string()));
    }

    let magnitude = u64::from_str_radix(&digits, radix)
        .map_err(|_| ParseFlagsError::Invalid(s.to_string()))?;

    if negative {
        if magnitude > i32::MIN.unsigned_abs() as u64 {
            return Err(ParseFlagsError::OutOfRange(s.to_string()));
        }
        Ok((magnitude as i64).wrapping_neg() as i32)
    } else {
        let value =
            u32::try_from(magnitude).map_err(|_| ParseFlagsError::OutOfRange(s.to_string()))?;
        Ok(value as i32)
    }
}

fn strip_radix_prefix(s: &str, marker: char) -> Option<&str> {
    let rest = s.strip_prefix('0')?;
    rest.strip_prefix(marker)
        .or_else(|| rest.strip_prefix(marker.to_ascii_uppercase()))
}
