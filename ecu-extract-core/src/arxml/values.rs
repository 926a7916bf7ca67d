//! Text helpers for reference paths and numeric element values
//!
//! ARXML numbers are free text. Integers are read from their leading decimal
//! digits and decimals from their longest numeric prefix, so trailing junk
//! such as units does not discard an otherwise usable value.

/// Final segment of an AUTOSAR reference path (`/Pkg/Sub/Name` -> `Name`)
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Second-to-last non-empty segment of a reference path
///
/// For a data prototype reference `/Interfaces/PI_Speed/Speed` this is the
/// owning port interface, `PI_Speed`.
pub fn parent_segment(path: &str) -> Option<&str> {
    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    if parts.len() >= 2 {
        Some(parts[parts.len() - 2])
    } else {
        None
    }
}

/// Parse the leading decimal integer of a value (`"64 bytes"` -> 64)
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parse a non-negative integer field, falling back to 0
pub fn parse_count(text: Option<&str>) -> u64 {
    text.and_then(parse_int_prefix)
        .and_then(|value| u64::try_from(value).ok())
        .unwrap_or(0)
}

/// Parse the longest decimal prefix of a value (`"0.1s"` -> 0.1)
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if text[end..].starts_with("Infinity") {
        let value = f64::INFINITY;
        return Some(if text.starts_with('-') { -value } else { value });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

/// Render a number the way the extract tables show it (`1`, `0.1`, `255`)
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // also folds -0 into "0"
        "0".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{}", value)
    }
}

/// Render a CAN identifier as uppercase hex (`2024` -> `0x7E8`)
pub fn format_can_id(can_id: u64) -> String {
    format!("0x{:X}", can_id)
}
