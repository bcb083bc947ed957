use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, SimError};

// Numeric literal patterns, tried in order
lazy_static! {
    static ref HEX_PATTERN: Regex = Regex::new(
        r"^\s*([-+]?)0[xX]([0-9a-fA-F]+)\s*$"
    ).unwrap();

    static ref BINARY_PATTERN: Regex = Regex::new(
        r"^\s*([-+]?)0[bB]([01]+)\s*$"
    ).unwrap();

    static ref OCTAL_PATTERN: Regex = Regex::new(
        r"^\s*([-+]?)0([0-7]+)\s*$"
    ).unwrap();

    static ref DECIMAL_PATTERN: Regex = Regex::new(
        r"^\s*([-+]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?)\s*$"
    ).unwrap();

    static ref SCALED_PATTERN: Regex = Regex::new(
        r"^\s*([-+]?(?:[0-9]+\.?[0-9]*|\.[0-9]+))(meg|MEG|Meg|[aAfFgGkKmMnNpPtTuU])\s*$"
    ).unwrap();
}

/// Convert a string to a number, accepting hex (`0x1f`), binary (`0b101`),
/// octal (`017`), decimal and floating point literals, and engineering scale
/// factors (`1k`, `2.2u`, `10meg`).
///
/// Scale factors are case sensitive where SPICE-like usage collides:
/// `M` is mega, `m` is milli, `P` is peta and `p` is pico.
/// Returns `None` if the string is not a number.
pub fn parse_number(value_str: &str) -> Option<f64> {
    if let Some(captures) = HEX_PATTERN.captures(value_str) {
        return parse_radix(&captures[1], &captures[2], 16);
    }
    if let Some(captures) = BINARY_PATTERN.captures(value_str) {
        return parse_radix(&captures[1], &captures[2], 2);
    }
    if let Some(captures) = OCTAL_PATTERN.captures(value_str) {
        return parse_radix(&captures[1], &captures[2], 8);
    }
    if let Some(captures) = DECIMAL_PATTERN.captures(value_str) {
        return captures[1].parse::<f64>().ok();
    }
    if let Some(captures) = SCALED_PATTERN.captures(value_str) {
        let mantissa = captures[1].parse::<f64>().ok()?;
        return Some(mantissa * scale_factor(&captures[2]));
    }
    None
}

/// Like [`parse_number`], but a string that is not a number is an error
/// naming the offending text.
pub fn parse_number_alert(value_str: &str) -> Result<f64> {
    parse_number(value_str).ok_or_else(|| SimError::BadNumber(value_str.to_string()))
}

fn parse_radix(sign: &str, digits: &str, radix: u32) -> Option<f64> {
    let magnitude = i64::from_str_radix(digits, radix).ok()? as f64;
    Some(if sign == "-" { -magnitude } else { magnitude })
}

fn scale_factor(suffix: &str) -> f64 {
    match suffix {
        "meg" | "MEG" | "Meg" => 1e6,
        "P" => 1e15,
        "t" | "T" => 1e12,
        "g" | "G" => 1e9,
        "M" => 1e6,
        "k" | "K" => 1e3,
        "m" => 1e-3,
        "u" | "U" => 1e-6,
        "n" | "N" => 1e-9,
        "p" => 1e-12,
        "f" | "F" => 1e-15,
        "a" | "A" => 1e-18,
        _ => 1.0,
    }
}
