//! `float` and `double` lexical forms.
//!
//! Output uses the shortest digit string that parses back to the same value.
//! Large and small magnitudes switch to exponent notation `dE+xx` with at
//! least two exponent digits; the special values are `INF`, `-INF` and `NaN`.

use crate::{Error, Result};

/// Decimal exponent from which `double` switches to exponent notation.
const DOUBLE_EXPONENT_THRESHOLD: i32 = 15;
/// Decimal exponent from which `float` switches to exponent notation.
const FLOAT_EXPONENT_THRESHOLD: i32 = 7;
/// Values below 1E-5 are written in exponent notation.
const SMALL_EXPONENT_THRESHOLD: i32 = -5;

/// Formats a `double`.
pub fn format_f64(v: f64) -> String {
    if let Some(special) = special(v.is_nan(), v.is_infinite(), v.is_sign_negative()) {
        return special.to_string();
    }
    canonical(&format!("{v:e}"), &v.to_string(), DOUBLE_EXPONENT_THRESHOLD)
}

/// Formats a `float`.
pub fn format_f32(v: f32) -> String {
    if let Some(special) = special(v.is_nan(), v.is_infinite(), v.is_sign_negative()) {
        return special.to_string();
    }
    canonical(&format!("{v:e}"), &v.to_string(), FLOAT_EXPONENT_THRESHOLD)
}

fn special(nan: bool, infinite: bool, negative: bool) -> Option<&'static str> {
    if nan {
        Some("NaN")
    } else if infinite {
        Some(if negative { "-INF" } else { "INF" })
    } else {
        None
    }
}

/// `scientific` is Rust's shortest `{:e}` output (`1.5e20`), `plain` its
/// shortest positional output.
fn canonical(scientific: &str, plain: &str, threshold: i32) -> String {
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return plain.to_string();
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if plain.trim_start_matches('-') == "0" || (SMALL_EXPONENT_THRESHOLD..threshold).contains(&exponent) {
        return plain.to_string();
    }
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}E{sign}{:02}", exponent.unsigned_abs())
}

/// Rust's float parser also takes `inf`, `infinity` and `nan` in any case;
/// the wire form only knows `INF`, `-INF` and `NaN`.
fn check_lexical<'a>(value: &'a str, kind: &'static str) -> Result<&'a str> {
    let trimmed = value.trim();
    let ok = !trimmed.is_empty()
        && trimmed
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if ok { Ok(trimmed) } else { Err(Error::format(kind, value)) }
}

/// Parses a `double`.
pub fn parse_f64(value: &str) -> Result<f64> {
    match value.trim() {
        "INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    check_lexical(value, "double")?
        .parse()
        .map_err(|_| Error::format("double", value))
}

/// Parses a `float`.
pub fn parse_f32(value: &str) -> Result<f32> {
    match value.trim() {
        "INF" => return Ok(f32::INFINITY),
        "-INF" => return Ok(f32::NEG_INFINITY),
        "NaN" => return Ok(f32::NAN),
        _ => {}
    }
    check_lexical(value, "float")?
        .parse()
        .map_err(|_| Error::format("float", value))
}
