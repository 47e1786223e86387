//! Duration parsing and rendering
//!
//! The upstream stores durations either as seconds or as timedelta text in the form
//! `"0 days 00:01:32.123000"`, with `"NaT"` for a missing value. Shorter clock forms
//! (`"1:32.123"`, `"01:32.123"`) also appear in hand-maintained sources.

use serde_yaml_ng::Value;

use crate::yaml_utils;

const SECONDS_PER_DAY: f64 = 86_400.0;
const MICROS_PER_SECOND: u64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND as i64;

/// Read a duration value as seconds.
///
/// The result may be NaN or infinite when the source says so; it is `None` when the
/// value is not a duration at all.
pub fn seconds(value: &Value) -> Option<f64> {
    match yaml_utils::untagged(value) {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_timedelta(text),
        _ => None,
    }
}

/// Parse timedelta text into seconds.
pub fn parse_timedelta(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("nat") {
        return None;
    }

    let (days, clock) = match text.split_once(" day") {
        Some((days, rest)) => {
            let days: f64 = days.trim().parse().ok()?;
            let rest = rest.strip_prefix('s').unwrap_or(rest).trim();
            (days, rest.strip_prefix('+').unwrap_or(rest))
        }
        None => (0.0, text),
    };

    if clock.is_empty() {
        return Some(days * SECONDS_PER_DAY);
    }

    let (negative, clock) = match clock.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, clock),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    let mut total = 0.0;
    for part in parts {
        let value: f64 = part.trim().parse().ok()?;
        total = total * 60.0 + value;
    }

    let total = if negative { -total } else { total };
    Some(days * SECONDS_PER_DAY + total)
}

/// Render seconds as timedelta text, `"NaT"` for non-finite input.
///
/// The fractional part is printed with microsecond precision and omitted when zero.
/// Negative durations borrow whole days and keep a positive clock, so -60 seconds
/// renders as `"-1 days +23:59:00"`.
pub fn format_timedelta(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "NaT".to_string();
    }

    let total_micros = (seconds * MICROS_PER_SECOND as f64).round() as i64;
    let days = total_micros.div_euclid(MICROS_PER_DAY);
    let clock_micros = total_micros.rem_euclid(MICROS_PER_DAY);

    let micros = clock_micros % MICROS_PER_SECOND as i64;
    let clock_seconds = clock_micros / MICROS_PER_SECOND as i64;
    let hours = clock_seconds / 3_600;
    let minutes = (clock_seconds % 3_600) / 60;
    let secs = clock_seconds % 60;

    let sign = if days < 0 { "+" } else { "" };
    let mut text = format!("{} days {}{:02}:{:02}:{:02}", days, sign, hours, minutes, secs);
    if micros > 0 {
        text.push_str(&format!(".{:06}", micros));
    }
    text
}
