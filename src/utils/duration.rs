use std::sync::LazyLock;

use regex::Regex;

/// Strict shape of a duration typed by a person or found in an imported file. Hours are one or
/// two digits, minutes always two.
static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}$").expect("duration pattern is valid"));

/// Duration shown when nobody on a day has valid hours.
pub const ZERO_DURATION: &str = "0:00";

/// Converts `H:MM` into minutes.
///
/// This is the lenient conversion used for live display. Anything without a `:` is `0`, an empty
/// segment counts as `0` and a segment that isn't a number turns the whole value into `0`.
/// Use [is_valid_duration] when a value has to be rejected instead.
pub fn parse_minutes(value: &str) -> u32 {
    if value.is_empty() || !value.contains(':') {
        return 0;
    }
    let mut segments = value.split(':');
    let hours = segments.next().map(parse_segment).unwrap_or(Some(0));
    let minutes = segments.next().map(parse_segment).unwrap_or(Some(0));
    match (hours, minutes) {
        (Some(hours), Some(minutes)) => hours.saturating_mul(60).saturating_add(minutes),
        _ => 0,
    }
}

fn parse_segment(segment: &str) -> Option<u32> {
    let segment = segment.trim();
    if segment.is_empty() {
        Some(0)
    } else {
        segment.parse::<u32>().ok()
    }
}

/// Formats minutes as `H:MM`. Hours are not padded and may go past 24.
pub fn format_minutes(total: u32) -> String {
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn is_valid_duration(value: &str) -> bool {
    DURATION_PATTERN.is_match(value)
}

/// Normalizes what a person types into an hours field: only digits are kept, at most 4 of them,
/// and a `:` goes after the second one. `"0830"` becomes `"08:30"`.
pub fn format_time_input(raw: &str) -> String {
    let digits = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(4)
        .collect::<String>();
    if digits.len() <= 2 {
        digits
    } else {
        format!("{}:{}", &digits[..2], &digits[2..])
    }
}
