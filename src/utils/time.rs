use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use chrono_english::{parse_date_string, Dialect};
use regex::Regex;

static DAY_FIRST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("day first pattern is valid")
});
static YEAR_FIRST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("year first pattern is valid")
});

/// This is the standard way of converting a date to a string in teamhours.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Date as the team writes it, `DD/MM/YYYY`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Accepts `D/M/YYYY` and `YYYY-M-D` with one or two digit day and month.
///
/// Matching the shape isn't enough: `32/11/2025` or `2025-02-29` have a valid shape but no
/// calendar day behind them, so they are rejected as well.
pub fn normalize_import_date(value: &str) -> Option<NaiveDate> {
    let (year, month, day) = if let Some(captures) = DAY_FIRST_PATTERN.captures(value) {
        (captures[3].parse().ok()?, captures[2].parse().ok()?, captures[1].parse().ok()?)
    } else if let Some(captures) = YEAR_FIRST_PATTERN.captures(value) {
        (captures[1].parse().ok()?, captures[2].parse().ok()?, captures[3].parse().ok()?)
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses a date given on the command line. Besides ISO dates, anything `chrono_english` accepts
/// in the UK dialect works, e.g. `yesterday` or `15/03/2025`.
pub fn parse_cli_date(value: &str) -> anyhow::Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    let parsed = parse_date_string(value, Local::now(), Dialect::Uk)
        .map_err(|e| anyhow::anyhow!("Failed to parse date {value:?}: {e}"))?;
    Ok(parsed.date_naive())
}
