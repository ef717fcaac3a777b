use crate::error::{ProcessingError, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// `... for 1 January 2020`, with an optional ordinal suffix on the day.
static SUMMARY_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfor\s+(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]+)\s+(\d{4})\b")
        .expect("summary date pattern is valid")
});

/// First line of a page that carries a summary date.
pub fn find_date_line(text: &str) -> Option<&str> {
    text.lines()
        .find(|line| SUMMARY_DATE.is_match(line))
        .map(str::trim)
}

/// Parse the date out of a summary date line.
pub fn parse_summary_date(line: &str) -> Result<NaiveDate> {
    let captures = SUMMARY_DATE.captures(line).ok_or_else(|| {
        ProcessingError::SourceFormat(format!("No 'for <day> <month> <year>' date in '{}'", line))
    })?;

    let normalized = format!("{} {} {}", &captures[1], &captures[2], &captures[3]);
    NaiveDate::parse_from_str(&normalized, "%d %B %Y").map_err(|e| {
        ProcessingError::SourceFormat(format!("Unparseable date '{}': {}", normalized, e))
    })
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next.signed_duration_since(first).num_days() as u32)
}
