//! Field extraction helpers shared by both record families.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use grep_matcher::{Captures, Matcher};
use grep_regex::RegexMatcher;

use super::model::ParseError;

// ASCII word characters only
const KEY_VALUE_PATTERN: &str = r"(?-u)(\w+):\s+(\w+),?";
const DATETIME_PATTERN: &str = r"\d+-\d+-\d+[ T]?\d+:\d+:\d+(?:\.\d+)?\b";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

static KEY_VALUE: LazyLock<RegexMatcher> = LazyLock::new(|| {
    RegexMatcher::new(KEY_VALUE_PATTERN).expect("key/value pattern is valid")
});

static DATETIME: LazyLock<RegexMatcher> = LazyLock::new(|| {
    RegexMatcher::new(DATETIME_PATTERN).expect("datetime pattern is valid")
});

/// Every `key: value` token in the line, in order of appearance.
pub fn scan_pairs(line: &[u8]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut caps = match KEY_VALUE.new_captures() {
        Ok(caps) => caps,
        Err(_) => return pairs,
    };

    KEY_VALUE
        .captures_iter(line, &mut caps, |caps| {
            if let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) {
                pairs.push((
                    String::from_utf8_lossy(&line[key.start()..key.end()]).into_owned(),
                    String::from_utf8_lossy(&line[value.start()..value.end()]).into_owned(),
                ));
            }
            true
        })
        .unwrap_or(());

    pairs
}

/// Parse an integer field value, naming the key on failure.
pub fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Find the first datetime in the line, read it as local time and
/// convert it to UTC.
pub fn parse_created_at(line: &[u8]) -> Result<DateTime<Utc>, ParseError> {
    let found = DATETIME
        .find(line)
        .unwrap_or(None)
        .ok_or(ParseError::MissingTimestamp)?;

    let text = String::from_utf8_lossy(&line[found.start()..found.end()]).replace(' ', "T");
    let invalid = || ParseError::InvalidTimestamp { value: text.clone() };

    let naive = NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT).map_err(|_| invalid())?;
    let local = Local.from_local_datetime(&naive).earliest().ok_or_else(invalid)?;

    Ok(local.with_timezone(&Utc))
}
