//! Day and time helpers for scheduled triggers.
//!
//! Days are numbered the way cron does: `sun` = 0 through `sat` = 6.

use chrono::{NaiveTime, Timelike};
use serde_json::Value;

use crate::error::{FlowError, Result};

/// Three-letter day abbreviations, indexed by cron day number.
pub const DAY_ABBREVIATIONS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Display names in the order the day picker lists them.
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Parse an `HH:MM` time of day. Both fields must be exactly two digits.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

fn day_tokens(days: &Value) -> Result<Vec<String>> {
    match days {
        Value::String(s) => Ok(s
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_lowercase())
                    .ok_or_else(|| FlowError::Validation(format!("invalid day: {}", item)))
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(FlowError::Validation(format!("invalid days: {}", other))),
    }
}

/// Cron number for a lowercase abbreviation (`mon`) or full name (`monday`).
fn day_number(token: &str) -> Option<usize> {
    DAY_ABBREVIATIONS.iter().position(|abbr| {
        *abbr == token
            || DAY_NAMES
                .iter()
                .any(|name| name[..3].eq_ignore_ascii_case(abbr) && name.eq_ignore_ascii_case(token))
    })
}

/// Convert day names to sorted, deduplicated cron day numbers.
///
/// Accepts a comma-separated string or a list of abbreviations or full day
/// names, and `weekdays` / `weekend`, which expand to their days.
pub fn days_to_num(days: &Value) -> Result<Vec<usize>> {
    let mut nums = Vec::new();

    for token in day_tokens(days)? {
        match token.as_str() {
            "weekdays" => nums.extend(1..=5),
            "weekend" => nums.extend([0, 6]),
            _ => {
                let idx = day_number(&token)
                    .ok_or_else(|| FlowError::Validation(format!("unknown day '{}'", token)))?;
                nums.push(idx);
            }
        }
    }

    nums.sort_unstable();
    nums.dedup();
    Ok(nums)
}

/// Seven-slot 0/1 mask for the given day numbers.
pub fn day_mask(nums: &[usize]) -> [u8; 7] {
    let mut mask = [0u8; 7];
    for &n in nums {
        if let Some(slot) = mask.get_mut(n) {
            *slot = 1;
        }
    }
    mask
}

/// Day abbreviations for the set slots of a mask.
pub fn num_to_days(mask: &[u8]) -> Vec<&'static str> {
    mask.iter()
        .zip(DAY_ABBREVIATIONS)
        .filter(|(set, _)| **set != 0)
        .map(|(_, day)| day)
        .collect()
}

/// Cron expression firing at `from` on the given days. `to` is only
/// validated; cron has no notion of an end time.
pub fn to_cron(days: &Value, from: &str, to: &str) -> Result<String> {
    let start = parse_time(from)
        .ok_or_else(|| FlowError::Validation(format!("invalid start time '{}'", from)))?;
    if parse_time(to).is_none() {
        return Err(FlowError::Validation(format!("invalid end time '{}'", to)));
    }

    let nums = days_to_num(days)?;
    let day_field = if nums.is_empty() {
        "*".to_string()
    } else {
        nums.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",")
    };

    Ok(format!(
        "{:02} {:02} * * {}",
        start.minute(),
        start.hour(),
        day_field
    ))
}
