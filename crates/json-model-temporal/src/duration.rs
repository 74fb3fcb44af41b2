//! Structured duration grammar: `days=D,hours=H,minutes=M,seconds=S[.F]`.
//!
//! Every component except `seconds` is optional, but the ones present
//! must appear in that order. `F` is a whole number of milliseconds, so
//! `seconds=4.5` is 4005 ms.

use std::sync::OnceLock;

use chrono::TimeDelta;
use regex::Regex;

use crate::error::TemporalError;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(days=(?P<d>\d+),)?(hours=(?P<h>\d+),)?(minutes=(?P<m>\d+),)?seconds=(?P<s>\d+)(\.(?P<f>\d+))?$",
        )
        .expect("duration pattern is a valid regex")
    })
}

/// Parse a duration string written in the structured grammar.
pub fn parse_duration_str(input: &str) -> Result<TimeDelta, TemporalError> {
    let invalid = || TemporalError::InvalidDuration(input.to_string());
    let caps = pattern().captures(input).ok_or_else(invalid)?;

    let component = |name: &str| -> Result<i64, TemporalError> {
        match caps.name(name) {
            Some(m) => m.as_str().parse::<i64>().map_err(|_| invalid()),
            None => Ok(0),
        }
    };

    let (days, hours, minutes, seconds, millis) = (
        component("d")?,
        component("h")?,
        component("m")?,
        component("s")?,
        component("f")?,
    );

    let total = days
        .checked_mul(86_400_000)
        .and_then(|t| t.checked_add(hours.checked_mul(3_600_000)?))
        .and_then(|t| t.checked_add(minutes.checked_mul(60_000)?))
        .and_then(|t| t.checked_add(seconds.checked_mul(1_000)?))
        .and_then(|t| t.checked_add(millis))
        .ok_or_else(invalid)?;

    TimeDelta::try_milliseconds(total).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_grammar() {
        let d = parse_duration_str("days=1,hours=2,minutes=3,seconds=4").unwrap();
        assert_eq!(d.num_milliseconds(), 93_784_000);
    }

    #[test]
    fn fraction_counts_milliseconds() {
        let ms = |s: &str| parse_duration_str(s).unwrap().num_milliseconds();
        assert_eq!(ms("seconds=4.5"), 4_005);
        assert_eq!(ms("seconds=4.05"), 4_005);
        assert_eq!(ms("seconds=4.250"), 4_250);
        assert_eq!(ms("minutes=1,seconds=0.1500"), 61_500);
    }

    #[test]
    fn skipped_components_are_allowed() {
        let d = parse_duration_str("hours=1,seconds=0").unwrap();
        assert_eq!(d.num_milliseconds(), 3_600_000);
    }

    #[test]
    fn rejects_out_of_order_or_missing_seconds() {
        assert!(parse_duration_str("hours=1").is_err());
        assert!(parse_duration_str("minutes=1,hours=2,seconds=3").is_err());
        assert!(parse_duration_str("not a timedelta").is_err());
        assert!(parse_duration_str("").is_err());
    }
}
