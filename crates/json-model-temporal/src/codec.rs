//! The temporal codec seam and its ISO-8601 default.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crate::duration::parse_duration_str;
use crate::error::TemporalError;

/// Canonical datetime wire form (UTC, millisecond precision).
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.3f";

const DATETIME_PARSE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Borrowed view of anything a temporal field may be parsed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemporalInput<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(TimeDelta),
}

impl TemporalInput<'_> {
    fn describe(&self) -> String {
        match self {
            Self::Str(s) => format!("string '{s}'"),
            Self::Int(i) => format!("int {i}"),
            Self::Float(f) => format!("float {f}"),
            Self::DateTime(d) => format!("datetime {d}"),
            Self::Date(d) => format!("date {d}"),
            Self::Time(t) => format!("time {t}"),
            Self::Duration(d) => format!("duration {d}"),
        }
    }

    fn unparseable(&self, target: &'static str) -> TemporalError {
        TemporalError::Unparseable {
            target,
            input: self.describe(),
        }
    }
}

/// Parse and stringify temporal values.
///
/// Implementations must be pure: the engine calls them from any thread
/// and expects `parse(stringify(x)) == x` at the codec's precision.
pub trait TemporalCodec: Send + Sync {
    fn parse_datetime(&self, input: TemporalInput<'_>) -> Result<DateTime<Utc>, TemporalError>;
    fn parse_date(&self, input: TemporalInput<'_>) -> Result<NaiveDate, TemporalError>;
    fn parse_time(&self, input: TemporalInput<'_>) -> Result<NaiveTime, TemporalError>;
    fn parse_duration(&self, input: TemporalInput<'_>) -> Result<TimeDelta, TemporalError>;

    fn stringify_datetime(&self, value: &DateTime<Utc>) -> String;
    fn stringify_date(&self, value: &NaiveDate) -> String;
    fn stringify_time(&self, value: &NaiveTime) -> String;
    fn duration_to_millis(&self, value: &TimeDelta) -> i64;
}

/// ISO-8601 codec with epoch-second timestamps and millisecond durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoCodec;

impl IsoCodec {
    pub fn new() -> Self {
        Self
    }
}

fn from_epoch_seconds(secs: f64) -> Result<DateTime<Utc>, TemporalError> {
    let out_of_range = || TemporalError::OutOfRange(secs.to_string());
    if !secs.is_finite() {
        return Err(out_of_range());
    }
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(out_of_range());
    }
    DateTime::from_timestamp(whole as i64, nanos).ok_or_else(out_of_range)
}

fn from_epoch_int(secs: i64) -> Result<DateTime<Utc>, TemporalError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| TemporalError::OutOfRange(secs.to_string()))
}

fn parse_datetime_str(s: &str) -> Option<DateTime<Utc>> {
    DATETIME_PARSE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| d.with_timezone(&Utc))
        })
}

// Times without a date are anchored to 0001-01-01.
fn time_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl TemporalCodec for IsoCodec {
    fn parse_datetime(&self, input: TemporalInput<'_>) -> Result<DateTime<Utc>, TemporalError> {
        match input {
            TemporalInput::DateTime(d) => Ok(d),
            TemporalInput::Str(s) => {
                parse_datetime_str(s).ok_or_else(|| input.unparseable("datetime"))
            }
            TemporalInput::Int(i) => from_epoch_int(i),
            TemporalInput::Float(f) => from_epoch_seconds(f),
            TemporalInput::Date(d) => Ok(d.and_time(NaiveTime::MIN).and_utc()),
            TemporalInput::Time(t) => Ok(time_anchor().and_time(t).and_utc()),
            TemporalInput::Duration(_) => Err(input.unparseable("datetime")),
        }
    }

    fn parse_date(&self, input: TemporalInput<'_>) -> Result<NaiveDate, TemporalError> {
        match input {
            TemporalInput::Date(d) => Ok(d),
            TemporalInput::Str(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map_err(|_| input.unparseable("date")),
            TemporalInput::Int(i) => from_epoch_int(i).map(|d| d.date_naive()),
            TemporalInput::Float(f) => from_epoch_seconds(f).map(|d| d.date_naive()),
            TemporalInput::DateTime(d) => Ok(d.date_naive()),
            TemporalInput::Time(_) | TemporalInput::Duration(_) => Err(input.unparseable("date")),
        }
    }

    fn parse_time(&self, input: TemporalInput<'_>) -> Result<NaiveTime, TemporalError> {
        match input {
            TemporalInput::Time(t) => Ok(t),
            TemporalInput::Str(s) => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .map_err(|_| input.unparseable("time")),
            TemporalInput::Int(i) => from_epoch_int(i).map(|d| d.time()),
            TemporalInput::Float(f) => from_epoch_seconds(f).map(|d| d.time()),
            TemporalInput::DateTime(d) => Ok(d.time()),
            TemporalInput::Date(_) | TemporalInput::Duration(_) => Err(input.unparseable("time")),
        }
    }

    fn parse_duration(&self, input: TemporalInput<'_>) -> Result<TimeDelta, TemporalError> {
        match input {
            TemporalInput::Duration(d) => Ok(d),
            TemporalInput::Str(s) => parse_duration_str(s),
            TemporalInput::Int(millis) => TimeDelta::try_milliseconds(millis)
                .ok_or_else(|| TemporalError::OutOfRange(millis.to_string())),
            TemporalInput::Float(secs) => {
                let millis = secs * 1_000.0;
                if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
                    return Err(TemporalError::OutOfRange(secs.to_string()));
                }
                TimeDelta::try_milliseconds(millis.round() as i64)
                    .ok_or_else(|| TemporalError::OutOfRange(secs.to_string()))
            }
            _ => Err(input.unparseable("timedelta")),
        }
    }

    fn stringify_datetime(&self, value: &DateTime<Utc>) -> String {
        value.format(DATETIME_FORMAT).to_string()
    }

    fn stringify_date(&self, value: &NaiveDate) -> String {
        value.format(DATE_FORMAT).to_string()
    }

    fn stringify_time(&self, value: &NaiveTime) -> String {
        value.format(TIME_FORMAT).to_string()
    }

    fn duration_to_millis(&self, value: &TimeDelta) -> i64 {
        value.num_milliseconds()
    }
}
