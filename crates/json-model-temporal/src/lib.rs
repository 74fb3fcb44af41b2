//! `json-model-temporal`: the temporal codec consumed by `json-model`.
//!
//! Wire forms produced by [`IsoCodec`]:
//!
//! | kind     | form                          |
//! |----------|-------------------------------|
//! | datetime | `2023-10-27T10:30:00.000Z`    |
//! | date     | `2023-10-27`                  |
//! | time     | `10:30:00.000`                |
//! | duration | integer milliseconds          |
//!
//! Parsing is lenient: timestamps may be epoch seconds (int or float) and
//! durations may be written as `days=1,hours=2,minutes=3,seconds=4.250`.

pub mod codec;
pub mod duration;
pub mod error;

pub use codec::{IsoCodec, TemporalCodec, TemporalInput, DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};
pub use duration::parse_duration_str;
pub use error::TemporalError;
