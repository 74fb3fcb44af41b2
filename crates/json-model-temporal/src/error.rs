use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemporalError {
    #[error("Unable to smart-parse {input} into a {target}")]
    Unparseable { target: &'static str, input: String },

    #[error("Timestamp {0} is out of range")]
    OutOfRange(String),

    #[error("Unable to parse duration string '{0}'; format is invalid")]
    InvalidDuration(String),
}
