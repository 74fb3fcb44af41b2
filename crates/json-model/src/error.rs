use std::fmt;

use thiserror::Error;

/// One step of the element path a [`ConversionError`] is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Key(k) => write!(f, "[{k:?}]"),
        }
    }
}

fn render_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let joined: String = path.iter().map(ToString::to_string).collect();
    format!("at ${joined}: ")
}

/// A type declaration that does not reduce to a supported shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaDefinitionError {
    #[error("Cannot define field with unsupported type '{type_expr}': {reason}")]
    UnsupportedType { type_expr: String, reason: String },

    #[error("Invalid {shape} definition: expected {expected} type parameter(s), found {found}")]
    Arity {
        shape: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("Mapping keys must be string-compatible; found '{key}'")]
    NonStringKey { key: String },

    #[error("Invalid enum '{name}': {reason}")]
    InvalidEnum { name: String, reason: String },

    #[error("Type '{0}' is already registered")]
    DuplicateType(String),

    #[error("Record '{record}' extends unknown record '{parent}'")]
    UnknownParent { record: String, parent: String },

    #[error("Record '{record}' overrides the default of unknown field '{field}'")]
    UnknownField { record: String, field: String },

    #[error("Invalid field '{field}' on '{record}': {source}")]
    InField {
        record: String,
        field: String,
        source: Box<SchemaDefinitionError>,
    },
}

impl SchemaDefinitionError {
    pub(crate) fn in_field(self, record: &str, field: &str) -> Self {
        Self::InField {
            record: record.to_string(),
            field: field.to_string(),
            source: Box::new(self),
        }
    }
}

/// A parse, validate or dump failure for one value.
///
/// `expected` is the rendered descriptor (e.g. `dict[int, bool]`) and
/// `path` locates the offending element inside the field's value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}{message}", render_path(.path))]
pub struct ConversionError {
    pub expected: String,
    pub message: String,
    pub path: Vec<PathSegment>,
}

impl ConversionError {
    pub fn new(expected: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            expected: expected.to_string(),
            message: message.into(),
            path: Vec::new(),
        }
    }

    /// Attribute the error to an element one level further out.
    pub fn at(mut self, segment: PathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }
}

/// Record-level construction and dump failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Model error on key '{field}' of '{record}': {source}")]
    Field {
        record: String,
        field: String,
        source: ConversionError,
    },

    #[error("Missing required key '{field}' on '{record}'")]
    MissingField { record: String, field: String },

    #[error("The following keys are not found in the model for '{record}': {}", .keys.join(","))]
    UnexpectedFields { record: String, keys: Vec<String> },

    #[error("Unknown record type '{0}'")]
    UnknownRecord(String),

    #[error("Expected a JSON object to build '{record}', got {found}")]
    NotAnObject { record: String, found: String },
}

/// Discriminator-driven subtype lookup failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtypeResolutionError {
    #[error("Unable to find suitable subtype of '{base}' matching the discriminator {discriminator}")]
    NoMatch { base: String, discriminator: String },

    #[error("Object is missing discriminator field '{key}'; cannot determine which subtype of '{base}' to instantiate")]
    MissingDiscriminator { base: String, key: String },

    #[error("Unknown base record type '{0}'")]
    UnknownBase(String),
}

/// Failure of a JSON entry point that may resolve polymorphism.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Subtype(#[from] SubtypeResolutionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_error_renders_path() {
        let err = ConversionError::new("int", "bad value")
            .at(PathSegment::Index(2))
            .at(PathSegment::Key("items".into()));
        assert_eq!(err.path.len(), 2);
        assert_eq!(err.to_string(), "at $[\"items\"][2]: bad value");
        assert_eq!(ConversionError::new("int", "plain").to_string(), "plain");
    }

    #[test]
    fn record_error_lists_keys() {
        let err = RecordError::UnexpectedFields {
            record: "Simple".into(),
            keys: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            err.to_string(),
            "The following keys are not found in the model for 'Simple': a,b"
        );
    }
}
