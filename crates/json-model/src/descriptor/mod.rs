//! Type descriptors: the closed set of value shapes a field may take.
//!
//! A [`TypeDescriptor`] is a `shape` tag plus an ordered list of child
//! descriptors whose arity is fixed by the shape:
//!
//! | shape              | children            |
//! |--------------------|---------------------|
//! | `Primitive`        | 0                   |
//! | `List`, `Set`      | 1 (element)         |
//! | `Tuple(Fixed)`     | one per position    |
//! | `Tuple(Variadic)`  | 1 (element)         |
//! | `Mapping`          | 2 (key, value)      |
//! | `Optional`         | 1                   |
//! | `Union`            | 1 or more           |
//! | `TypeValue`        | 0 or 1 (constraint) |
//! | everything else    | 0                   |
//!
//! Descriptors are immutable once built and shared read-only by every
//! instance of the owning record schema.

pub mod alternate;
pub mod blob;
pub mod builder;
mod conform;
mod dump;
pub mod expr;
mod parse;

use std::fmt;
use std::sync::Arc;

use chrono::TimeDelta;

pub use alternate::AlternateConversion;
pub use builder::TypeBuilder;

use crate::error::SchemaDefinitionError;
use crate::registry::Registry;
use crate::value::{EnumDef, JsonKind, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Str,
    Int,
    Float,
    Bool,
    None,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
    Duration,
}

impl TemporalKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Duration => "timedelta",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleKind {
    Fixed,
    Variadic,
}

#[derive(Debug, Clone)]
pub enum Shape {
    Primitive(Primitive),
    List,
    Set,
    Tuple(TupleKind),
    Mapping,
    Optional,
    Union,
    EnumVariant(Arc<EnumDef>),
    ByteBlob,
    Pattern,
    Temporal(TemporalKind),
    TypeValue,
    /// A nested record, by registered name. The name may be the base of a
    /// polymorphic family.
    NestedRecord(String),
    /// Raw JSON passthrough, optionally restricted to one JSON kind.
    RawType(Option<JsonKind>),
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::List => "list",
            Self::Set => "set",
            Self::Tuple(TupleKind::Fixed) => "tuple",
            Self::Tuple(TupleKind::Variadic) => "variadic tuple",
            Self::Mapping => "dict",
            Self::Optional => "Optional",
            Self::Union => "Union",
            Self::EnumVariant(_) => "enum",
            Self::ByteBlob => "bytes",
            Self::Pattern => "Pattern",
            Self::Temporal(_) => "temporal",
            Self::TypeValue => "type",
            Self::NestedRecord(_) => "record",
            Self::RawType(_) => "Any",
        }
    }
}

/// A fixed default or a factory invoked afresh for every instance.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn factory(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self::Factory(Arc::new(f))
    }

    pub fn resolve(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Describes one expected value shape, recursively.
#[derive(Clone)]
pub struct TypeDescriptor {
    shape: Shape,
    children: Vec<TypeDescriptor>,
    default: Option<DefaultValue>,
    alternates: Vec<AlternateConversion>,
    ignored: bool,
}

impl TypeDescriptor {
    /// Build a descriptor, checking the children arity for `shape`.
    pub fn new(shape: Shape, children: Vec<TypeDescriptor>) -> Result<Self, SchemaDefinitionError> {
        let descriptor = Self::from_parts(shape, children);
        descriptor.check_arity()?;
        Ok(descriptor)
    }

    pub(crate) fn from_parts(shape: Shape, children: Vec<TypeDescriptor>) -> Self {
        Self {
            shape,
            children,
            default: None,
            alternates: Vec::new(),
            ignored: false,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(default.into()));
        self
    }

    pub fn with_default_factory(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::factory(f));
        self
    }

    pub fn with_alternate(mut self, alternate: AlternateConversion) -> Self {
        self.alternates.push(alternate);
        self
    }

    /// Mark the field as ignored: it never fails, always holds the
    /// shape's zero value and is never dumped.
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub(crate) fn replace_default(&self, default: DefaultValue) -> Self {
        let mut next = self.clone();
        next.default = Some(default);
        next
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn children(&self) -> &[TypeDescriptor] {
        &self.children
    }

    pub fn alternates(&self) -> &[AlternateConversion] {
        &self.alternates
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Ignored descriptors carry an implicit zero-value default.
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.ignored
    }

    /// A fresh default value; factories are invoked on every call.
    pub fn default_value(&self) -> Option<Value> {
        match &self.default {
            Some(d) => Some(d.resolve()),
            None if self.ignored => Some(self.zero_value()),
            None => None,
        }
    }

    /// The value an ignored field holds.
    pub fn zero_value(&self) -> Value {
        match &self.shape {
            Shape::Primitive(Primitive::Str) => Value::Str(String::new()),
            Shape::Primitive(Primitive::Int) => Value::Int(0),
            Shape::Primitive(Primitive::Float) => Value::Float(0.0),
            Shape::Primitive(Primitive::Bool) => Value::Bool(false),
            Shape::List => Value::List(Vec::new()),
            Shape::Set => Value::Set(Vec::new()),
            Shape::Tuple(TupleKind::Variadic) => Value::Tuple(Vec::new()),
            Shape::Mapping => Value::Map(Vec::new()),
            Shape::ByteBlob => Value::Bytes(Vec::new()),
            Shape::Temporal(TemporalKind::Duration) => Value::Duration(TimeDelta::zero()),
            _ => Value::Null,
        }
    }

    pub(crate) fn is_string_key(&self) -> bool {
        matches!(self.shape, Shape::Primitive(Primitive::Str))
    }

    fn check_arity(&self) -> Result<(), SchemaDefinitionError> {
        let found = self.children.len();
        let (ok, expected) = match &self.shape {
            Shape::List | Shape::Set | Shape::Optional | Shape::Tuple(TupleKind::Variadic) => {
                (found == 1, "1")
            }
            Shape::Mapping => (found == 2, "2"),
            Shape::Union => (found >= 1, "at least 1"),
            Shape::TypeValue => (found <= 1, "0 or 1"),
            Shape::Tuple(TupleKind::Fixed) => (true, "any"),
            _ => (found == 0, "0"),
        };
        if ok {
            Ok(())
        } else {
            Err(SchemaDefinitionError::Arity {
                shape: self.shape.name(),
                expected,
                found,
            })
        }
    }

    /// Keys of a mapping must dump to a JSON scalar.
    fn is_string_compatible(&self) -> bool {
        match &self.shape {
            Shape::Primitive(p) => *p != Primitive::None,
            Shape::EnumVariant(_) | Shape::Temporal(_) | Shape::TypeValue | Shape::Pattern => true,
            Shape::Union => self.children.iter().all(TypeDescriptor::is_string_compatible),
            _ => false,
        }
    }

    /// Recursively check arity, mapping keys, enum declarations and
    /// nested record names.
    ///
    /// A nested record must already be registered or be `self_name`, the
    /// record being declared.
    pub fn check_definition(
        &self,
        registry: &Registry,
        self_name: Option<&str>,
    ) -> Result<(), SchemaDefinitionError> {
        self.check_arity()?;
        match &self.shape {
            Shape::Mapping if !self.children[0].is_string_compatible() => {
                return Err(SchemaDefinitionError::NonStringKey {
                    key: self.children[0].to_string(),
                });
            }
            Shape::EnumVariant(def) => def.check()?,
            Shape::NestedRecord(name)
                if self_name != Some(name.as_str()) && registry.schema(name).is_none() =>
            {
                return Err(SchemaDefinitionError::UnsupportedType {
                    type_expr: name.clone(),
                    reason: format!("unknown record type '{name}'"),
                });
            }
            _ => {}
        }
        for child in &self.children {
            child.check_definition(registry, self_name)?;
        }
        for alternate in &self.alternates {
            alternate.descriptor().check_definition(registry, self_name)?;
        }
        Ok(())
    }
}

fn join(children: &[TypeDescriptor]) -> String {
    children
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the descriptor as a type annotation, e.g. `dict[int, list[str]]`.
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.children;
        match &self.shape {
            Shape::Primitive(p) => f.write_str(p.name()),
            Shape::List => write!(f, "list[{}]", join(c)),
            Shape::Set => write!(f, "set[{}]", join(c)),
            Shape::Tuple(TupleKind::Fixed) if c.is_empty() => f.write_str("tuple[()]"),
            Shape::Tuple(TupleKind::Fixed) => write!(f, "tuple[{}]", join(c)),
            Shape::Tuple(TupleKind::Variadic) => write!(f, "tuple[{}, ...]", join(c)),
            Shape::Mapping => write!(f, "dict[{}]", join(c)),
            Shape::Optional => write!(f, "Optional[{}]", join(c)),
            Shape::Union => write!(f, "Union[{}]", join(c)),
            Shape::EnumVariant(def) => f.write_str(def.name()),
            Shape::ByteBlob => f.write_str("bytes"),
            Shape::Pattern => f.write_str("Pattern"),
            Shape::Temporal(k) => f.write_str(k.name()),
            Shape::TypeValue if c.is_empty() => f.write_str("type"),
            Shape::TypeValue => write!(f, "type[{}]", join(c)),
            Shape::NestedRecord(name) => f.write_str(name),
            Shape::RawType(None) => f.write_str("Any"),
            Shape::RawType(Some(kind)) => write!(f, "Any[{kind}]"),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("TypeDescriptor");
        d.field("type", &format_args!("{self}"));
        if let Some(default) = &self.default {
            d.field("default", default);
        }
        if !self.alternates.is_empty() {
            d.field("alternates", &self.alternates.len());
        }
        if self.ignored {
            d.field("ignored", &true);
        }
        d.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> TypeBuilder {
        TypeBuilder::new()
    }

    #[test]
    fn display_renders_annotations() {
        assert_eq!(t().dict(t().int(), t().list(t().str())).to_string(), "dict[int, list[str]]");
        assert_eq!(t().tuple_of(t().int()).to_string(), "tuple[int, ...]");
        assert_eq!(t().tuple(vec![]).to_string(), "tuple[()]");
        assert_eq!(t().optional(t().float()).to_string(), "Optional[float]");
        assert_eq!(t().union(vec![t().str(), t().int()]).to_string(), "Union[str, int]");
    }

    #[test]
    fn new_checks_arity() {
        assert!(TypeDescriptor::new(Shape::Mapping, vec![t().str()]).is_err());
        assert!(TypeDescriptor::new(Shape::Optional, vec![]).is_err());
        assert!(TypeDescriptor::new(Shape::Union, vec![]).is_err());
        assert!(TypeDescriptor::new(Shape::Primitive(Primitive::Int), vec![t().int()]).is_err());
        assert!(TypeDescriptor::new(Shape::Tuple(TupleKind::Fixed), vec![t().int(), t().str()]).is_ok());
    }

    #[test]
    fn mapping_keys_must_be_string_compatible() {
        let reg = Registry::new();
        assert!(t().dict(t().int(), t().bool()).check_definition(&reg, None).is_ok());
        let err = t()
            .dict(t().list(t().int()), t().bool())
            .check_definition(&reg, None)
            .unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::NonStringKey { .. }));
    }

    #[test]
    fn default_factory_runs_each_time() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let d = t().list(t().int()).with_default_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::List(Vec::new())
        });
        assert_eq!(d.default_value(), Some(Value::List(vec![])));
        assert_eq!(d.default_value(), Some(Value::List(vec![])));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn ignored_fields_default_to_zero() {
        let d = t().int().ignored();
        assert!(d.has_default());
        assert_eq!(d.default_value(), Some(Value::Int(0)));
    }
}
