use super::{Primitive, Shape, TemporalKind, TupleKind, TypeDescriptor};
use crate::error::ConversionError;
use crate::registry::Registry;
use crate::value::{JsonKind, Value};

impl TypeDescriptor {
    /// Parse `value`, then check the result structurally conforms to this
    /// descriptor. Idempotent on already-parsed values.
    pub fn validate(&self, value: &Value, registry: &Registry) -> Result<Value, ConversionError> {
        let parsed = self.parse_value(value, registry)?;
        if self.conforms(&parsed, registry) {
            Ok(parsed)
        } else {
            Err(ConversionError::new(
                self,
                format!(
                    "Schema mismatch: Expected type '{}', but got '{}' instead",
                    self,
                    parsed.shape_name()
                ),
            ))
        }
    }

    pub fn is_valid(&self, value: &Value, registry: &Registry) -> bool {
        self.validate(value, registry).is_ok()
    }

    /// Whether `value` already has exactly the shape this descriptor
    /// produces. No conversion is attempted.
    pub fn conforms(&self, value: &Value, registry: &Registry) -> bool {
        if self.ignored {
            return true;
        }
        let all = |child: &TypeDescriptor, items: &[Value]| items.iter().all(|v| child.conforms(v, registry));
        match (&self.shape, value) {
            (Shape::Primitive(p), v) => matches!(
                (p, v),
                (Primitive::Str, Value::Str(_))
                    | (Primitive::Int, Value::Int(_))
                    | (Primitive::Float, Value::Float(_))
                    | (Primitive::Bool, Value::Bool(_))
                    | (Primitive::None, Value::Null)
            ),
            (Shape::Optional, Value::Null) => true,
            (Shape::Optional, v) => self.children[0].conforms(v, registry),
            (Shape::Union, v) => self.children.iter().any(|c| c.conforms(v, registry)),
            (Shape::List, Value::List(items)) | (Shape::Set, Value::Set(items)) => all(&self.children[0], items),
            (Shape::Tuple(TupleKind::Variadic), Value::Tuple(items)) => all(&self.children[0], items),
            (Shape::Tuple(TupleKind::Fixed), Value::Tuple(items)) => {
                items.len() == self.children.len()
                    && self.children.iter().zip(items).all(|(c, v)| c.conforms(v, registry))
            }
            (Shape::Mapping, Value::Map(entries)) => entries.iter().all(|(k, v)| {
                self.children[0].conforms(k, registry) && self.children[1].conforms(v, registry)
            }),
            (Shape::EnumVariant(def), Value::Enum(e)) => e.enum_name == def.name(),
            (Shape::ByteBlob, Value::Bytes(_)) | (Shape::Pattern, Value::Pattern(_)) => true,
            (Shape::Temporal(kind), v) => matches!(
                (kind, v),
                (TemporalKind::Date, Value::Date(_))
                    | (TemporalKind::Time, Value::Time(_))
                    | (TemporalKind::DateTime, Value::DateTime(_))
                    | (TemporalKind::Duration, Value::Duration(_))
            ),
            (Shape::TypeValue, Value::Type(t)) => self
                .children
                .first()
                .map_or(true, |constraint| registry.type_satisfies(t, constraint)),
            (Shape::NestedRecord(name), Value::Record(r)) => registry.is_subtype(r.type_name(), name),
            (Shape::RawType(kind), Value::Json(j)) => kind.map_or(true, |k| JsonKind::of(j) == k),
            _ => false,
        }
    }
}
