//! Typed value → JSON value, the inverse of parsing.

use serde_json::Value as JsonValue;

use super::{blob, Primitive, Shape, TemporalKind, TupleKind, TypeDescriptor};
use crate::attempt::try_in_order;
use crate::error::{ConversionError, PathSegment};
use crate::registry::Registry;
use crate::value::Value;

impl TypeDescriptor {
    /// Convert a typed value into its JSON wire form.
    ///
    /// Values are not validated first. When the primary dump fails, the
    /// alternates' jsonifiers are tried in declared order.
    pub fn dump_value(&self, value: &Value, registry: &Registry) -> Result<JsonValue, ConversionError> {
        if self.ignored {
            return Ok(JsonValue::Null);
        }
        let primary = match self.dump_shape(value, registry) {
            Ok(json) => return Ok(json),
            Err(e) => e,
        };
        let jsonifiers: Vec<_> = self.alternates.iter().filter_map(|a| a.jsonifier()).collect();
        if jsonifiers.is_empty() {
            return Err(primary);
        }
        tracing::trace!(expected = %self, found = %value.type_name(), "primary dump failed, trying jsonifiers");
        try_in_order(jsonifiers, |jsonify| jsonify(value)).map_err(|_| primary)
    }

    fn cannot_dump(&self, value: &Value) -> ConversionError {
        ConversionError::new(
            self,
            format!(
                "Unable to dump value of type '{}' as '{}'",
                value.shape_name(),
                self
            ),
        )
    }

    fn dump_shape(&self, value: &Value, registry: &Registry) -> Result<JsonValue, ConversionError> {
        match (&self.shape, value) {
            (Shape::Optional, Value::Null) => Ok(JsonValue::Null),
            (Shape::Optional, v) => self.children[0].dump_value(v, registry),
            (Shape::Union, v) => {
                if let Some(child) = self.children.iter().find(|c| c.conforms(v, registry)) {
                    return child.dump_value(v, registry);
                }
                try_in_order(&self.children, |c| c.dump_value(v, registry)).map_err(|_| self.cannot_dump(v))
            }

            (Shape::Primitive(p), v) => {
                let ok = matches!(
                    (p, v),
                    (Primitive::Str, Value::Str(_))
                        | (Primitive::Int, Value::Int(_))
                        | (Primitive::Float, Value::Float(_) | Value::Int(_))
                        | (Primitive::Bool, Value::Bool(_))
                        | (Primitive::None, Value::Null)
                );
                if !ok {
                    return Err(self.cannot_dump(v));
                }
                v.to_json().ok_or_else(|| {
                    ConversionError::new(self, format!("Value {v:?} has no JSON representation"))
                })
            }

            (Shape::List, Value::List(items))
            | (Shape::Set, Value::Set(items))
            | (Shape::Tuple(_), Value::Tuple(items)) => {
                let fixed = matches!(self.shape, Shape::Tuple(TupleKind::Fixed));
                if fixed && items.len() != self.children.len() {
                    return Err(self.cannot_dump(value));
                }
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let child = if fixed { &self.children[i] } else { &self.children[0] };
                        child
                            .dump_value(v, registry)
                            .map_err(|e| e.at(PathSegment::Index(i)))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(JsonValue::Array)
            }

            (Shape::Mapping, Value::Map(entries)) => {
                let mut out = serde_json::Map::with_capacity(entries.len());
                for (k, v) in entries {
                    let key_json = self.children[0].dump_value(k, registry)?;
                    let key = match key_json {
                        JsonValue::String(s) => s,
                        other => other.to_string(),
                    };
                    let dumped = self.children[1]
                        .dump_value(v, registry)
                        .map_err(|e| e.at(PathSegment::Key(key.clone())))?;
                    out.insert(key, dumped);
                }
                Ok(JsonValue::Object(out))
            }

            (Shape::EnumVariant(def), Value::Enum(e)) if e.enum_name == def.name() => Ok(def.dump(e)),

            (Shape::ByteBlob, Value::Bytes(b)) => Ok(JsonValue::String(blob::encode_base64(b))),

            (Shape::Pattern, Value::Pattern(p)) => Ok(JsonValue::String(p.as_str().to_string())),

            (Shape::Temporal(kind), v) => {
                let codec = registry.codec();
                match (kind, v) {
                    (TemporalKind::DateTime, Value::DateTime(d)) => Ok(codec.stringify_datetime(d).into()),
                    (TemporalKind::Date, Value::Date(d)) => Ok(codec.stringify_date(d).into()),
                    (TemporalKind::Time, Value::Time(t)) => Ok(codec.stringify_time(t).into()),
                    (TemporalKind::Duration, Value::Duration(d)) => Ok(codec.duration_to_millis(d).into()),
                    _ => Err(self.cannot_dump(v)),
                }
            }

            (Shape::TypeValue, Value::Type(t)) => Ok(JsonValue::String(t.name.clone())),

            (Shape::NestedRecord(name), Value::Record(r)) if registry.is_subtype(r.type_name(), name) => r
                .to_json(registry)
                .map_err(|e| ConversionError::new(self, e.to_string())),

            (Shape::RawType(_), v) => v.to_json().ok_or_else(|| self.cannot_dump(v)),

            (_, v) => Err(self.cannot_dump(v)),
        }
    }
}
