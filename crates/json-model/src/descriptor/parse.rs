//! Raw or typed value → typed value, dispatched on shape.

use json_model_temporal::TemporalInput;

use super::{blob, Primitive, Shape, TemporalKind, TupleKind, TypeDescriptor};
use crate::attempt::try_in_order;
use crate::error::{ConversionError, PathSegment};
use crate::registry::Registry;
use crate::value::{Pattern, Value};

impl TypeDescriptor {
    /// Convert `raw` into a value of this descriptor's type.
    ///
    /// Already-typed values of the right shape pass through unchanged, so
    /// parsing is idempotent. On failure the alternates are tried in
    /// declared order; the first that parses and transforms wins.
    pub fn parse_value(&self, raw: &Value, registry: &Registry) -> Result<Value, ConversionError> {
        if self.ignored {
            return Ok(self.zero_value());
        }
        let primary = match self.parse_shape(raw, registry) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        if self.alternates.is_empty() {
            return Err(primary);
        }
        tracing::trace!(expected = %self, found = %raw.type_name(), "primary parse failed, trying alternates");
        try_in_order(&self.alternates, |alt| alt.convert(raw, registry)).map_err(|_| {
            let names: Vec<String> = self
                .alternates
                .iter()
                .map(|a| a.descriptor().to_string())
                .collect();
            ConversionError::new(
                self,
                format!(
                    "Unable to parse value of type '{}' as '{}' ({} alternate{} also failed: {})",
                    raw.type_name(),
                    self,
                    names.len(),
                    if names.len() == 1 { "" } else { "s" },
                    names.join(", ")
                ),
            )
        })
    }

    fn mismatch(&self, raw: &Value) -> ConversionError {
        ConversionError::new(
            self,
            format!(
                "Unable to parse value of type '{}' into an object of type '{}'",
                raw.shape_name(),
                self
            ),
        )
    }

    fn parse_shape(&self, raw: &Value, registry: &Registry) -> Result<Value, ConversionError> {
        match &self.shape {
            Shape::Primitive(p) => parse_primitive(*p, raw).ok_or_else(|| self.mismatch(raw)),

            Shape::Optional => match raw {
                Value::Null => Ok(Value::Null),
                _ => self.children[0].parse_value(raw, registry),
            },

            Shape::Union => try_in_order(&self.children, |c| c.parse_value(raw, registry)).map_err(|_| {
                ConversionError::new(
                    self,
                    format!(
                        "Given value of type '{}' does not meet any of the allowed types: {}",
                        raw.type_name(),
                        super::join(&self.children)
                    ),
                )
            }),

            Shape::List => {
                let items = raw.as_items().ok_or_else(|| {
                    ConversionError::new(
                        self,
                        format!("Given value of type '{}' is not iterable; cannot parse as a list", raw.type_name()),
                    )
                })?;
                self.parse_items(&self.children[0], items, registry).map(Value::List)
            }

            Shape::Set => {
                let items = raw.as_items().ok_or_else(|| {
                    ConversionError::new(
                        self,
                        format!("Given value of type '{}' is not iterable; cannot parse as a set", raw.type_name()),
                    )
                })?;
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for value in self.parse_items(&self.children[0], items, registry)? {
                    if !unique.contains(&value) {
                        unique.push(value);
                    }
                }
                Ok(Value::Set(unique))
            }

            Shape::Tuple(kind) => self.parse_tuple(*kind, raw, registry),

            Shape::Mapping => self.parse_mapping(raw, registry),

            Shape::EnumVariant(def) => def
                .parse(raw)
                .map(Value::Enum)
                .map_err(|message| ConversionError::new(self, message)),

            Shape::ByteBlob => blob::parse_bytes(raw)
                .map(Value::Bytes)
                .map_err(|message| ConversionError::new(self, message)),

            Shape::Pattern => match raw {
                Value::Pattern(p) => Ok(Value::Pattern(p.clone())),
                Value::Str(s) => Pattern::new(s).map(Value::Pattern).map_err(|e| {
                    ConversionError::new(self, format!("Invalid regular expression '{s}': {e}"))
                }),
                _ => Err(ConversionError::new(
                    self,
                    format!(
                        "Unable to parse value of type '{}' as a regular expression",
                        raw.type_name()
                    ),
                )),
            },

            Shape::Temporal(kind) => self.parse_temporal(*kind, raw, registry),

            Shape::TypeValue => self.parse_type_value(raw, registry),

            Shape::NestedRecord(name) => registry
                .parse_nested(name, raw)
                .map_err(|message| ConversionError::new(self, message)),

            Shape::RawType(kind) => {
                let json = raw.to_json().ok_or_else(|| self.mismatch(raw))?;
                match kind {
                    Some(k) if crate::value::JsonKind::of(&json) != *k => Err(self.mismatch(raw)),
                    _ => Ok(Value::Json(json)),
                }
            }
        }
    }

    fn parse_items(
        &self,
        child: &TypeDescriptor,
        items: &[Value],
        registry: &Registry,
    ) -> Result<Vec<Value>, ConversionError> {
        items
            .iter()
            .enumerate()
            .map(|(i, v)| child.parse_value(v, registry).map_err(|e| e.at(PathSegment::Index(i))))
            .collect()
    }

    fn parse_tuple(&self, kind: TupleKind, raw: &Value, registry: &Registry) -> Result<Value, ConversionError> {
        let items = match raw {
            Value::List(items) | Value::Tuple(items) => items,
            _ => {
                return Err(ConversionError::new(
                    self,
                    format!(
                        "Given value of type '{}' is not an ordered collection; cannot parse as a tuple",
                        raw.type_name()
                    ),
                ))
            }
        };
        match kind {
            TupleKind::Variadic => self.parse_items(&self.children[0], items, registry).map(Value::Tuple),
            TupleKind::Fixed => {
                if items.len() != self.children.len() {
                    return Err(ConversionError::new(
                        self,
                        format!(
                            "Given value of type '{}' has the wrong number of elements to be parsed as a '{}'; has ({})",
                            raw.type_name(),
                            self,
                            items.len()
                        ),
                    ));
                }
                self.children
                    .iter()
                    .zip(items)
                    .enumerate()
                    .map(|(i, (child, v))| {
                        child.parse_value(v, registry).map_err(|e| e.at(PathSegment::Index(i)))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Tuple)
            }
        }
    }

    fn parse_mapping(&self, raw: &Value, registry: &Registry) -> Result<Value, ConversionError> {
        let not_a_mapping = || {
            ConversionError::new(
                self,
                format!(
                    "Given value of type '{}' could not be parsed as a dictionary",
                    raw.type_name()
                ),
            )
        };
        let pairs: Vec<(&Value, &Value)> = match raw {
            Value::Map(entries) => entries.iter().map(|(k, v)| (k, v)).collect(),
            Value::List(items) | Value::Tuple(items) => items
                .iter()
                .map(|item| match item.as_items() {
                    Some([k, v]) if !matches!(item, Value::Set(_)) => Some((k, v)),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .ok_or_else(not_a_mapping)?,
            _ => return Err(not_a_mapping()),
        };

        let (key_type, value_type) = (&self.children[0], &self.children[1]);
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let segment = PathSegment::Key(k.as_str().map_or_else(|| k.type_name(), str::to_string));
            let key = if key_type.is_string_key() {
                k.clone()
            } else {
                parse_key(key_type, k, registry).map_err(|e| e.at(segment.clone()))?
            };
            let value = value_type
                .parse_value(v, registry)
                .map_err(|e| e.at(segment))?;
            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Ok(Value::Map(entries))
    }

    fn parse_temporal(&self, kind: TemporalKind, raw: &Value, registry: &Registry) -> Result<Value, ConversionError> {
        let input = match raw {
            Value::Str(s) => TemporalInput::Str(s),
            Value::Int(i) => TemporalInput::Int(*i),
            Value::Float(f) => TemporalInput::Float(*f),
            Value::DateTime(d) => TemporalInput::DateTime(*d),
            Value::Date(d) => TemporalInput::Date(*d),
            Value::Time(t) => TemporalInput::Time(*t),
            Value::Duration(d) => TemporalInput::Duration(*d),
            _ => return Err(self.mismatch(raw)),
        };
        let codec = registry.codec();
        let parsed = match kind {
            TemporalKind::DateTime => codec.parse_datetime(input).map(Value::DateTime),
            TemporalKind::Date => codec.parse_date(input).map(Value::Date),
            TemporalKind::Time => codec.parse_time(input).map(Value::Time),
            TemporalKind::Duration => codec.parse_duration(input).map(Value::Duration),
        };
        parsed.map_err(|e| ConversionError::new(self, e.to_string()))
    }

    fn parse_type_value(&self, raw: &Value, registry: &Registry) -> Result<Value, ConversionError> {
        let resolved = match raw {
            Value::Type(t) => t.clone(),
            Value::Str(s) => registry.resolve_type_name(s).ok_or_else(|| {
                ConversionError::new(
                    self,
                    format!("Unable to parse string value '{s}' as a type; type is not found"),
                )
            })?,
            _ => {
                return Err(ConversionError::new(
                    self,
                    format!(
                        "Given value of type '{}' could not be interpreted as a type",
                        raw.type_name()
                    ),
                ))
            }
        };
        if let Some(constraint) = self.children.first() {
            if !registry.type_satisfies(&resolved, constraint) {
                return Err(ConversionError::new(
                    self,
                    format!("Type '{}' is not a '{}'", resolved.name, constraint),
                ));
            }
        }
        Ok(Value::Type(resolved))
    }
}

fn parse_primitive(p: Primitive, raw: &Value) -> Option<Value> {
    match (p, raw) {
        (Primitive::Str, Value::Str(_))
        | (Primitive::Int, Value::Int(_))
        | (Primitive::Float, Value::Float(_))
        | (Primitive::Bool, Value::Bool(_))
        | (Primitive::None, Value::Null) => Some(raw.clone()),
        (Primitive::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
        _ => None,
    }
}

/// Keys of non-string mappings arrive serialized as strings; try the key
/// as given first, then its JSON decoding.
fn parse_key(key_type: &TypeDescriptor, key: &Value, registry: &Registry) -> Result<Value, ConversionError> {
    let direct = match key_type.parse_value(key, registry) {
        Ok(parsed) => return Ok(parsed),
        Err(e) => e,
    };
    let Value::Str(text) = key else {
        return Err(direct);
    };
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(decoded) => key_type
            .parse_value(&Value::from(decoded), registry)
            .map_err(|_| direct),
        Err(_) => Err(direct),
    }
}
