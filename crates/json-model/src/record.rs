//! Constructed, validated record values.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::RecordError;
use crate::registry::Registry;
use crate::schema::RecordSchema;
use crate::value::Value;

/// A value of a registered record type.
///
/// Only obtainable through [`RecordInstance::construct`] (or the registry
/// entry points built on it), so every instance holds exactly its
/// schema's fields, each validated against its descriptor.
#[derive(Clone)]
pub struct RecordInstance {
    schema: Arc<RecordSchema>,
    fields: IndexMap<String, Value>,
}

impl RecordInstance {
    /// Build an instance from keyed values.
    ///
    /// Absent fields take their default (factories run afresh), `null` when
    /// the field is `Optional`, or fail as missing. Every value, defaults included, is validated. Leftover keys
    /// fail unless `ignore_extra` is set or they are reserved for the
    /// record (`_`-prefixed or excluded).
    pub fn construct<I, K>(
        registry: &Registry,
        schema: Arc<RecordSchema>,
        values: I,
        ignore_extra: bool,
    ) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut remaining: IndexMap<String, Value> =
            values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let mut fields = IndexMap::with_capacity(schema.fields().count());

        for field in schema.fields() {
            let raw = match remaining.shift_remove(&field.name) {
                Some(v) => v,
                None => match field.descriptor.default_value() {
                    Some(default) => default,
                    None if field.is_nullable() => Value::Null,
                    None => {
                        return Err(RecordError::MissingField {
                            record: schema.name().to_string(),
                            field: field.name.clone(),
                        })
                    }
                },
            };
            let value = field
                .descriptor
                .validate(&raw, registry)
                .map_err(|source| RecordError::Field {
                    record: schema.name().to_string(),
                    field: field.name.clone(),
                    source,
                })?;
            fields.insert(field.name.clone(), value);
        }

        if !ignore_extra {
            let options = schema.options();
            let extra: Vec<String> = remaining
                .into_keys()
                .filter(|k| !options.is_reserved(k))
                .collect();
            if !extra.is_empty() {
                return Err(RecordError::UnexpectedFields {
                    record: schema.name().to_string(),
                    keys: extra,
                });
            }
        }

        Ok(Self { schema, fields })
    }

    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_fields(self) -> IndexMap<String, Value> {
        self.fields
    }

    /// Dump to a JSON object.
    ///
    /// The discriminator comes first when the record includes it. Ignored
    /// fields are skipped, as are fields equal to their default and fields
    /// dumping to `null`, unless the record opts into keeping them.
    pub fn to_json(&self, registry: &Registry) -> Result<JsonValue, RecordError> {
        let schema = &self.schema;
        let options = schema.options();
        let mut out = serde_json::Map::new();
        if options.include_name_in_output {
            out.insert(options.name_field.clone(), schema.identity().clone());
        }

        for field in schema.fields() {
            let descriptor = &field.descriptor;
            if descriptor.is_ignored() {
                continue;
            }
            let Some(value) = self.fields.get(&field.name) else {
                continue;
            };
            if !options.include_defaults_in_output {
                let is_default = descriptor
                    .default_value()
                    .and_then(|d| descriptor.validate(&d, registry).ok())
                    .is_some_and(|d| &d == value);
                if is_default {
                    continue;
                }
            }
            let dumped = descriptor
                .dump_value(value, registry)
                .map_err(|source| RecordError::Field {
                    record: schema.name().to_string(),
                    field: field.name.clone(),
                    source,
                })?;
            if dumped.is_null() && !options.allow_null_output {
                continue;
            }
            out.insert(field.name.clone(), dumped);
        }
        Ok(JsonValue::Object(out))
    }
}

impl PartialEq for RecordInstance {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.fields == other.fields
    }
}

impl fmt::Debug for RecordInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct(self.schema.name());
        for (name, value) in &self.fields {
            d.field(name, value);
        }
        d.finish()
    }
}
