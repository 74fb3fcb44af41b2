//! The registry: the universe of declared records and enums.
//!
//! Records are registered once, parent before child, and never change
//! afterwards. All conversions borrow the registry immutably, so a built
//! registry can be shared across threads; the only interior mutability is
//! the [`SubtypeCache`].

mod cache;

use std::fmt;
use std::iter;
use std::sync::Arc;

use indexmap::IndexMap;
use json_model_temporal::{IsoCodec, TemporalCodec};
use serde_json::Value as JsonValue;

pub use cache::SubtypeCache;

use crate::descriptor::{Shape, TypeDescriptor};
use crate::error::{Error, RecordError, SchemaDefinitionError, SubtypeResolutionError};
use crate::record::RecordInstance;
use crate::schema::{RecordDecl, RecordSchema};
use crate::value::{EnumDef, TypeRef, TypeRefKind, Value};

/// Built-in names a `type` field accepts, each with the type it denotes.
const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("str", "str"),
    ("int", "int"),
    ("float", "float"),
    ("bool", "bool"),
    ("bytes", "bytes"),
    ("list", "list"),
    ("set", "set"),
    ("tuple", "tuple"),
    ("dict", "dict"),
    ("type", "type"),
    ("Pattern", "Pattern"),
    ("Any", "Any"),
    ("timedelta", "timedelta"),
    ("None", "None"),
    ("NoneType", "None"),
];

/// Options for [`Registry::from_json_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FromJsonOptions {
    /// Drop unknown top-level keys instead of failing.
    pub ignore_extra: bool,
}

pub struct Registry {
    records: IndexMap<String, Arc<RecordSchema>>,
    enums: IndexMap<String, Arc<EnumDef>>,
    codec: Arc<dyn TemporalCodec>,
    cache: SubtypeCache,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("records", &self.records.keys().collect::<Vec<_>>())
            .field("enums", &self.enums.keys().collect::<Vec<_>>())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_codec(Arc::new(IsoCodec::new()))
    }

    pub fn with_codec(codec: Arc<dyn TemporalCodec>) -> Self {
        Self {
            records: IndexMap::new(),
            enums: IndexMap::new(),
            codec,
            cache: SubtypeCache::new(),
        }
    }

    fn check_unique(&self, name: &str) -> Result<(), SchemaDefinitionError> {
        if self.records.contains_key(name) || self.enums.contains_key(name) {
            return Err(SchemaDefinitionError::DuplicateType(name.to_string()));
        }
        Ok(())
    }

    /// Build and register a record schema.
    pub fn register(&mut self, decl: RecordDecl) -> Result<Arc<RecordSchema>, SchemaDefinitionError> {
        self.check_unique(decl.name())?;
        let schema = Arc::new(RecordSchema::build(decl, self)?);
        tracing::debug!(
            record = schema.name(),
            parent = schema.parent().unwrap_or("-"),
            fields = schema.fields().count(),
            "registered record"
        );
        self.records.insert(schema.name().to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    pub fn register_enum(&mut self, def: EnumDef) -> Result<Arc<EnumDef>, SchemaDefinitionError> {
        self.check_unique(def.name())?;
        def.check()?;
        let def = Arc::new(def);
        tracing::debug!(name = def.name(), members = def.members().len(), "registered enum");
        self.enums.insert(def.name().to_string(), Arc::clone(&def));
        Ok(def)
    }

    pub fn schema(&self, name: &str) -> Option<Arc<RecordSchema>> {
        self.records.get(name).cloned()
    }

    pub fn enum_def(&self, name: &str) -> Option<Arc<EnumDef>> {
        self.enums.get(name).cloned()
    }

    pub fn records(&self) -> impl Iterator<Item = &Arc<RecordSchema>> {
        self.records.values()
    }

    pub fn codec(&self) -> &dyn TemporalCodec {
        self.codec.as_ref()
    }

    pub fn cache(&self) -> &SubtypeCache {
        &self.cache
    }

    /// Whether record `name` is `base` or one of its descendants.
    pub fn is_subtype(&self, name: &str, base: &str) -> bool {
        self.records.get(name).is_some_and(|s| s.is_subtype_of(base))
    }

    /// Find the record in `base`'s family whose identity equals
    /// `discriminator`: the base itself first, then its descendants in
    /// registration order.
    pub fn resolve(
        &self,
        base: &str,
        discriminator: &JsonValue,
    ) -> Result<Arc<RecordSchema>, SubtypeResolutionError> {
        if let Some(hit) = self.cache.get(discriminator, base) {
            tracing::trace!(base, %discriminator, concrete = hit.name(), "subtype cache hit");
            return Ok(hit);
        }
        let root = self
            .schema(base)
            .ok_or_else(|| SubtypeResolutionError::UnknownBase(base.to_string()))?;
        let descendants = self
            .records
            .values()
            .filter(|s| s.ancestors().iter().any(|a| a == base));
        let found = iter::once(&root)
            .chain(descendants)
            .find(|s| s.identity() == discriminator)
            .cloned();
        match found {
            Some(schema) => {
                tracing::debug!(base, %discriminator, concrete = schema.name(), "resolved subtype");
                Ok(self.cache.insert_or_get(discriminator, base, schema))
            }
            None => {
                tracing::debug!(base, %discriminator, "no subtype matches discriminator");
                Err(SubtypeResolutionError::NoMatch {
                    base: base.to_string(),
                    discriminator: discriminator.to_string(),
                })
            }
        }
    }

    /// Look up a type by name for a `type` field: date/time names and
    /// `null`/`none` case-insensitively, then built-ins, records and enums.
    pub fn resolve_type_name(&self, name: &str) -> Option<TypeRef> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "datetime" | "date" | "time" => return Some(TypeRef::builtin(lower.as_str())),
            "null" | "none" => return Some(TypeRef::builtin("None")),
            _ => {}
        }
        if let Some((_, canonical)) = BUILTIN_TYPES.iter().find(|(alias, _)| *alias == name) {
            return Some(TypeRef::builtin(*canonical));
        }
        if self.records.contains_key(name) {
            return Some(TypeRef {
                name: name.to_string(),
                kind: TypeRefKind::Record,
            });
        }
        if self.enums.contains_key(name) {
            return Some(TypeRef {
                name: name.to_string(),
                kind: TypeRefKind::Enum,
            });
        }
        None
    }

    /// Whether the type `t` may stand where `constraint` is expected.
    pub fn type_satisfies(&self, t: &TypeRef, constraint: &TypeDescriptor) -> bool {
        match (constraint.shape(), t.kind) {
            (Shape::RawType(None), _) => true,
            (Shape::Union, _) => constraint.children().iter().any(|c| self.type_satisfies(t, c)),
            (Shape::Optional, _) => {
                (t.name == "None" && t.kind == TypeRefKind::Builtin)
                    || self.type_satisfies(t, &constraint.children()[0])
            }
            (Shape::NestedRecord(base), TypeRefKind::Record) => self.is_subtype(&t.name, base),
            (Shape::EnumVariant(def), TypeRefKind::Enum) => t.name == def.name(),
            (shape, TypeRefKind::Builtin) => builtin_name(shape).is_some_and(|n| n == t.name),
            _ => false,
        }
    }

    /// Build a record of exactly type `name`, without polymorphic dispatch.
    pub fn construct<I, K>(&self, name: &str, values: I, ignore_extra: bool) -> Result<RecordInstance, RecordError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let schema = self
            .schema(name)
            .ok_or_else(|| RecordError::UnknownRecord(name.to_string()))?;
        RecordInstance::construct(self, schema, values, ignore_extra)
    }

    /// Build a record of `base`'s family from a JSON object, dispatching
    /// on its discriminator. Unknown keys fail.
    pub fn from_json(&self, base: &str, json: &JsonValue) -> Result<RecordInstance, Error> {
        self.from_json_with(base, json, FromJsonOptions::default())
    }

    pub fn from_json_with(
        &self,
        base: &str,
        json: &JsonValue,
        options: FromJsonOptions,
    ) -> Result<RecordInstance, Error> {
        let JsonValue::Object(object) = json else {
            return Err(RecordError::NotAnObject {
                record: base.to_string(),
                found: crate::value::JsonKind::of(json).to_string(),
            }
            .into());
        };
        let values: IndexMap<String, Value> = object
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v)))
            .collect();
        self.instantiate(base, values, options.ignore_extra)
    }

    pub fn to_json(&self, instance: &RecordInstance) -> Result<JsonValue, RecordError> {
        instance.to_json(self)
    }

    /// Pop the discriminator from `values`, resolve the concrete record and
    /// construct it.
    pub(crate) fn instantiate(
        &self,
        base: &str,
        mut values: IndexMap<String, Value>,
        ignore_extra: bool,
    ) -> Result<RecordInstance, Error> {
        let root = self
            .schema(base)
            .ok_or_else(|| RecordError::UnknownRecord(base.to_string()))?;
        let options = root.options();
        let discriminator = match values.shift_remove(&options.name_field) {
            Some(v) => v.to_json().ok_or_else(|| SubtypeResolutionError::NoMatch {
                base: base.to_string(),
                discriminator: v.type_name(),
            })?,
            None if options.name_field_required => {
                return Err(SubtypeResolutionError::MissingDiscriminator {
                    base: base.to_string(),
                    key: options.name_field.clone(),
                }
                .into())
            }
            None => root.identity().clone(),
        };
        let concrete = self.resolve(base, &discriminator)?;
        Ok(RecordInstance::construct(self, concrete, values, ignore_extra)?)
    }

    /// Parse a nested-record field value: an instance of the family, a JSON
    /// string encoding an object, or a string-keyed mapping.
    pub(crate) fn parse_nested(&self, base: &str, raw: &Value) -> Result<Value, String> {
        match raw {
            Value::Record(r) if self.is_subtype(r.type_name(), base) => Ok(raw.clone()),
            Value::Record(r) => Err(format!("Record '{}' is not a '{base}'", r.type_name())),
            Value::Str(s) => {
                let decoded: JsonValue = serde_json::from_str(s)
                    .map_err(|e| format!("Unable to decode string as JSON for '{base}': {e}"))?;
                if !decoded.is_object() {
                    return Err(format!("Decoded JSON for '{base}' is not an object"));
                }
                self.parse_nested(base, &Value::from(decoded))
            }
            Value::Map(entries) => {
                let values = entries
                    .iter()
                    .map(|(k, v)| match k {
                        Value::Str(key) => Ok((key.clone(), v.clone())),
                        other => Err(format!("Record keys must be strings, got '{}'", other.type_name())),
                    })
                    .collect::<Result<IndexMap<_, _>, _>>()?;
                self.instantiate(base, values, false)
                    .map(Value::from)
                    .map_err(|e| e.to_string())
            }
            other => Err(format!(
                "Unable to parse value of type '{}' as record '{base}'",
                other.type_name()
            )),
        }
    }
}

fn builtin_name(shape: &Shape) -> Option<&'static str> {
    Some(match shape {
        Shape::Primitive(p) => p.name(),
        Shape::List => "list",
        Shape::Set => "set",
        Shape::Tuple(_) => "tuple",
        Shape::Mapping => "dict",
        Shape::ByteBlob => "bytes",
        Shape::Pattern => "Pattern",
        Shape::Temporal(k) => k.name(),
        Shape::TypeValue => "type",
        _ => return None,
    })
}
