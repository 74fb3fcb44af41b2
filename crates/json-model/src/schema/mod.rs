//! Record declarations and the immutable schemas built from them.
//!
//! A [`RecordDecl`] lists a record's own fields, its parent and its
//! options. Registering it produces a [`RecordSchema`]: the parent's
//! fields in base-to-derived order, overridden in place by same-named
//! declarations, with every field type reduced to a [`TypeDescriptor`].

mod options;

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

pub use options::{RecordOptions, ResolvedOptions};

use crate::descriptor::{expr, DefaultValue, Shape, TypeDescriptor};
use crate::error::SchemaDefinitionError;
use crate::registry::Registry;
use crate::value::Value;

/// A field's declared type: a ready descriptor or a type expression.
#[derive(Debug, Clone)]
pub enum FieldType {
    Descriptor(TypeDescriptor),
    Expr(String),
}

impl From<TypeDescriptor> for FieldType {
    fn from(d: TypeDescriptor) -> Self {
        Self::Descriptor(d)
    }
}

impl From<&str> for FieldType {
    fn from(s: &str) -> Self {
        Self::Expr(s.to_string())
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        Self::Expr(s)
    }
}

/// Declaration of a record type, consumed by [`Registry::register`].
#[derive(Debug, Clone)]
pub struct RecordDecl {
    name: String,
    parent: Option<String>,
    fields: Vec<(String, FieldType)>,
    default_overrides: Vec<(String, DefaultValue)>,
    options: RecordOptions,
}

impl RecordDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            default_overrides: Vec::new(),
            options: RecordOptions::default(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        self.fields.push((name.into(), ty.into()));
        self
    }

    /// Replace the default of an inherited (or own) field, keeping its type.
    pub fn override_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.default_overrides
            .push((name.into(), DefaultValue::Value(default.into())));
        self
    }

    pub fn override_default_factory(
        mut self,
        name: impl Into<String>,
        f: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default_overrides.push((name.into(), DefaultValue::factory(f)));
        self
    }

    pub fn options(mut self, options: RecordOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name_field(mut self, key: impl Into<String>) -> Self {
        self.options.name_field = Some(key.into());
        self
    }

    pub fn name_field_required(mut self, required: bool) -> Self {
        self.options.name_field_required = Some(required);
        self
    }

    pub fn include_name_in_output(mut self, include: bool) -> Self {
        self.options.include_name_in_output = Some(include);
        self
    }

    pub fn include_defaults_in_output(mut self, include: bool) -> Self {
        self.options.include_defaults_in_output = Some(include);
        self
    }

    pub fn allow_null_output(mut self, allow: bool) -> Self {
        self.options.allow_null_output = Some(allow);
        self
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.options.exclusions.push(field.into());
        self
    }

    pub fn identity(mut self, identity: impl Into<JsonValue>) -> Self {
        self.options.identity = Some(identity.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One field of a built schema.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub descriptor: Arc<TypeDescriptor>,
}

impl FieldSchema {
    pub fn has_default(&self) -> bool {
        self.descriptor.has_default()
    }

    /// `Optional` fields without a default read an absent key as `null`.
    pub fn is_nullable(&self) -> bool {
        matches!(self.descriptor.shape(), Shape::Optional)
    }

    pub fn is_required(&self) -> bool {
        !self.has_default() && !self.is_nullable()
    }
}

/// The immutable description of a registered record type.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: String,
    identity: JsonValue,
    parent: Option<String>,
    /// Nearest ancestor first.
    ancestors: Vec<String>,
    fields: IndexMap<String, FieldSchema>,
    options: ResolvedOptions,
}

impl RecordSchema {
    pub(crate) fn build(decl: RecordDecl, registry: &Registry) -> Result<Self, SchemaDefinitionError> {
        let RecordDecl {
            name,
            parent,
            fields: declared,
            default_overrides,
            options: own_options,
        } = decl;

        let (mut fields, ancestors, inherited) = match &parent {
            Some(p) => {
                let base = registry
                    .schema(p)
                    .ok_or_else(|| SchemaDefinitionError::UnknownParent {
                        record: name.clone(),
                        parent: p.clone(),
                    })?;
                let mut ancestors = vec![base.name.clone()];
                ancestors.extend(base.ancestors.iter().cloned());
                (base.fields.clone(), ancestors, Some(base.options.clone()))
            }
            None => (IndexMap::new(), Vec::new(), None),
        };
        let options = ResolvedOptions::resolve(inherited.as_ref(), &own_options);

        for (field, ty) in declared {
            if options.is_reserved(&field) {
                continue;
            }
            let descriptor = match ty {
                FieldType::Descriptor(d) => d.check_definition(registry, Some(&name)).map(|()| d),
                FieldType::Expr(e) => expr::parse(&e, registry, Some(&name)),
            }
            .map_err(|e| e.in_field(&name, &field))?;
            fields.insert(
                field.clone(),
                FieldSchema {
                    name: field,
                    descriptor: Arc::new(descriptor),
                },
            );
        }
        fields.retain(|field, _| !options.is_reserved(field));

        for (field, default) in default_overrides {
            let slot = fields
                .get_mut(&field)
                .ok_or_else(|| SchemaDefinitionError::UnknownField {
                    record: name.clone(),
                    field: field.clone(),
                })?;
            slot.descriptor = Arc::new(slot.descriptor.replace_default(default));
        }

        let identity = own_options
            .identity
            .clone()
            .unwrap_or_else(|| JsonValue::String(name.clone()));

        Ok(Self {
            name,
            identity,
            parent,
            ancestors,
            fields,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The discriminator value that selects this record.
    pub fn identity(&self) -> &JsonValue {
        &self.identity
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.values().filter(|f| f.is_required())
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// `true` if this record is `name` or descends from it.
    pub fn is_subtype_of(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeBuilder;

    fn registry_with_base() -> Registry {
        let t = TypeBuilder::new();
        let mut reg = Registry::new();
        reg.register(
            RecordDecl::new("Base")
                .field("id", t.int())
                .field("tags", t.list(t.str()).with_default_factory(|| Value::List(vec![])))
                .field("_internal", t.str())
                .name_field("kind"),
        )
        .unwrap();
        reg
    }

    #[test]
    fn inherits_and_overrides_in_place() {
        let mut reg = registry_with_base();
        let schema = reg
            .register(
                RecordDecl::new("Child")
                    .extends("Base")
                    .field("extra", "Optional[str]")
                    .field("id", "float"),
            )
            .unwrap();
        let names: Vec<&str> = schema.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "tags", "extra"]);
        assert_eq!(schema.field("id").unwrap().descriptor.to_string(), "float");
        assert_eq!(schema.options().name_field, "kind");
        assert_eq!(schema.identity(), &JsonValue::from("Child"));
        assert!(schema.is_subtype_of("Base"));
        let required: Vec<&str> = schema.required_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(required, vec!["id"]);
    }

    #[test]
    fn reserved_and_excluded_fields_are_dropped() {
        let mut reg = registry_with_base();
        let schema = reg
            .register(RecordDecl::new("Slim").extends("Base").exclude("tags"))
            .unwrap();
        let names: Vec<&str> = schema.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id"]);
    }

    #[test]
    fn override_default_keeps_type() {
        let mut reg = registry_with_base();
        let schema = reg
            .register(RecordDecl::new("Seeded").extends("Base").override_default("id", 7))
            .unwrap();
        let id = schema.field("id").unwrap();
        assert!(id.has_default());
        assert_eq!(id.descriptor.to_string(), "int");
        let err = reg
            .register(RecordDecl::new("Bad").extends("Base").override_default("nope", 1))
            .unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::UnknownField { .. }));
    }

    #[test]
    fn definition_errors_name_the_field() {
        let mut reg = Registry::new();
        let err = reg
            .register(RecordDecl::new("Broken").field("m", "dict[list[int], str]"))
            .unwrap_err();
        match err {
            SchemaDefinitionError::InField { record, field, .. } => {
                assert_eq!((record.as_str(), field.as_str()), ("Broken", "m"));
            }
            other => panic!("unexpected {other:?}"),
        }
        let err = reg
            .register(RecordDecl::new("Orphan").extends("Missing"))
            .unwrap_err();
        assert!(matches!(err, SchemaDefinitionError::UnknownParent { .. }));
    }

    #[test]
    fn nested_records_must_be_known() {
        let t = TypeBuilder::new();
        let mut reg = registry_with_base();
        let err = reg
            .register(RecordDecl::new("Holder").field("inner", t.list(t.record("Nope"))))
            .unwrap_err();
        match err {
            SchemaDefinitionError::InField { record, field, source } => {
                assert_eq!((record.as_str(), field.as_str()), ("Holder", "inner"));
                assert!(matches!(*source, SchemaDefinitionError::UnsupportedType { ref type_expr, .. } if type_expr == "Nope"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(reg.schema("Holder").is_none());

        reg.register(
            RecordDecl::new("Holder")
                .field("base", t.record("Base"))
                .field("next", t.optional(t.record("Holder")).with_default(Value::Null)),
        )
        .unwrap();
    }
}
