//! `json-model`: type-directed JSON coercion and validation.
//!
//! Records are declared with [`RecordDecl`] and registered in a
//! [`Registry`], which turns each declaration into an immutable
//! [`RecordSchema`]. Every field carries a [`TypeDescriptor`] that knows
//! how to parse raw JSON into a typed [`Value`], validate it, and dump it
//! back. Records form polymorphic families: a discriminator key in the
//! payload selects the concrete subtype on the way in and is written on
//! the way out.
//!
//! # Example
//!
//! ```
//! use json_model::{RecordDecl, Registry, TypeBuilder, Value};
//! use serde_json::json;
//!
//! let t = TypeBuilder::new();
//! let mut registry = Registry::new();
//! registry
//!     .register(RecordDecl::new("Pet").field("name", t.str()))
//!     .unwrap();
//! registry
//!     .register(RecordDecl::new("Dog").extends("Pet").field("tricks", "list[str]"))
//!     .unwrap();
//!
//! let payload = json!({"__name": "Dog", "name": "Rex", "tricks": ["sit"]});
//! let dog = registry.from_json("Pet", &payload).unwrap();
//! assert_eq!(dog.type_name(), "Dog");
//! assert_eq!(dog.get("name"), Some(&Value::from("Rex")));
//! assert_eq!(registry.to_json(&dog).unwrap(), payload);
//! ```

pub mod attempt;
pub mod descriptor;
pub mod error;
pub mod record;
pub mod registry;
pub mod schema;
pub mod value;

pub use attempt::try_in_order;
pub use descriptor::{AlternateConversion, DefaultValue, Shape, TypeBuilder, TypeDescriptor};
pub use error::{ConversionError, Error, PathSegment, RecordError, SchemaDefinitionError, SubtypeResolutionError};
pub use record::RecordInstance;
pub use registry::{FromJsonOptions, Registry, SubtypeCache};
pub use schema::{FieldSchema, FieldType, RecordDecl, RecordOptions, RecordSchema, ResolvedOptions};
pub use value::{EnumDef, EnumKind, EnumValue, JsonKind, Pattern, TypeRef, TypeRefKind, Value};

pub use json_model_temporal::{IsoCodec, TemporalCodec};
