//! Factory for constructing `TypeDescriptor` instances.

use std::sync::Arc;

use super::{Primitive, Shape, TemporalKind, TupleKind, TypeDescriptor};
use crate::value::{EnumDef, JsonKind};

/// Factory for constructing [`TypeDescriptor`]s.
///
/// Every method produces a descriptor with the arity its shape requires,
/// except `union` and `tuple`, which take caller-supplied children and are
/// checked again when the owning record is registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeBuilder;

impl TypeBuilder {
    pub fn new() -> Self {
        Self
    }

    fn leaf(&self, shape: Shape) -> TypeDescriptor {
        TypeDescriptor::from_parts(shape, Vec::new())
    }

    fn wrap(&self, shape: Shape, children: Vec<TypeDescriptor>) -> TypeDescriptor {
        TypeDescriptor::from_parts(shape, children)
    }

    // ------------------------------------------------------------------
    // Primitives

    pub fn str(&self) -> TypeDescriptor {
        self.leaf(Shape::Primitive(Primitive::Str))
    }

    pub fn int(&self) -> TypeDescriptor {
        self.leaf(Shape::Primitive(Primitive::Int))
    }

    pub fn float(&self) -> TypeDescriptor {
        self.leaf(Shape::Primitive(Primitive::Float))
    }

    pub fn bool(&self) -> TypeDescriptor {
        self.leaf(Shape::Primitive(Primitive::Bool))
    }

    pub fn none(&self) -> TypeDescriptor {
        self.leaf(Shape::Primitive(Primitive::None))
    }

    // ------------------------------------------------------------------
    // Containers

    pub fn list(&self, element: TypeDescriptor) -> TypeDescriptor {
        self.wrap(Shape::List, vec![element])
    }

    pub fn set(&self, element: TypeDescriptor) -> TypeDescriptor {
        self.wrap(Shape::Set, vec![element])
    }

    /// Fixed-arity tuple, one descriptor per position.
    pub fn tuple(&self, positions: Vec<TypeDescriptor>) -> TypeDescriptor {
        self.wrap(Shape::Tuple(TupleKind::Fixed), positions)
    }

    /// Variadic tuple: any number of `element`s.
    pub fn tuple_of(&self, element: TypeDescriptor) -> TypeDescriptor {
        self.wrap(Shape::Tuple(TupleKind::Variadic), vec![element])
    }

    pub fn dict(&self, key: TypeDescriptor, value: TypeDescriptor) -> TypeDescriptor {
        self.wrap(Shape::Mapping, vec![key, value])
    }

    pub fn optional(&self, inner: TypeDescriptor) -> TypeDescriptor {
        self.wrap(Shape::Optional, vec![inner])
    }

    pub fn union(&self, members: Vec<TypeDescriptor>) -> TypeDescriptor {
        self.wrap(Shape::Union, members)
    }

    // ------------------------------------------------------------------
    // Leaves with extra semantics

    pub fn enum_(&self, def: Arc<EnumDef>) -> TypeDescriptor {
        self.leaf(Shape::EnumVariant(def))
    }

    pub fn bytes(&self) -> TypeDescriptor {
        self.leaf(Shape::ByteBlob)
    }

    pub fn pattern(&self) -> TypeDescriptor {
        self.leaf(Shape::Pattern)
    }

    pub fn datetime(&self) -> TypeDescriptor {
        self.leaf(Shape::Temporal(TemporalKind::DateTime))
    }

    pub fn date(&self) -> TypeDescriptor {
        self.leaf(Shape::Temporal(TemporalKind::Date))
    }

    pub fn time(&self) -> TypeDescriptor {
        self.leaf(Shape::Temporal(TemporalKind::Time))
    }

    pub fn duration(&self) -> TypeDescriptor {
        self.leaf(Shape::Temporal(TemporalKind::Duration))
    }

    /// Any type reference.
    pub fn type_(&self) -> TypeDescriptor {
        self.leaf(Shape::TypeValue)
    }

    /// A type reference constrained to `constraint` or its subtypes.
    pub fn type_of(&self, constraint: TypeDescriptor) -> TypeDescriptor {
        self.wrap(Shape::TypeValue, vec![constraint])
    }

    /// A nested record, by registered name.
    pub fn record(&self, name: impl Into<String>) -> TypeDescriptor {
        self.leaf(Shape::NestedRecord(name.into()))
    }

    /// Raw JSON passthrough.
    pub fn any(&self) -> TypeDescriptor {
        self.leaf(Shape::RawType(None))
    }

    /// Raw JSON passthrough restricted to one JSON kind.
    pub fn raw(&self, kind: JsonKind) -> TypeDescriptor {
        self.leaf(Shape::RawType(Some(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn builds_with_correct_arity() {
        let t = TypeBuilder::new();
        let reg = Registry::new();
        for d in [
            t.list(t.int()),
            t.set(t.str()),
            t.tuple_of(t.bool()),
            t.dict(t.str(), t.any()),
            t.optional(t.date()),
            t.type_of(t.record("Base")),
            t.raw(JsonKind::Object),
        ] {
            assert!(d.check_definition(&reg, Some("Base")).is_ok(), "{d}");
        }
        assert!(t.union(vec![]).check_definition(&reg, None).is_err());
    }

    #[test]
    fn renders_leaves() {
        let t = TypeBuilder::new();
        assert_eq!(t.duration().to_string(), "timedelta");
        assert_eq!(t.type_of(t.record("Base")).to_string(), "type[Base]");
        assert_eq!(t.raw(JsonKind::Array).to_string(), "Any[array]");
        assert_eq!(t.bytes().to_string(), "bytes");
    }
}
