//! Type-expression parser.
//!
//! Reduces annotations such as `dict[str, list[int]]`, `Optional[Color]`
//! or `int | str | None` to a [`TypeDescriptor`]. Names resolve against
//! the built-in shapes, then the registry's enums and records.

use super::{Shape, TypeBuilder, TypeDescriptor};
use crate::error::SchemaDefinitionError;
use crate::registry::Registry;
use crate::value::JsonKind;

/// Parse a type expression.
///
/// `self_name` is the record being declared, so its fields may refer to
/// it before it is registered.
pub fn parse(
    input: &str,
    registry: &Registry,
    self_name: Option<&str>,
) -> Result<TypeDescriptor, SchemaDefinitionError> {
    let mut parser = TypeExprParser {
        input,
        pos: 0,
        registry,
        self_name,
    };
    let descriptor = parser.parse_union()?;
    parser.skip_whitespace();
    if !parser.is_at_end() {
        return Err(parser.unexpected());
    }
    descriptor.check_definition(registry, self_name)?;
    Ok(descriptor)
}

struct TypeExprParser<'a> {
    input: &'a str,
    pos: usize,
    registry: &'a Registry,
    self_name: Option<&'a str>,
}

/// One generic argument: a type, `...`, or the empty-tuple marker `()`.
enum Arg {
    Type(TypeDescriptor),
    Ellipsis,
    Empty,
}

impl<'a> TypeExprParser<'a> {
    fn unsupported(&self, reason: impl Into<String>) -> SchemaDefinitionError {
        SchemaDefinitionError::UnsupportedType {
            type_expr: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn unexpected(&self) -> SchemaDefinitionError {
        match self.peek() {
            Some(c) => self.unsupported(format!("unexpected character '{c}' at {}", self.pos)),
            None => self.unsupported("unexpected end of input"),
        }
    }

    /// `term ('|' term)*`
    fn parse_union(&mut self) -> Result<TypeDescriptor, SchemaDefinitionError> {
        let mut members = vec![self.parse_term()?];
        loop {
            self.skip_whitespace();
            if self.peek() != Some('|') {
                break;
            }
            self.advance();
            members.push(self.parse_term()?);
        }
        Ok(make_union(members))
    }

    fn parse_term(&mut self) -> Result<TypeDescriptor, SchemaDefinitionError> {
        self.skip_whitespace();
        let name = self.parse_identifier()?;
        self.skip_whitespace();
        if name == "Any" && self.peek() == Some('[') {
            return self.parse_any_kind();
        }
        let args = if self.peek() == Some('[') {
            Some(self.parse_args()?)
        } else {
            None
        };
        self.resolve(&name, args)
    }

    /// `Any[kind]`, where `kind` names a JSON value kind.
    fn parse_any_kind(&mut self) -> Result<TypeDescriptor, SchemaDefinitionError> {
        self.expect('[')?;
        self.skip_whitespace();
        let kind = self.parse_identifier()?;
        self.skip_whitespace();
        self.expect(']')?;
        JsonKind::from_name(&kind)
            .map(|k| TypeBuilder::new().raw(k))
            .ok_or_else(|| self.unsupported(format!("unknown JSON kind '{kind}'")))
    }

    fn parse_args(&mut self) -> Result<Vec<Arg>, SchemaDefinitionError> {
        self.expect('[')?;
        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek_str("...") {
                self.pos += 3;
                args.push(Arg::Ellipsis);
            } else if self.peek_str("()") {
                self.pos += 2;
                args.push(Arg::Empty);
            } else {
                args.push(Arg::Type(self.parse_union()?));
            }
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.advance(),
                Some(']') => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn resolve(&self, name: &str, args: Option<Vec<Arg>>) -> Result<TypeDescriptor, SchemaDefinitionError> {
        let t = TypeBuilder::new();
        let Some(args) = args else {
            return self.resolve_bare(name);
        };
        match name {
            "list" | "List" => Ok(t.list(self.one(name, args)?)),
            "set" | "Set" | "frozenset" => Ok(t.set(self.one(name, args)?)),
            "Optional" => Ok(make_union(vec![self.one(name, args)?, t.none()])),
            "type" | "Type" => Ok(t.type_of(self.one(name, args)?)),
            "dict" | "Dict" => {
                let mut types = self.types(name, args)?;
                if types.len() != 2 {
                    return Err(self.unsupported(format!("{name} takes 2 type parameters, found {}", types.len())));
                }
                let value = types.pop();
                let key = types.pop();
                match (key, value) {
                    (Some(k), Some(v)) => Ok(t.dict(k, v)),
                    _ => Err(self.unsupported("dict takes 2 type parameters")),
                }
            }
            "Union" => {
                let types = self.types(name, args)?;
                if types.is_empty() {
                    return Err(self.unsupported("Union needs at least one member"));
                }
                Ok(make_union(types))
            }
            "tuple" | "Tuple" => self.resolve_tuple(args),
            _ => Err(self.unsupported(format!("'{name}' is not a generic type"))),
        }
    }

    fn resolve_tuple(&self, args: Vec<Arg>) -> Result<TypeDescriptor, SchemaDefinitionError> {
        let t = TypeBuilder::new();
        match args.as_slice() {
            [Arg::Empty] => return Ok(t.tuple(Vec::new())),
            [Arg::Type(element), Arg::Ellipsis] => return Ok(t.tuple_of(element.clone())),
            _ => {}
        }
        let mut positions = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Type(d) => positions.push(d),
                Arg::Ellipsis => return Err(self.unsupported("'...' must follow exactly one tuple element type")),
                Arg::Empty => return Err(self.unsupported("'()' must be the only tuple parameter")),
            }
        }
        Ok(t.tuple(positions))
    }

    fn resolve_bare(&self, name: &str) -> Result<TypeDescriptor, SchemaDefinitionError> {
        let t = TypeBuilder::new();
        let d = match name {
            "str" => t.str(),
            "int" => t.int(),
            "float" => t.float(),
            "bool" => t.bool(),
            "None" | "NoneType" => t.none(),
            "bytes" => t.bytes(),
            "Pattern" => t.pattern(),
            "datetime" => t.datetime(),
            "date" => t.date(),
            "time" => t.time(),
            "timedelta" => t.duration(),
            "Any" => t.any(),
            "type" | "Type" => t.type_(),
            "list" | "List" => t.list(t.any()),
            "set" | "Set" => t.set(t.any()),
            "tuple" | "Tuple" => t.tuple_of(t.any()),
            "dict" | "Dict" => t.dict(t.str(), t.any()),
            _ => {
                if let Some(def) = self.registry.enum_def(name) {
                    t.enum_(def)
                } else if self.self_name == Some(name) || self.registry.schema(name).is_some() {
                    t.record(name)
                } else {
                    return Err(self.unsupported(format!("unknown type '{name}'")));
                }
            }
        };
        Ok(d)
    }

    fn types(&self, name: &str, args: Vec<Arg>) -> Result<Vec<TypeDescriptor>, SchemaDefinitionError> {
        args.into_iter()
            .map(|arg| match arg {
                Arg::Type(d) => Ok(d),
                _ => Err(self.unsupported(format!("'...' and '()' are only valid in tuple, not {name}"))),
            })
            .collect()
    }

    fn one(&self, name: &str, args: Vec<Arg>) -> Result<TypeDescriptor, SchemaDefinitionError> {
        let mut types = self.types(name, args)?;
        match (types.pop(), types.is_empty()) {
            (Some(d), true) => Ok(d),
            _ => Err(self.unsupported(format!("{name} takes exactly 1 type parameter"))),
        }
    }

    fn parse_identifier(&mut self) -> Result<String, SchemaDefinitionError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        let ident = &self.input[start..self.pos];
        // Qualified names such as `typing.Optional` resolve by their last part.
        Ok(ident.rsplit('.').next().unwrap_or(ident).to_string())
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect(&mut self, expected: char) -> Result<(), SchemaDefinitionError> {
        if self.peek() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }
}

/// Build a union, folding `None` members into `Optional`.
fn make_union(members: Vec<TypeDescriptor>) -> TypeDescriptor {
    let t = TypeBuilder::new();
    let is_none = |d: &TypeDescriptor| matches!(d.shape(), Shape::Primitive(super::Primitive::None));
    let has_none = members.iter().any(is_none);
    let mut rest: Vec<TypeDescriptor> = members.into_iter().filter(|d| !is_none(d)).collect();
    let inner = match rest.len() {
        0 => return t.none(),
        1 => rest.remove(0),
        _ => t.union(rest),
    };
    if has_none {
        t.optional(inner)
    } else {
        inner
    }
}
