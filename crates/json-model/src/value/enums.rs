//! Enum families: general, int-backed, string-backed and bit flags.

use serde_json::Value as JsonValue;

use super::Value;
use crate::error::SchemaDefinitionError;

/// How an enum is matched on input and rendered on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    /// Parsed by member name (then by value); dumped by name.
    General,
    /// Parsed from a declared integer or a member name; dumped as the integer.
    Int,
    /// Parsed from and dumped as the declared string value.
    Str,
    /// Integer bit flags combined with bitwise OR; dumped as the integer.
    Flag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: JsonValue,
}

/// Declaration of an enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    name: String,
    kind: EnumKind,
    members: Vec<EnumMember>,
}

/// A member (or, for flags, a combination of members) of a declared enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub enum_name: String,
    /// Member name; flag combinations join member names with `|`.
    pub name: String,
    pub value: JsonValue,
}

impl EnumValue {
    pub fn bits(&self) -> Option<i64> {
        self.value.as_i64()
    }
}

impl EnumDef {
    pub fn new(name: impl Into<String>, kind: EnumKind) -> Self {
        Self {
            name: name.into(),
            kind,
            members: Vec::new(),
        }
    }

    pub fn general(name: impl Into<String>) -> Self {
        Self::new(name, EnumKind::General)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, EnumKind::Int)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, EnumKind::Str)
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, EnumKind::Flag)
    }

    pub fn member(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.members.push(EnumMember {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EnumKind {
        self.kind
    }

    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Look up a single member by name.
    pub fn value_of(&self, member: &str) -> Option<EnumValue> {
        self.members
            .iter()
            .find(|m| m.name == member)
            .map(|m| self.wrap(m))
    }

    /// Combine flag members; `None` if this is not a flag enum or `bits`
    /// has bits set that no declared flag covers.
    pub fn from_bits(&self, bits: i64) -> Option<EnumValue> {
        if self.kind != EnumKind::Flag {
            return None;
        }
        let declared = self
            .members
            .iter()
            .filter_map(|m| m.value.as_i64())
            .fold(0i64, |acc, b| acc | b);
        if bits & !declared != 0 {
            return None;
        }
        if let Some(exact) = self.members.iter().find(|m| m.value.as_i64() == Some(bits)) {
            return Some(self.wrap(exact));
        }
        let names: Vec<&str> = self
            .members
            .iter()
            .filter(|m| m.value.as_i64().is_some_and(|b| b != 0 && bits & b == b))
            .map(|m| m.name.as_str())
            .collect();
        Some(EnumValue {
            enum_name: self.name.clone(),
            name: names.join("|"),
            value: JsonValue::from(bits),
        })
    }

    fn wrap(&self, member: &EnumMember) -> EnumValue {
        EnumValue {
            enum_name: self.name.clone(),
            name: member.name.clone(),
            value: member.value.clone(),
        }
    }

    pub(crate) fn check(&self) -> Result<(), SchemaDefinitionError> {
        let invalid = |reason: String| SchemaDefinitionError::InvalidEnum {
            name: self.name.clone(),
            reason,
        };
        if self.members.is_empty() {
            return Err(invalid("enum declares no members".into()));
        }
        for (i, member) in self.members.iter().enumerate() {
            if self.members[..i].iter().any(|m| m.name == member.name) {
                return Err(invalid(format!("duplicate member name '{}'", member.name)));
            }
            let ok = match self.kind {
                EnumKind::Int | EnumKind::Flag => member.value.is_i64(),
                EnumKind::Str => member.value.is_string(),
                EnumKind::General => true,
            };
            if !ok {
                return Err(invalid(format!(
                    "member '{}' has a value of the wrong kind: {}",
                    member.name, member.value
                )));
            }
        }
        Ok(())
    }

    /// Parse a raw or already-typed value into a member of this enum.
    pub(crate) fn parse(&self, raw: &Value) -> Result<EnumValue, String> {
        if let Value::Enum(e) = raw {
            if e.enum_name == self.name {
                return Ok(e.clone());
            }
        }
        let found = match (self.kind, raw) {
            (EnumKind::Int, Value::Int(i)) => self.by_value(&JsonValue::from(*i)),
            (EnumKind::Int, Value::Str(s)) => self.value_of(s),
            (EnumKind::Str, Value::Str(s)) => self.by_value(&JsonValue::from(s.as_str())),
            (EnumKind::Flag, Value::Int(bits)) => self.from_bits(*bits),
            (EnumKind::General, Value::Str(s)) => self
                .value_of(s)
                .or_else(|| self.by_value(&JsonValue::from(s.as_str()))),
            (EnumKind::General, other) => other.to_json().and_then(|j| self.by_value(&j)),
            _ => {
                return Err(format!(
                    "Unable to parse value of type '{}' as enum '{}'",
                    raw.type_name(),
                    self.name
                ))
            }
        };
        found.ok_or_else(|| {
            let shown = raw
                .to_json()
                .map(|j| j.to_string())
                .unwrap_or_else(|| raw.type_name());
            format!("Unrecognized value ({shown}) for enum '{}'", self.name)
        })
    }

    fn by_value(&self, value: &JsonValue) -> Option<EnumValue> {
        self.members
            .iter()
            .find(|m| &m.value == value)
            .map(|m| self.wrap(m))
    }

    /// Wire representation of a member of this enum.
    pub(crate) fn dump(&self, value: &EnumValue) -> JsonValue {
        match self.kind {
            EnumKind::General => JsonValue::String(value.name.clone()),
            EnumKind::Int | EnumKind::Str | EnumKind::Flag => value.value.clone(),
        }
    }
}
