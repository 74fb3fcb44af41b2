//! Typed in-memory values produced by parsing and consumed by dumping.

pub mod enums;
pub mod json;
pub mod pattern;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde_json::Value as JsonValue;

pub use enums::{EnumDef, EnumKind, EnumMember, EnumValue};
pub use json::JsonKind;
pub use pattern::Pattern;

use crate::record::RecordInstance;

/// What a [`TypeRef`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRefKind {
    Builtin,
    Record,
    Enum,
}

/// A resolved reference to a type, the value of a `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeRefKind,
}

impl TypeRef {
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeRefKind::Builtin,
        }
    }
}

/// A strongly-typed value.
///
/// Raw JSON lifts into the `Null`..`Map` subset; parsing against a
/// descriptor produces the richer variants. `Set` and `Map` compare
/// without regard to order.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Set(Vec<Value>),
    Tuple(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Enum(EnumValue),
    Pattern(Pattern),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    Duration(TimeDelta),
    Type(TypeRef),
    Record(Box<RecordInstance>),
    Json(JsonValue),
}

/// Multiset equality: every element of `a` pairs with a distinct equal
/// element of `b`.
fn same_multiset<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        let hit = (0..b.len()).find(|&j| !used[j] && *x == b[j]);
        if let Some(j) = hit {
            used[j] = true;
        }
        hit.is_some()
    })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => same_multiset(a, b),
            (Self::Map(a), Self::Map(b)) => same_multiset(a, b),
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (Self::Type(a), Self::Type(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Short name of the value's type, as used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "None".into(),
            Self::Bool(_) => "bool".into(),
            Self::Int(_) => "int".into(),
            Self::Float(_) => "float".into(),
            Self::Str(_) => "str".into(),
            Self::Bytes(_) => "bytes".into(),
            Self::List(_) => "list".into(),
            Self::Set(_) => "set".into(),
            Self::Tuple(_) => "tuple".into(),
            Self::Map(_) => "dict".into(),
            Self::Enum(e) => e.enum_name.clone(),
            Self::Pattern(_) => "Pattern".into(),
            Self::Date(_) => "date".into(),
            Self::Time(_) => "time".into(),
            Self::DateTime(_) => "datetime".into(),
            Self::Duration(_) => "timedelta".into(),
            Self::Type(_) => "type".into(),
            Self::Record(r) => r.type_name().to_string(),
            Self::Json(j) => JsonKind::of(j).name().into(),
        }
    }

    /// Approximate shape of the value: containers list the distinct
    /// element type names they hold, in first-seen order.
    pub fn shape_name(&self) -> String {
        fn distinct<'a>(items: impl Iterator<Item = &'a Value>) -> String {
            let mut names: Vec<String> = Vec::new();
            for item in items {
                let name = item.type_name();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            names.join("|")
        }
        match self {
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => {
                format!("{}[{}]", self.type_name(), distinct(items.iter()))
            }
            Self::Map(entries) => format!(
                "dict[{}, {}]",
                distinct(entries.iter().map(|(k, _)| k)),
                distinct(entries.iter().map(|(_, v)| v))
            ),
            _ => self.type_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, with ints widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Elements of a list, set or tuple.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a map entry by key.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.as_entries()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Self::Pattern(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            Self::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordInstance> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Self::Json(j) => Some(j),
            _ => None,
        }
    }

    /// Plain JSON rendering of the JSON-shaped subset of values.
    ///
    /// Returns `None` for typed variants (enums, temporals, records, ...),
    /// non-finite floats and maps with non-string keys.
    pub fn to_json(&self) -> Option<JsonValue> {
        match self {
            Self::Null => Some(JsonValue::Null),
            Self::Bool(b) => Some(JsonValue::Bool(*b)),
            Self::Int(i) => Some(JsonValue::from(*i)),
            Self::Float(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
            Self::Str(s) => Some(JsonValue::String(s.clone())),
            Self::List(items) | Self::Set(items) | Self::Tuple(items) => items
                .iter()
                .map(Value::to_json)
                .collect::<Option<Vec<_>>>()
                .map(JsonValue::Array),
            Self::Map(entries) => entries
                .iter()
                .map(|(k, v)| Some((k.as_str()?.to_string(), v.to_json()?)))
                .collect::<Option<serde_json::Map<_, _>>>()
                .map(JsonValue::Object),
            Self::Json(j) => Some(j.clone()),
            _ => None,
        }
    }
}

impl From<JsonValue> for Value {
    /// Lift raw JSON. Integers that do not fit `i64` become floats.
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Self::Str(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (Self::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        Value::from(json.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Self::Enum(e)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Self::Pattern(p)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Self::Time(t)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::DateTime(d)
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Self::Duration(d)
    }
}

impl From<TypeRef> for Value {
    fn from(t: TypeRef) -> Self {
        Self::Type(t)
    }
}

impl From<RecordInstance> for Value {
    fn from(r: RecordInstance) -> Self {
        Self::Record(Box::new(r))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}
