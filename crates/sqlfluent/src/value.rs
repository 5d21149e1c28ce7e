//! Bindable values, raw SQL fragments and column→value maps.
//!
//! - [`Value`] is anything that can be bound to a placeholder.
//! - [`Raw`] is an opaque SQL fragment that is emitted verbatim and never bound.
//! - [`Operand`] is what fluent methods accept: either of the two.
//! - [`ValueMap`] is an ordered column→operand map used for INSERT rows and UPDATE SET.

use crate::error::{SqlError, SqlResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A value that is bound to a placeholder at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
}

impl Value {
    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view used by aggregate readers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer view used by aggregate readers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Value::Bool(v) => Some(i64::from(*v)),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into a JSON value (used for the object result shape and caching).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::UInt(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Value::from(*v),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::from(b.clone()),
            Value::Json(v) => v.clone(),
            Value::DateTime(dt) => serde_json::Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Json(v) => write!(f, "{v}"),
            Value::DateTime(dt) => write!(f, "'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Uuid(u) => write!(f, "'{u}'"),
        }
    }
}

/// An unescaped SQL fragment that bypasses parameter binding.
///
/// # Safety
/// Be careful with SQL injection: the text is emitted into the statement as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Raw(String);

impl Raw {
    /// Wrap a SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Raw(sql.into())
    }

    /// The literal SQL text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shorthand for [`Raw::new`].
pub fn raw(sql: impl Into<String>) -> Raw {
    Raw::new(sql)
}

/// A value position in a statement: either bound through a placeholder or inlined raw.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Bind(Value),
    Raw(Raw),
}

impl Operand {
    pub fn is_raw(&self) -> bool {
        matches!(self, Operand::Raw(_))
    }
}

impl From<Raw> for Operand {
    fn from(r: Raw) -> Self {
        Operand::Raw(r)
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Bind(v)
    }
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident($conv:expr)),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(($conv)(v))
                }
            }

            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Bind(Value::from(v))
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool(|v| v),
    i8 => Int(i64::from),
    i16 => Int(i64::from),
    i32 => Int(i64::from),
    i64 => Int(|v| v),
    u8 => UInt(u64::from),
    u16 => UInt(u64::from),
    u32 => UInt(u64::from),
    u64 => UInt(|v| v),
    usize => UInt(|v: usize| v as u64),
    f32 => Float(f64::from),
    f64 => Float(|v| v),
    String => Text(|v| v),
    &str => Text(str::to_string),
    &String => Text(String::clone),
    Vec<u8> => Bytes(|v| v),
    serde_json::Value => Json(|v| v),
    NaiveDateTime => DateTime(|v| v),
    NaiveDate => DateTime(|v: NaiveDate| v.and_time(chrono::NaiveTime::MIN)),
    Uuid => Uuid(|v| v),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Bind(v.map_or(Value::Null, Into::into))
    }
}

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Value {
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Value::DateTime(v.naive_utc())
    }
}

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Operand {
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Operand::Bind(Value::from(v))
    }
}

/// An ordered column → operand map.
///
/// Insertion order is the column order of the generated statement. Setting an
/// existing column replaces its operand in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(String, Operand)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column to a bound value or raw fragment.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Operand>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column to a raw SQL fragment.
    pub fn set_raw(self, column: impl Into<String>, expr: impl Into<String>) -> Self {
        self.set(column, Raw::new(expr))
    }

    /// In-place variant of [`ValueMap::set`].
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Operand>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Operand> {
        self.entries.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operand)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn extend(&mut self, other: ValueMap) {
        for (column, value) in other.entries {
            self.insert(column, value);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Build a map from a JSON object.
    ///
    /// Anything other than an object (arrays in particular) is rejected: rows are
    /// always associative.
    pub fn from_json(value: &serde_json::Value) -> SqlResult<Self> {
        let serde_json::Value::Object(obj) = value else {
            return Err(SqlError::config(format!(
                "row must be an associative column map, got {}",
                json_kind(value)
            )));
        };
        let mut map = ValueMap::new();
        for (column, v) in obj {
            map.insert(column.clone(), json_to_value(v));
        }
        Ok(map)
    }
}

impl<K: Into<String>, V: Into<Operand>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a positional list",
        serde_json::Value::Object(_) => "an object",
    }
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Value::Text(s.clone()),
        // Nested arrays/objects are stored as JSON documents.
        other => Value::Json(other.clone()),
    }
}
