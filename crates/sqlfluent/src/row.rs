//! Result rows returned by a driver.

use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One result row: ordered column → value pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Get a column, returning [`SqlError::Decode`] when it is absent.
    pub fn try_get(&self, column: &str) -> SqlResult<&Value> {
        self.get(column)
            .ok_or_else(|| SqlError::decode(column, "no such column"))
    }

    pub fn get_i64(&self, column: &str) -> SqlResult<i64> {
        let value = self.try_get(column)?;
        value
            .as_i64()
            .ok_or_else(|| SqlError::decode(column, format!("expected integer, got {value}")))
    }

    pub fn get_f64(&self, column: &str) -> SqlResult<f64> {
        let value = self.try_get(column)?;
        value
            .as_f64()
            .ok_or_else(|| SqlError::decode(column, format!("expected number, got {value}")))
    }

    pub fn get_str(&self, column: &str) -> SqlResult<&str> {
        let value = self.try_get(column)?;
        value
            .as_str()
            .ok_or_else(|| SqlError::decode(column, format!("expected text, got {value}")))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// The row as a JSON object (the Object result shape).
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.columns
            .iter()
            .map(|(c, v)| (c.clone(), v.to_json()))
            .collect()
    }

    /// Map the row onto a serde type by column name.
    pub fn deserialize<T: DeserializeOwned>(&self) -> SqlResult<T> {
        serde_json::from_value(serde_json::Value::Object(self.to_json()))
            .map_err(|e| SqlError::decode("<row>", e.to_string()))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
