//! Engine-independent row values.
//!
//! A [`Record`] is an opaque column → [`Value`] map. Apart from the
//! primary key, the store never interprets column contents.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single column value.
///
/// [`Value::Null`] stands for SQL `NULL`: in a write payload it stores
/// `NULL`, in a predicate it matches `IS NULL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A row, or a set of column = value pairs used as a payload or predicate.
///
/// Columns are kept in sorted order so generated SQL is deterministic.
///
/// # Examples
///
/// ```
/// use resource_store_core::{Record, Value};
///
/// let row = Record::new()
///     .with("token", "abc")
///     .with("post_id", 5)
///     .with("deleted_at", None::<String>);
///
/// assert_eq!(row.get_str("token"), Some("abc"));
/// assert_eq!(row.get_i64("post_id"), Some(5));
/// assert_eq!(row.get("deleted_at"), Some(&Value::Null));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    columns: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets a column, returning the previous value if any.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.columns.insert(column.into(), value.into())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.columns.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_plain_text() {
        assert_eq!(Value::from("it's").to_string(), "it's");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::from(vec![1u8, 2, 3]).to_string(), "<3 bytes>");
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Integer(3));
    }

    #[test]
    fn test_columns_are_sorted() {
        let row = Record::new().with("b", 1).with("a", 2).with("c", 3);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_record_json_shape() {
        let row = Record::new()
            .with("id", 7)
            .with("token", "abc")
            .with("score", 1.5)
            .with("gone", Value::Null);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 7, "token": "abc", "score": 1.5, "gone": null})
        );

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_from_iterator() {
        let row: Record = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get_i64("b"), Some(2));
    }

    #[test]
    fn test_accessors_reject_other_types() {
        let v = Value::from("x");
        assert_eq!(v.as_i64(), None);
        assert_eq!(v.as_blob(), None);
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
    }
}
