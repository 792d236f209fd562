use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CutValue {
    String(String),
    Number(serde_json::Number),
}

impl CutValue {
    /// Convert a JSON scalar into a cut value. Objects, arrays, booleans and
    /// null cannot be cut on.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(CutValue::String(s.clone())),
            Value::Number(n) => Some(CutValue::Number(n.clone())),
            _ => None,
        }
    }

    /// Compare against a JSON id without caring whether either side was
    /// numeric or textual.
    pub fn matches(&self, id: &Value) -> bool {
        match (self, id) {
            (CutValue::String(a), Value::String(b)) => a == b,
            (CutValue::Number(a), Value::Number(b)) => a == b,
            (CutValue::String(a), Value::Number(b)) => *a == b.to_string(),
            (CutValue::Number(a), Value::String(b)) => a.to_string() == *b,
            _ => false,
        }
    }
}

impl fmt::Display for CutValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutValue::String(s) => f.write_str(s),
            CutValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for CutValue {
    fn from(value: &str) -> Self {
        CutValue::String(value.to_string())
    }
}

impl From<String> for CutValue {
    fn from(value: String) -> Self {
        CutValue::String(value)
    }
}

impl From<i32> for CutValue {
    fn from(value: i32) -> Self {
        CutValue::Number(value.into())
    }
}

impl From<i64> for CutValue {
    fn from(value: i64) -> Self {
        CutValue::Number(value.into())
    }
}

/// Active filter state, keyed by dimension field id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cut {
    inner: BTreeMap<String, CutValue>,
}

impl Cut {
    pub fn new() -> Self {
        Cut {
            inner: BTreeMap::new(),
        }
    }

    /// A cut holding a single field.
    pub fn single(field: impl Into<String>, value: impl Into<CutValue>) -> Self {
        let mut cut = Cut::new();
        cut.insert(field, value);
        cut
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<CutValue>) {
        self.inner.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<CutValue> {
        self.inner.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&CutValue> {
        self.inner.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.inner.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CutValue)> {
        self.inner.iter()
    }
}
