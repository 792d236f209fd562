use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::cut::Cut;

/// The `type` of a connection request.
///
/// Only `dimensions` and `observations` are fingerprinted; every other kind
/// is kept verbatim and treated as uncacheable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum RequestKind {
    Dimensions,
    Observations,
    Other(String),
}

impl RequestKind {
    pub fn as_str(&self) -> &str {
        match self {
            RequestKind::Dimensions => "dimensions",
            RequestKind::Observations => "observations",
            RequestKind::Other(s) => s,
        }
    }
}

impl From<String> for RequestKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "dimensions" => RequestKind::Dimensions,
            "observations" => RequestKind::Observations,
            _ => RequestKind::Other(value),
        }
    }
}

/// A missing, null or non-string `type` is an unknown kind, not an error.
impl From<Value> for RequestKind {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RequestKind::from(s),
            Value::Null => RequestKind::default(),
            other => RequestKind::Other(other.to_string()),
        }
    }
}

impl Default for RequestKind {
    fn default() -> Self {
        RequestKind::Other(String::new())
    }
}

impl From<RequestKind> for String {
    fn from(value: RequestKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket and bucket interval values arrive as numbers, strings or booleans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BucketValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

// Integral floats render without a fraction, so `5.0` keys like `5`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_991.0;

fn write_number(f: &mut fmt::Formatter<'_>, n: &serde_json::Number) -> fmt::Result {
    match n.as_f64() {
        Some(x) if n.is_f64() && x.fract() == 0.0 && x.abs() <= MAX_EXACT_INTEGER => {
            write!(f, "{}", x as i64)
        }
        _ => write!(f, "{n}"),
    }
}

impl fmt::Display for BucketValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketValue::Bool(b) => write!(f, "{b}"),
            BucketValue::Number(n) => write_number(f, n),
            BucketValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for BucketValue {
    fn from(value: bool) -> Self {
        BucketValue::Bool(value)
    }
}

impl From<i64> for BucketValue {
    fn from(value: i64) -> Self {
        BucketValue::Number(value.into())
    }
}

impl From<i32> for BucketValue {
    fn from(value: i32) -> Self {
        BucketValue::Number(value.into())
    }
}

impl From<&str> for BucketValue {
    fn from(value: &str) -> Self {
        BucketValue::Text(value.to_string())
    }
}

impl From<String> for BucketValue {
    fn from(value: String) -> Self {
        BucketValue::Text(value)
    }
}

/// Description of the data a consumer needs from a dataset.
///
/// `None` means "not provided" and is distinct from an explicit zero or
/// empty string. Fields not modelled here are kept in `extra` and carried
/// into the connection unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    #[serde(rename = "type", default)]
    pub kind: RequestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_interval: Option<BucketValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<BucketValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut: Option<Cut>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ConnectionRequest {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            dimension: None,
            measure: None,
            aggregation: None,
            bucket_interval: None,
            bucket: None,
            cut: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn dimensions(dimension: impl Into<String>) -> Self {
        Self::new(RequestKind::Dimensions).with_dimension(dimension)
    }

    pub fn observations() -> Self {
        Self::new(RequestKind::Observations)
    }

    pub fn with_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimension = Some(dimension.into());
        self
    }

    pub fn with_measure(mut self, measure: impl Into<String>) -> Self {
        self.measure = Some(measure.into());
        self
    }

    pub fn with_aggregation(mut self, aggregation: impl Into<String>) -> Self {
        self.aggregation = Some(aggregation.into());
        self
    }

    pub fn with_bucket_interval(mut self, interval: impl Into<BucketValue>) -> Self {
        self.bucket_interval = Some(interval.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<BucketValue>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_cut(mut self, cut: Cut) -> Self {
        self.cut = Some(cut);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Same request with a different kind. Used to derive the observations
    /// request from a dimensions request sharing every other field.
    pub fn with_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }
}
