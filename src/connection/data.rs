use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload delivered by the loader. Rows are opaque JSON records; only their
/// `id` field is interpreted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectionData {
    pub rows: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

impl ConnectionData {
    pub fn new(rows: Vec<Value>) -> Self {
        Self { rows, total: None }
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.total = Some(total);
        self
    }
}

/// Lookup key for `Connection::get_value`: observations are addressed by
/// position, dimension values by their id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKey<'a> {
    Index(usize),
    Id(&'a Value),
}

/// Render an id as the string used for indexing, so `7` and `"7"` collide.
pub(crate) fn id_key(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
