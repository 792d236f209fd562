pub mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Cut, CutValue, DatasetId};

pub use memory::StaticDataset;

/// Describes how a hierarchical dimension exposes its levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionHierarchy {
    /// Observation field holding the level of each value.
    pub level_field: String,
}

/// A drill-down into a finer level of a hierarchical dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillDownRequest {
    pub dimension: String,
    pub level: Value,
    pub parent_id: String,
}

/// The dataset a pool and its elements are bound to.
///
/// Implementations own the cut state and the network side; this crate only
/// queries them and forwards drill-down requests.
pub trait Dataset {
    fn id(&self) -> &DatasetId;

    /// The dataset-wide cut, used as the default for new connections.
    fn cut(&self) -> Cut;

    fn dimension_hierarchy(&self, field: &str) -> Option<DimensionHierarchy>;

    fn get_cut(&self, field: &str) -> Option<CutValue>;

    fn is_cut(&self, field: &str) -> bool {
        self.get_cut(field).is_some()
    }

    /// True if `field` is currently cut on `id`.
    fn has_cut_id(&self, field: &str, id: &Value) -> bool {
        self.get_cut(field).is_some_and(|cut| cut.matches(id))
    }

    /// True if `field` is currently cut on the value at `index`.
    fn has_cut_value(&self, field: &str, index: usize) -> bool;

    fn drill_down(&self, request: DrillDownRequest);
}
