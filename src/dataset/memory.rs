use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::dataset::{Dataset, DimensionHierarchy, DrillDownRequest};
use crate::types::{Cut, CutValue, DatasetId};

/// In-memory dataset: cut state, hierarchies and the ordered value ids of
/// each dimension field are held locally, and drill-downs are recorded.
#[derive(Debug)]
pub struct StaticDataset {
    id: DatasetId,
    cut: RefCell<Cut>,
    hierarchies: BTreeMap<String, DimensionHierarchy>,
    values: BTreeMap<String, Vec<Value>>,
    drill_downs: RefCell<Vec<DrillDownRequest>>,
}

impl StaticDataset {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: DatasetId::new(id),
            cut: RefCell::new(Cut::new()),
            hierarchies: BTreeMap::new(),
            values: BTreeMap::new(),
            drill_downs: RefCell::new(Vec::new()),
        }
    }

    pub fn with_cut(self, cut: Cut) -> Self {
        *self.cut.borrow_mut() = cut;
        self
    }

    pub fn with_hierarchy(mut self, field: impl Into<String>, hierarchy: DimensionHierarchy) -> Self {
        self.hierarchies.insert(field.into(), hierarchy);
        self
    }

    /// Ordered value ids of `field`, as used by `has_cut_value`.
    pub fn with_values(mut self, field: impl Into<String>, ids: Vec<Value>) -> Self {
        self.values.insert(field.into(), ids);
        self
    }

    pub fn add_cut(&self, field: impl Into<String>, value: impl Into<CutValue>) {
        self.cut.borrow_mut().insert(field, value);
    }

    pub fn remove_cut(&self, field: &str) {
        self.cut.borrow_mut().remove(field);
    }

    pub fn drill_downs(&self) -> Vec<DrillDownRequest> {
        self.drill_downs.borrow().clone()
    }
}

impl Dataset for StaticDataset {
    fn id(&self) -> &DatasetId {
        &self.id
    }

    fn cut(&self) -> Cut {
        self.cut.borrow().clone()
    }

    fn dimension_hierarchy(&self, field: &str) -> Option<DimensionHierarchy> {
        self.hierarchies.get(field).cloned()
    }

    fn get_cut(&self, field: &str) -> Option<CutValue> {
        self.cut.borrow().get(field).cloned()
    }

    fn has_cut_value(&self, field: &str, index: usize) -> bool {
        match self.values.get(field).and_then(|ids| ids.get(index)) {
            Some(id) => self.has_cut_id(field, id),
            None => false,
        }
    }

    fn drill_down(&self, request: DrillDownRequest) {
        debug!(
            dataset = %self.id,
            dimension = %request.dimension,
            parent = %request.parent_id,
            "drill down"
        );
        self.drill_downs.borrow_mut().push(request);
    }
}
