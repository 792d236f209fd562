use serde::{Deserialize, Serialize};

use crate::element::ElementError;
use crate::types::BucketValue;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldRef {
    #[serde(default)]
    pub id: Option<String>,
}

impl FieldRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

/// One dimension a chart is drawn over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSpec {
    #[serde(default)]
    pub field: FieldRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<BucketValue>,
}

impl DimensionSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: FieldRef::new(field),
            bucket: None,
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<BucketValue>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }
}

fn interactive_default() -> bool {
    true
}

/// Declarative description of a visualisation element, as stored with the
/// visualisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualisation: Option<String>,
    #[serde(default)]
    pub measure: FieldRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
    #[serde(default)]
    pub dimensions: Vec<DimensionSpec>,
    #[serde(default = "interactive_default")]
    pub interactive: bool,
}

impl ElementSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            visualisation: None,
            measure: FieldRef::default(),
            measure_label: None,
            aggregation: None,
            dimensions: Vec::new(),
            interactive: true,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ElementError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_visualisation(mut self, id: impl Into<String>) -> Self {
        self.visualisation = Some(id.into());
        self
    }

    pub fn with_measure(mut self, measure: impl Into<String>) -> Self {
        self.measure = FieldRef::new(measure);
        self
    }

    pub fn with_aggregation(mut self, aggregation: impl Into<String>) -> Self {
        self.aggregation = Some(aggregation.into());
        self
    }

    pub fn with_dimension(mut self, dimension: DimensionSpec) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }
}
