pub mod readiness;
pub mod spec;

use std::rc::{Rc, Weak};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::connection::{Connection, ValueKey};
use crate::dataset::{Dataset, DrillDownRequest};
use crate::notify::{Notifier, SubscriptionId};
use crate::pool::ConnectionPool;
use crate::types::{ConnectionRequest, Cut, CutValue, RequestKind};

pub use readiness::{ReadinessAggregator, ReadinessPolicy};
pub use spec::{DimensionSpec, ElementSpec, FieldRef};

#[derive(Debug, Error)]
pub enum ElementError {
    #[error("Element has no dimension with a field id")]
    NoDependencies,
    #[error("No observation at index {0}")]
    ObservationMissing(usize),
    #[error("Value cannot be used as a cut: {0}")]
    InvalidCutValue(Value),
    #[error("Invalid element spec: {0}")]
    Spec(#[from] serde_json::Error),
}

/// Events an element publishes to its own subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    /// One of the element's connections changed. Check `is_ready()`.
    Ready { loaded_count: u64 },
    AddCut(Cut),
    RemoveCut(Vec<String>),
}

// A value whose id carries a numeric parent reference can be drilled into.
const PARENT_PATTERN: &str = r"\d+";

// The pattern is a constant, so compilation only fails if the literal is
// edited into something invalid; in that case nothing is drillable.
fn parent_pattern() -> Option<&'static Regex> {
    static PARENT: OnceLock<Option<Regex>> = OnceLock::new();
    PARENT.get_or_init(|| Regex::new(PARENT_PATTERN).ok()).as_ref()
}

fn parent_reference(id: &Value) -> Option<String> {
    let pattern = parent_pattern()?;
    let id = match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    pattern.find(&id).map(|m| m.as_str().to_string())
}

/// A chart's view of its data: the connections it depends on, the readiness
/// of those connections, and the cut/drill-down actions it can trigger.
///
/// The connection set is fixed at construction. Dropping the element
/// unsubscribes it from every connection.
pub struct Element {
    spec: ElementSpec,
    dataset: Rc<dyn Dataset>,
    api_root: String,
    field_id: String,
    dimensions: Vec<Rc<Connection>>,
    observations: Vec<Rc<Connection>>,
    readiness: Rc<ReadinessAggregator>,
    events: Rc<Notifier<ElementEvent>>,
    subscriptions: Vec<(Rc<Connection>, SubscriptionId)>,
}

impl Element {
    pub fn new(spec: ElementSpec, pool: &mut ConnectionPool) -> Result<Self, ElementError> {
        let mut dimensions = Vec::new();
        let mut observations = Vec::new();

        for dimension in &spec.dimensions {
            let Some(field) = &dimension.field.id else {
                continue;
            };

            let mut request = ConnectionRequest::dimensions(field.clone());
            request.bucket = dimension.bucket.clone();
            request.measure = spec.measure.id.clone();
            request.aggregation = spec.aggregation.clone();

            let observation_request = request.clone().with_kind(RequestKind::Observations);
            dimensions.push(pool.get_or_create(request));
            observations.push(pool.get_or_create(observation_request));
        }

        let field_id = match observations.first().and_then(|o| o.dimension()) {
            Some(field) => field.to_string(),
            None => return Err(ElementError::NoDependencies),
        };

        let sources: Vec<Rc<Connection>> = dimensions.iter().chain(observations.iter()).cloned().collect();
        let readiness = Rc::new(ReadinessAggregator::new(pool.config().readiness, sources.clone())?);
        let events: Rc<Notifier<ElementEvent>> = Rc::new(Notifier::new());

        let subscriptions = sources
            .into_iter()
            .enumerate()
            .map(|(slot, source)| {
                let readiness: Weak<ReadinessAggregator> = Rc::downgrade(&readiness);
                let events: Weak<Notifier<ElementEvent>> = Rc::downgrade(&events);
                let id = source.subscribe(move |_| {
                    let Some(readiness) = readiness.upgrade() else {
                        return;
                    };
                    let loaded_count = readiness.record(slot);
                    if let Some(events) = events.upgrade() {
                        events.notify(&ElementEvent::Ready { loaded_count });
                    }
                });
                (source, id)
            })
            .collect();

        debug!(
            element = %spec.id,
            sources = readiness.source_count(),
            "element bound to connections"
        );

        Ok(Self {
            dataset: Rc::clone(pool.dataset()),
            api_root: pool.config().api_root.clone(),
            spec,
            field_id,
            dimensions,
            observations,
            readiness,
            events,
            subscriptions,
        })
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn spec(&self) -> &ElementSpec {
        &self.spec
    }

    pub fn dimensions(&self) -> &[Rc<Connection>] {
        &self.dimensions
    }

    pub fn observation_connections(&self) -> &[Rc<Connection>] {
        &self.observations
    }

    pub fn loaded_count(&self) -> u64 {
        self.readiness.loaded_count()
    }

    /// True once every connection has loaded and a full round of change
    /// notifications has been seen (see [`ReadinessPolicy`]).
    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ElementEvent) + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn url(&self) -> Option<String> {
        let visualisation = self.spec.visualisation.as_ref()?;
        Some(format!(
            "{}/datasets/{}/visualisations/{}/elements/{}",
            self.api_root.trim_end_matches('/'),
            self.dataset.id(),
            visualisation,
            self.spec.id
        ))
    }

    /// Handle a click on the feature (bar, row, point) at `index`.
    ///
    /// Flat dimensions toggle a cut on the clicked value. Hierarchical ones
    /// drill into the value instead, when its id carries a parent reference.
    /// Returns `false` without doing anything if the element is not
    /// interactive.
    pub fn feature_click(&self, index: usize) -> Result<bool, ElementError> {
        if !self.spec.interactive {
            return Ok(false);
        }

        let observation = self
            .observation(index)
            .ok_or(ElementError::ObservationMissing(index))?;
        let id = observation.get("id").cloned().unwrap_or(Value::Null);

        match self.dataset.dimension_hierarchy(&self.field_id) {
            None => {
                if self.has_cut_id(&id) {
                    self.remove_cut();
                } else {
                    let value = CutValue::from_json(&id).ok_or_else(|| ElementError::InvalidCutValue(id.clone()))?;
                    self.add_cut(value);
                }
            }
            Some(hierarchy) => {
                let level = observation.get(&hierarchy.level_field).cloned().unwrap_or(Value::Null);
                if let Some(parent_id) = parent_reference(&id) {
                    self.dataset.drill_down(DrillDownRequest {
                        dimension: self.field_id.clone(),
                        level,
                        parent_id,
                    });
                }
            }
        }

        Ok(true)
    }

    /// Ask for the element's field to be cut on `value`. The dataset owns
    /// the cut; this only publishes the request.
    pub fn add_cut(&self, value: impl Into<CutValue>) {
        let cut = Cut::single(self.field_id.clone(), value);
        self.events.notify(&ElementEvent::AddCut(cut));
    }

    pub fn remove_cut(&self) {
        self.events.notify(&ElementEvent::RemoveCut(vec![self.field_id.clone()]));
    }

    pub fn measure_label(&self) -> Option<&str> {
        self.spec.measure_label.as_deref()
    }

    pub fn labels(&self) -> Vec<Value> {
        self.dimensions[0].get_data()
    }

    /// Dimension record for `value.id`, or `value` itself with an empty
    /// label when the dimension does not know the id.
    pub fn label(&self, value: &Value) -> Value {
        let known = value
            .get("id")
            .and_then(|id| self.dimensions[0].get_value(ValueKey::Id(id)));
        if let Some(label) = known {
            return label;
        }

        let mut fallback = value.clone();
        if let Value::Object(map) = &mut fallback {
            map.entry("label").or_insert_with(|| Value::String(String::new()));
        }
        fallback
    }

    pub fn observations(&self) -> Vec<Value> {
        self.observations[0].get_data()
    }

    pub fn observation(&self, index: usize) -> Option<Value> {
        self.observations[0].get_value(ValueKey::Index(index))
    }

    pub fn total(&self) -> Option<f64> {
        self.observations[0].get_total()
    }

    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    pub fn cut(&self) -> Option<CutValue> {
        self.dataset.get_cut(&self.field_id)
    }

    pub fn is_cut(&self) -> bool {
        self.dataset.is_cut(&self.field_id)
    }

    pub fn has_cut_id(&self, id: &Value) -> bool {
        self.dataset.has_cut_id(&self.field_id, id)
    }

    pub fn has_cut_value(&self, index: usize) -> bool {
        self.dataset.has_cut_value(&self.field_id, index)
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        for (source, id) in self.subscriptions.drain(..) {
            source.unsubscribe(id);
        }
    }
}
