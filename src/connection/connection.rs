use std::cell::RefCell;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::connection::data::{id_key, ConnectionData, ValueKey};
use crate::notify::{Notifier, SubscriptionId};
use crate::types::{ConnectionRequest, Cut, DatasetId, Fingerprint, RequestKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Pending,
    Loaded,
    Failed,
}

/// Chosen once, at construction, from whether the request named a dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionVariant {
    Base,
    /// Keeps an id index over loaded rows for `ValueKey::Id` lookups.
    Dimensional { dimension: String },
}

impl ConnectionVariant {
    pub fn for_request(request: &ConnectionRequest) -> Self {
        match &request.dimension {
            Some(dimension) => ConnectionVariant::Dimensional {
                dimension: dimension.clone(),
            },
            None => ConnectionVariant::Base,
        }
    }
}

/// Change notifications published by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Loaded(Fingerprint),
    CutChanged(Fingerprint),
}

#[derive(Debug)]
struct ConnectionState {
    load: LoadState,
    data: ConnectionData,
    index: BTreeMap<String, usize>,
    loaded_at: Option<DateTime<Utc>>,
    failure: Option<String>,
}

/// A shared, asynchronously populated data source.
///
/// Connections are handed out as `Rc<Connection>` by the pool; every holder
/// observes the same cut and load state.
#[derive(Debug)]
pub struct Connection {
    id: Fingerprint,
    dataset: DatasetId,
    variant: ConnectionVariant,
    request: ConnectionRequest,
    cut: RefCell<Cut>,
    state: RefCell<ConnectionState>,
    events: Notifier<ConnectionEvent>,
}

impl Connection {
    /// `request.cut` is ignored here; the pool resolves the effective cut.
    pub fn new(id: Fingerprint, dataset: DatasetId, request: ConnectionRequest, cut: Cut) -> Self {
        let variant = ConnectionVariant::for_request(&request);
        Self {
            id,
            dataset,
            variant,
            request,
            cut: RefCell::new(cut),
            state: RefCell::new(ConnectionState {
                load: LoadState::Pending,
                data: ConnectionData::default(),
                index: BTreeMap::new(),
                loaded_at: None,
                failure: None,
            }),
            events: Notifier::new(),
        }
    }

    pub fn id(&self) -> &Fingerprint {
        &self.id
    }

    pub fn dataset(&self) -> &DatasetId {
        &self.dataset
    }

    pub fn kind(&self) -> &RequestKind {
        &self.request.kind
    }

    pub fn variant(&self) -> &ConnectionVariant {
        &self.variant
    }

    pub fn request(&self) -> &ConnectionRequest {
        &self.request
    }

    pub fn dimension(&self) -> Option<&str> {
        match &self.variant {
            ConnectionVariant::Dimensional { dimension } => Some(dimension),
            ConnectionVariant::Base => None,
        }
    }

    pub fn cut(&self) -> Cut {
        self.cut.borrow().clone()
    }

    /// Replace the cut. The connection needs reloading afterwards, and every
    /// subscriber is told.
    pub fn set_cut(&self, cut: Cut) {
        *self.cut.borrow_mut() = cut;
        self.state.borrow_mut().load = LoadState::Pending;
        debug!(connection = %self.id, "cut changed");
        self.events.notify(&ConnectionEvent::CutChanged(self.id.clone()));
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().load
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == LoadState::Loaded
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().loaded_at
    }

    pub fn failure(&self) -> Option<String> {
        self.state.borrow().failure.clone()
    }

    /// Called by the loader once the fetch for this connection finished.
    pub fn complete_load(&self, data: ConnectionData) {
        {
            let mut state = self.state.borrow_mut();
            state.index = match self.variant {
                ConnectionVariant::Dimensional { .. } => index_rows(&data.rows),
                ConnectionVariant::Base => BTreeMap::new(),
            };
            state.data = data;
            state.load = LoadState::Loaded;
            state.loaded_at = Some(Utc::now());
            state.failure = None;
        }
        debug!(connection = %self.id, "loaded");
        self.events.notify(&ConnectionEvent::Loaded(self.id.clone()));
    }

    /// Record a failed fetch. No change is published: dependents simply
    /// never become ready.
    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(connection = %self.id, %reason, "load failed");
        let mut state = self.state.borrow_mut();
        state.load = LoadState::Failed;
        state.failure = Some(reason);
    }

    pub fn get_value(&self, key: ValueKey<'_>) -> Option<Value> {
        let state = self.state.borrow();
        match key {
            ValueKey::Index(i) => state.data.rows.get(i).cloned(),
            ValueKey::Id(id) => {
                let wanted = id_key(id)?;
                match self.variant {
                    ConnectionVariant::Dimensional { .. } => state
                        .index
                        .get(&wanted)
                        .and_then(|&i| state.data.rows.get(i))
                        .cloned(),
                    ConnectionVariant::Base => state
                        .data
                        .rows
                        .iter()
                        .find(|row| row.get("id").and_then(id_key).as_deref() == Some(wanted.as_str()))
                        .cloned(),
                }
            }
        }
    }

    pub fn get_data(&self) -> Vec<Value> {
        self.state.borrow().data.rows.clone()
    }

    pub fn get_total(&self) -> Option<f64> {
        self.state.borrow().data.total
    }

    /// `{api_root}/datasets/{dataset}/{kind}`, plus `/{dimension}` for
    /// dimension connections.
    pub fn path(&self, api_root: &str) -> String {
        let mut path = format!(
            "{}/datasets/{}/{}",
            api_root.trim_end_matches('/'),
            self.dataset,
            self.request.kind
        );
        if let (RequestKind::Dimensions, Some(dimension)) = (&self.request.kind, self.dimension()) {
            path.push('/');
            path.push_str(dimension);
        }
        path
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ConnectionEvent) + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }
}

// First occurrence wins when ids repeat.
fn index_rows(rows: &[Value]) -> BTreeMap<String, usize> {
    let mut index = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        if let Some(key) = row.get("id").and_then(id_key) {
            index.entry(key).or_insert(i);
        }
    }
    index
}
