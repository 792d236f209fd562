use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use crate::connection::Connection;
use crate::dataset::Dataset;
use crate::fingerprint::{build_fingerprint, UniqueIdGenerator};
use crate::pool::PoolConfig;
use crate::types::{ConnectionRequest, Fingerprint};

/// Dataset-scoped get-or-create cache of connections.
///
/// One pool per dataset; it lives exactly as long as the dataset does.
/// Entries are never evicted or invalidated: a request that needs different
/// data must produce a different fingerprint.
pub struct ConnectionPool {
    dataset: Rc<dyn Dataset>,
    config: PoolConfig,
    ids: UniqueIdGenerator,
    connections: BTreeMap<Fingerprint, Rc<Connection>>,
}

impl ConnectionPool {
    pub fn new(dataset: Rc<dyn Dataset>, config: PoolConfig) -> Self {
        let ids = UniqueIdGenerator::new(config.unique_prefix.clone());
        Self {
            dataset,
            config,
            ids,
            connections: BTreeMap::new(),
        }
    }

    pub fn fingerprint(&self, request: &ConnectionRequest) -> Fingerprint {
        build_fingerprint(request, &self.ids)
    }

    /// Resolve `request` to its shared connection.
    ///
    /// A hit returns the existing connection untouched, even if the request
    /// carries a different cut. A miss builds the connection with the
    /// request's cut, else the configured default cut, else the dataset's
    /// current cut.
    pub fn get_or_create(&mut self, mut request: ConnectionRequest) -> Rc<Connection> {
        let id = self.fingerprint(&request);

        if let Some(existing) = self.connections.get(&id) {
            debug!(dataset = %self.dataset.id(), connection = %id, "pool hit");
            return Rc::clone(existing);
        }

        let cut = request
            .cut
            .take()
            .or_else(|| self.config.default_cut.clone())
            .unwrap_or_else(|| self.dataset.cut());

        let connection = Rc::new(Connection::new(
            id.clone(),
            self.dataset.id().clone(),
            request,
            cut,
        ));
        debug!(dataset = %self.dataset.id(), connection = %id, "pool miss, created");

        self.connections.insert(id, Rc::clone(&connection));
        connection
    }

    pub fn get(&self, id: &Fingerprint) -> Option<Rc<Connection>> {
        self.connections.get(id).cloned()
    }

    pub fn contains(&self, id: &Fingerprint) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Fingerprints in lexicographic order.
    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.connections.keys()
    }

    pub fn dataset(&self) -> &Rc<dyn Dataset> {
        &self.dataset
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}
