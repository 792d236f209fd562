use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::connection::Connection;
use crate::element::ElementError;

/// How an element decides that all of its data has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessPolicy {
    /// `loaded_count % N == 0` and every source loaded. Repeated
    /// notifications from one source can stand in for a source that never
    /// fired.
    #[default]
    RoundCount,
    /// Every subscription has notified at least once and every source is
    /// loaded.
    DistinctSources,
}

/// Counts change notifications from a fixed set of sources and answers
/// whether the set is ready.
///
/// Slot `i` is the `i`-th subscription; the same connection may occupy more
/// than one slot.
#[derive(Debug)]
pub struct ReadinessAggregator {
    policy: ReadinessPolicy,
    sources: Vec<Rc<Connection>>,
    loaded: Cell<u64>,
    fired: RefCell<Vec<bool>>,
}

impl ReadinessAggregator {
    pub fn new(policy: ReadinessPolicy, sources: Vec<Rc<Connection>>) -> Result<Self, ElementError> {
        if sources.is_empty() {
            return Err(ElementError::NoDependencies);
        }
        let fired = vec![false; sources.len()];
        Ok(Self {
            policy,
            sources,
            loaded: Cell::new(0),
            fired: RefCell::new(fired),
        })
    }

    /// Count one notification delivered to `slot`. Returns the new count.
    pub fn record(&self, slot: usize) -> u64 {
        let count = self.loaded.get() + 1;
        self.loaded.set(count);
        if let Some(flag) = self.fired.borrow_mut().get_mut(slot) {
            *flag = true;
        }
        trace!(slot, count, "source changed");
        count
    }

    pub fn loaded_count(&self) -> u64 {
        self.loaded.get()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn sources(&self) -> &[Rc<Connection>] {
        &self.sources
    }

    pub fn policy(&self) -> ReadinessPolicy {
        self.policy
    }

    /// Evaluated on every call; nothing is cached.
    pub fn is_ready(&self) -> bool {
        let heard_from_all = match self.policy {
            ReadinessPolicy::RoundCount => self.loaded.get() % self.sources.len() as u64 == 0,
            ReadinessPolicy::DistinctSources => self.fired.borrow().iter().all(|&f| f),
        };
        heard_from_all && self.sources.iter().all(|source| source.is_loaded())
    }
}
