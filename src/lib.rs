//! Connection deduplication and readiness tracking for data visualisation
//! elements.
//!
//! `connection-core` maps data requests onto canonical fingerprints, shares
//! one connection per fingerprint through a dataset-scoped pool, and tells an
//! element when every connection it depends on has loaded. Everything is
//! single-threaded and synchronous: connections notify their subscribers on
//! the caller's stack.

pub mod connection;
pub mod dataset;
pub mod element;
pub mod fingerprint;
pub mod notify;
pub mod pool;
pub mod types;
