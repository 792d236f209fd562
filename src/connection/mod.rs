pub mod connection;
pub mod data;

pub use connection::{Connection, ConnectionEvent, ConnectionVariant, LoadState};
pub use data::{ConnectionData, ValueKey};
