pub mod config;
pub mod pool;

use thiserror::Error;

pub use config::PoolConfig;
pub use pool::ConnectionPool;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    Config(#[from] serde_json::Error),
}
