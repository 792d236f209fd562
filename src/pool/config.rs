use serde::{Deserialize, Serialize};

use crate::element::ReadinessPolicy;
use crate::fingerprint::DEFAULT_UNIQUE_PREFIX;
use crate::pool::PoolError;
use crate::types::Cut;

// Serializable, comparable, explicit defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Cut given to new connections whose request carries none. Falls back
    /// to the dataset's cut when absent.
    pub default_cut: Option<Cut>,
    /// Prefix of the tokens handed to uncacheable requests.
    pub unique_prefix: String,
    pub api_root: String,
    /// Readiness rule applied by elements built on this pool.
    pub readiness: ReadinessPolicy,
}

impl PoolConfig {
    pub fn v0() -> Self {
        Self {
            default_cut: None,
            unique_prefix: DEFAULT_UNIQUE_PREFIX.into(),
            api_root: "/api".into(),
            readiness: ReadinessPolicy::RoundCount,
        }
    }

    pub fn with_default_cut(mut self, cut: Cut) -> Self {
        self.default_cut = Some(cut);
        self
    }

    pub fn with_readiness(mut self, readiness: ReadinessPolicy) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, PoolError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::v0()
    }
}
