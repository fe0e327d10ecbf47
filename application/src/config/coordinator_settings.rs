//! Coordinator settings: static parameters of one coordinator instance.
//!
//! These are application-layer concerns, not domain policy: stage timing and
//! thresholds live in the stage configuration, which is versioned and can
//! change at runtime. Settings are fixed for the coordinator's lifetime
//! (the forwarder and target are only *initial* values).

use serde::{Deserialize, Serialize};
use staged_domain::{ExecutionMode, Identity, TargetConfig};

/// Default budget for the body calls of a single operation.
pub const DEFAULT_DISPATCH_BUDGET: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorSettings {
    /// Identity of the coordinator, sent to bodies as the correlation reference.
    pub id: Identity,
    /// Budget used when a call does not bring its own.
    pub dispatch_budget: u64,
    /// Trusted forwarder installed at startup.
    pub trusted_forwarder: Option<Identity>,
    /// Execution target installed at startup.
    pub target: TargetConfig,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            id: Identity::new("staged-quorum"),
            dispatch_budget: DEFAULT_DISPATCH_BUDGET,
            trusted_forwarder: None,
            target: TargetConfig::new("dao", ExecutionMode::Call),
        }
    }
}

impl CoordinatorSettings {
    // ==================== Builder Methods ====================

    pub fn with_id(mut self, id: impl Into<Identity>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_dispatch_budget(mut self, budget: u64) -> Self {
        self.dispatch_budget = budget;
        self
    }

    pub fn with_trusted_forwarder(mut self, forwarder: impl Into<Identity>) -> Self {
        self.trusted_forwarder = Some(forwarder.into());
        self
    }

    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.target = target;
        self
    }
}
