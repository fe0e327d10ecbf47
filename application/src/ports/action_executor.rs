//! Action executor port
//!
//! Applies a proposal's payload once the final stage has passed. What
//! "applying" means is entirely up to the adapter; the coordinator only
//! guarantees it asks at most once per proposal.

use async_trait::async_trait;
use staged_domain::{Action, AllowFailureMap, ExecutionMode, Identity, ProposalId};
use thiserror::Error;

/// Everything the executor needs to apply a payload
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    pub target: &'a Identity,
    /// Proposal id, for correlating execution records
    pub correlation_id: &'a ProposalId,
    pub actions: &'a [Action],
    pub allow_failure_map: AllowFailureMap,
    pub mode: ExecutionMode,
}

/// Outcome of a successful execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionReceipt {
    /// Per-action return data
    pub results: Vec<Vec<u8>>,
    /// Bit `i` set when action `i` failed (only possible where allowed)
    pub failure_map: u128,
}

/// Errors that abort an execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Action {index} failed and is not allowed to fail")]
    ActionFailed { index: usize },

    #[error("Execution target {0} rejected the payload")]
    TargetRejected(Identity),

    #[error("Executor error: {0}")]
    Other(String),
}

#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        request: ExecutionRequest<'_>,
    ) -> Result<ExecutionReceipt, ExecutionError>;
}
