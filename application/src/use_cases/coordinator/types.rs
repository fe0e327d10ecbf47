//! Types for the coordinator use case

use crate::ports::action_executor::ExecutionError;
use crate::use_cases::dispatch::DispatchError;
use chrono::{DateTime, Utc};
use staged_domain::{
    Action, AllowFailureMap, ConfigurationError, Identity, Permission, ProposalError, ProposalId,
    StageId,
};
use thiserror::Error;

/// Errors returned by coordinator operations.
///
/// Whenever one is returned the coordinator state is unchanged and no event
/// was published.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("{caller} is not granted {permission}")]
    Unauthorized {
        caller: Identity,
        permission: Permission,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Proposal(#[from] ProposalError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Execution of proposal {id} failed: {source}")]
    Execution {
        id: ProposalId,
        #[source]
        source: ExecutionError,
    },
}

/// Input for [`Coordinator::create_proposal`](super::Coordinator::create_proposal)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateProposalInput {
    pub payload: Vec<Action>,
    pub metadata: Vec<u8>,
    pub allow_failure_map: AllowFailureMap,
    /// When stage 0 starts; `None` means now
    pub start_date: Option<DateTime<Utc>>,
    /// Custom parameters per stage, then per body index
    pub custom_params: Vec<Vec<Vec<u8>>>,
}

impl CreateProposalInput {
    pub fn new(payload: Vec<Action>, metadata: impl Into<Vec<u8>>) -> Self {
        Self {
            payload,
            metadata: metadata.into(),
            ..Self::default()
        }
    }

    pub fn with_allow_failure_map(mut self, map: AllowFailureMap) -> Self {
        self.allow_failure_map = map;
        self
    }

    pub fn with_start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn with_custom_params(mut self, params: Vec<Vec<Vec<u8>>>) -> Self {
        self.custom_params = params;
        self
    }
}

/// What a successful advance did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The proposal entered this stage
    Advanced { stage: StageId },
    /// The payload was executed
    Executed,
}
