//! Sub-decision body port
//!
//! Bodies are external decision makers. The coordinator only needs two things
//! from them: create a sub-decision for a proposal stage, and say whether that
//! sub-decision has succeeded.
//!
//! # Reporting back
//!
//! A body never calls into the coordinator while a request is being handled.
//! The request carries a [`ResultCallback`] describing the report the body is
//! expected to make once its own process concludes; the body (or whoever
//! drives it) later delivers that report as an ordinary `report_result` call.
//!
//! ```text
//! Coordinator                         Body
//!     │ create_sub_decision(request) ──▶│
//!     │◀── SubDecisionReceipt ──────────│
//!     ┆            (later)              ┆
//!     │◀── report_result(callback) ─────│
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staged_domain::{Identity, ProposalId, ResultKind, StageId, SubDecisionId};
use std::sync::Arc;
use thiserror::Error;

/// Back-reference identifying which proposal stage a sub-decision belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    pub coordinator: Identity,
    pub proposal_id: ProposalId,
    pub stage_id: StageId,
}

/// The report a body is expected to deliver when its sub-decision concludes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCallback {
    pub proposal_id: ProposalId,
    pub stage_id: StageId,
    pub result_kind: ResultKind,
    pub try_advance: bool,
}

/// Everything a body receives when a stage starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDecisionRequest {
    pub correlation: Correlation,
    pub callback: ResultCallback,
    /// Start of the stage's voting period
    pub window_start: DateTime<Utc>,
    /// `window_start + vote_duration`
    pub window_end: DateTime<Utc>,
    /// Body-specific parameters supplied at proposal creation
    pub custom_params: Vec<u8>,
}

/// Resource quota forwarded to a single body call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallBudget(pub u64);

/// A body accepted the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubDecisionReceipt {
    pub sub_decision_id: SubDecisionId,
    /// Budget units the call used
    pub consumed: u64,
}

/// A body call failed
///
/// `reason` is the raw failure payload, kept verbatim for the
/// `SubDecisionNotCreated` event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("body call failed after consuming {consumed} budget units: {}", String::from_utf8_lossy(.reason))]
pub struct BodyCallFailure {
    pub reason: Vec<u8>,
    pub consumed: u64,
}

impl BodyCallFailure {
    pub fn new(reason: impl Into<Vec<u8>>, consumed: u64) -> Self {
        Self {
            reason: reason.into(),
            consumed,
        }
    }
}

/// Port implemented by every automatic body
#[async_trait]
pub trait SubDecisionBody: Send + Sync {
    /// Create a sub-decision for a proposal stage, within `budget`
    async fn create_sub_decision(
        &self,
        request: &SubDecisionRequest,
        budget: CallBudget,
    ) -> Result<SubDecisionReceipt, BodyCallFailure>;

    /// Whether the sub-decision has concluded successfully
    async fn has_succeeded(&self, id: SubDecisionId) -> Result<bool, BodyCallFailure>;
}

/// Resolves body identities to live implementations
pub trait BodyDirectory: Send + Sync {
    fn resolve(&self, address: &Identity) -> Option<Arc<dyn SubDecisionBody>>;
}
