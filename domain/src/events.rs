//! Lifecycle events emitted by the coordinator
//!
//! Events are published only after the operation that produced them commits;
//! a failed operation emits nothing.

use crate::core::identity::Identity;
use crate::proposal::{Action, AllowFailureMap, ProposalId, SubDecisionId, TargetConfig};
use crate::stage::{ConfigIndex, ResultKind, Stage, StageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by the coordinator as proposals move through their stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposalEvent {
    // === Configuration ===
    /// A new stage configuration version was stored
    StagesUpdated {
        config_index: ConfigIndex,
        stages: Vec<Stage>,
    },
    /// The trusted forwarder changed (or was cleared)
    TrustedForwarderUpdated { forwarder: Option<Identity> },
    /// The execution target changed
    TargetConfigUpdated { target: TargetConfig },

    // === Proposal lifecycle ===
    ProposalCreated {
        proposal_id: ProposalId,
        creator: Identity,
        start_date: DateTime<Utc>,
        metadata: Vec<u8>,
        payload: Vec<Action>,
        allow_failure_map: AllowFailureMap,
    },
    /// A body accepted a sub-decision request
    SubDecisionCreated {
        proposal_id: ProposalId,
        stage_id: StageId,
        body: Identity,
        sub_decision_id: SubDecisionId,
    },
    /// A body's sub-decision request failed; `reason` is the raw failure payload
    SubDecisionNotCreated {
        proposal_id: ProposalId,
        stage_id: StageId,
        body: Identity,
        reason: Vec<u8>,
    },
    ResultReported {
        proposal_id: ProposalId,
        stage_id: StageId,
        body: Identity,
        result_kind: ResultKind,
    },
    /// The proposal entered `stage_id`
    ProposalAdvanced {
        proposal_id: ProposalId,
        stage_id: StageId,
    },
    ProposalExecuted { proposal_id: ProposalId },
}

impl ProposalEvent {
    /// Event type identifier, matching the serialized `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            ProposalEvent::StagesUpdated { .. } => "stages_updated",
            ProposalEvent::TrustedForwarderUpdated { .. } => "trusted_forwarder_updated",
            ProposalEvent::TargetConfigUpdated { .. } => "target_config_updated",
            ProposalEvent::ProposalCreated { .. } => "proposal_created",
            ProposalEvent::SubDecisionCreated { .. } => "sub_decision_created",
            ProposalEvent::SubDecisionNotCreated { .. } => "sub_decision_not_created",
            ProposalEvent::ResultReported { .. } => "result_reported",
            ProposalEvent::ProposalAdvanced { .. } => "proposal_advanced",
            ProposalEvent::ProposalExecuted { .. } => "proposal_executed",
        }
    }

    /// The proposal this event concerns, if any
    pub fn proposal_id(&self) -> Option<&ProposalId> {
        match self {
            ProposalEvent::ProposalCreated { proposal_id, .. }
            | ProposalEvent::SubDecisionCreated { proposal_id, .. }
            | ProposalEvent::SubDecisionNotCreated { proposal_id, .. }
            | ProposalEvent::ResultReported { proposal_id, .. }
            | ProposalEvent::ProposalAdvanced { proposal_id, .. }
            | ProposalEvent::ProposalExecuted { proposal_id } => Some(proposal_id),
            ProposalEvent::StagesUpdated { .. }
            | ProposalEvent::TrustedForwarderUpdated { .. }
            | ProposalEvent::TargetConfigUpdated { .. } => None,
        }
    }
}
