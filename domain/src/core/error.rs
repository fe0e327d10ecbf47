//! Domain error types

use crate::core::identity::Identity;
use crate::proposal::ProposalId;
use crate::stage::{ConfigIndex, StageId};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors rejecting a stage configuration update.
///
/// Any of these aborts the whole update; no partial configuration is stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Stage configuration must contain at least one stage")]
    EmptyStages,

    #[error("Stage {stage}: min_advance must be shorter than max_advance")]
    MinAdvanceNotBelowMax { stage: StageId },

    #[error("Stage {stage}: vote_duration must be shorter than max_advance")]
    VoteDurationNotBelowMax { stage: StageId },

    #[error("Stage {stage}: approval threshold {threshold} exceeds body count {bodies}")]
    ApprovalThresholdTooHigh {
        stage: StageId,
        threshold: usize,
        bodies: usize,
    },

    #[error("Stage {stage}: veto threshold {threshold} exceeds body count {bodies}")]
    VetoThresholdTooHigh {
        stage: StageId,
        threshold: usize,
        bodies: usize,
    },

    #[error("Stage {stage}: body {body} appears more than once")]
    DuplicateBody { stage: StageId, body: Identity },

    #[error("Stage {stage}: body {body} does not support sub-decisions")]
    UnsupportedBody { stage: StageId, body: Identity },

    #[error("Stage configuration index {found} found where {expected} was expected")]
    IndexOutOfOrder {
        expected: ConfigIndex,
        found: ConfigIndex,
    },
}

/// Errors raised by proposal operations. State is unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProposalError {
    #[error("No stage configuration has been set")]
    Unconfigured,

    #[error("Stage configuration {index} does not exist")]
    UnknownConfiguration { index: ConfigIndex },

    #[error("Proposal {id} already exists")]
    AlreadyExists { id: ProposalId },

    #[error("Start date {start} is earlier than now ({now})")]
    InvalidStartDate {
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("Proposal {id} does not exist")]
    NonexistentProposal { id: ProposalId },

    #[error("Proposal {id}: stage {stage} is ahead of current stage {current}")]
    StageTooAdvanced {
        id: ProposalId,
        stage: StageId,
        current: StageId,
    },

    #[error("Proposal {id} cannot advance")]
    CannotAdvance { id: ProposalId },

    #[error("Proposal {id} cannot be executed")]
    CannotExecute { id: ProposalId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let error = ConfigurationError::ApprovalThresholdTooHigh {
            stage: 1,
            threshold: 4,
            bodies: 3,
        };
        assert_eq!(
            error.to_string(),
            "Stage 1: approval threshold 4 exceeds body count 3"
        );
    }

    #[test]
    fn test_stage_too_advanced_display() {
        let id = ProposalId::derive(&[], b"meta");
        let error = ProposalError::StageTooAdvanced {
            id,
            stage: 2,
            current: 0,
        };
        assert!(error.to_string().contains("stage 2 is ahead of current stage 0"));
    }
}
