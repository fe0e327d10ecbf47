//! Proposal entity and its lifecycle status

use super::value_objects::{Action, AllowFailureMap, ProposalId, TargetConfig};
use crate::core::identity::Identity;
use crate::stage::{ConfigIndex, Stage, StageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The unit of work progressing through stages toward execution
///
/// `stage_config_index` and `target` are frozen at creation; later
/// configuration changes never affect an existing proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    /// Resolved caller that created the proposal
    pub creator: Identity,
    pub payload: Vec<Action>,
    pub metadata: Vec<u8>,
    pub allow_failure_map: AllowFailureMap,
    /// Start date for stage 0, time of the last advance afterwards
    pub last_stage_transition: DateTime<Utc>,
    pub current_stage: StageId,
    pub stage_config_index: ConfigIndex,
    pub executed: bool,
    pub target: TargetConfig,
    /// Custom parameters per stage, per body index
    pub custom_params: Vec<Vec<Vec<u8>>>,
}

impl Proposal {
    /// Custom parameters for every body of `stage` (empty if none were supplied)
    pub fn stage_params(&self, stage: StageId) -> &[Vec<u8>] {
        self.custom_params
            .get(stage)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Move to the next stage at `now`
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.current_stage += 1;
        self.last_stage_transition = now;
    }

    /// Lifecycle status at `now` under the proposal's own `stages`
    pub fn status(&self, stages: &[Stage], now: DateTime<Utc>) -> ProposalStatus {
        let expired = stages
            .get(self.current_stage)
            .is_some_and(|stage| stage.window(self.last_stage_transition).is_expired(now));
        if self.executed {
            ProposalStatus::Executed
        } else if expired {
            ProposalStatus::Expired
        } else if self.current_stage + 1 >= stages.len() {
            ProposalStatus::InFinalStage
        } else {
            ProposalStatus::InStage(self.current_stage)
        }
    }
}

/// Position of a proposal in the stage state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// In a non-final stage
    InStage(StageId),
    /// In the last stage; passing it means execution
    InFinalStage,
    /// Terminal
    Executed,
    /// The current stage's `max_advance` passed; it can never advance again
    Expired,
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalStatus::InStage(stage) => write!(f, "In stage {}", stage),
            ProposalStatus::InFinalStage => write!(f, "In final stage"),
            ProposalStatus::Executed => write!(f, "Executed"),
            ProposalStatus::Expired => write!(f, "Expired"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::value_objects::ExecutionMode;
    use crate::stage::{Body, ResultKind};
    use chrono::TimeZone;
    use std::time::Duration;

    fn proposal() -> Proposal {
        let payload = vec![Action::new("treasury", 0, vec![1, 2])];
        Proposal {
            id: ProposalId::derive(&payload, b""),
            creator: "alice".into(),
            payload,
            metadata: vec![],
            allow_failure_map: AllowFailureMap::default(),
            last_stage_transition: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            current_stage: 0,
            stage_config_index: ConfigIndex::new(1),
            executed: false,
            target: TargetConfig::new("dao", ExecutionMode::Call),
            custom_params: vec![vec![], vec![vec![7], vec![8, 9]]],
        }
    }

    #[test]
    fn test_params_fall_back_to_empty() {
        let p = proposal();
        assert!(p.stage_params(0).is_empty());
        assert_eq!(p.stage_params(1), &[vec![7], vec![8, 9]]);
        assert!(p.stage_params(4).is_empty());
    }

    #[test]
    fn test_advance_moves_stage_and_transition() {
        let mut p = proposal();
        let later = p.last_stage_transition + chrono::TimeDelta::hours(2);
        p.advance(later);
        assert_eq!(p.current_stage, 1);
        assert_eq!(p.last_stage_transition, later);
    }

    fn stages(count: usize) -> Vec<Stage> {
        let stage = Stage {
            bodies: vec![Body::manual("m", ResultKind::Approval)],
            max_advance: Duration::from_secs(10 * 3600),
            min_advance: Duration::ZERO,
            vote_duration: Duration::ZERO,
            approval_threshold: 1,
            veto_threshold: 0,
        };
        vec![stage; count]
    }

    #[test]
    fn test_status() {
        let mut p = proposal();
        let now = p.last_stage_transition;
        assert_eq!(p.status(&stages(3), now), ProposalStatus::InStage(0));
        p.current_stage = 2;
        assert_eq!(p.status(&stages(3), now), ProposalStatus::InFinalStage);
        p.executed = true;
        assert_eq!(p.status(&stages(3), now), ProposalStatus::Executed);
    }

    #[test]
    fn test_single_stage_proposal_starts_in_final_stage() {
        let p = proposal();
        assert_eq!(
            p.status(&stages(1), p.last_stage_transition),
            ProposalStatus::InFinalStage
        );
    }

    #[test]
    fn test_status_expires_after_max_advance() {
        let mut p = proposal();
        let deadline = p.last_stage_transition + chrono::TimeDelta::hours(10);
        assert_eq!(p.status(&stages(2), deadline), ProposalStatus::InStage(0));

        let late = deadline + chrono::TimeDelta::seconds(1);
        assert_eq!(p.status(&stages(2), late), ProposalStatus::Expired);
        p.executed = true;
        assert_eq!(p.status(&stages(2), late), ProposalStatus::Executed);
    }
}
