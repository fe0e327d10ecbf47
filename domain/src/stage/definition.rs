//! Stage definition, validation and timing windows

use super::body::Body;
use crate::core::error::ConfigurationError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Position of a stage within a configuration (0-indexed)
pub type StageId = usize;

/// One ordered phase of evaluation with its own bodies, windows and thresholds
///
/// All windows are measured from the proposal's last stage transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Bodies evaluating this stage, in dispatch order
    pub bodies: Vec<Body>,
    /// After this long the stage can no longer advance
    pub max_advance: Duration,
    /// The stage cannot advance before this long has passed
    pub min_advance: Duration,
    /// Voting window handed to bodies; vetoes are awaited for this long
    pub vote_duration: Duration,
    /// Approvals required to pass
    pub approval_threshold: usize,
    /// Vetoes that block the stage; 0 disables veto gating
    pub veto_threshold: usize,
}

impl Stage {
    /// Check the per-stage invariants.
    pub fn validate(&self, stage: StageId) -> Result<(), ConfigurationError> {
        if self.min_advance >= self.max_advance {
            return Err(ConfigurationError::MinAdvanceNotBelowMax { stage });
        }
        if self.vote_duration >= self.max_advance {
            return Err(ConfigurationError::VoteDurationNotBelowMax { stage });
        }

        let bodies = self.bodies.len();
        if self.approval_threshold > bodies {
            return Err(ConfigurationError::ApprovalThresholdTooHigh {
                stage,
                threshold: self.approval_threshold,
                bodies,
            });
        }
        if self.veto_threshold > bodies {
            return Err(ConfigurationError::VetoThresholdTooHigh {
                stage,
                threshold: self.veto_threshold,
                bodies,
            });
        }

        let mut seen = HashSet::with_capacity(bodies);
        for body in &self.bodies {
            if !seen.insert(&body.address) {
                return Err(ConfigurationError::DuplicateBody {
                    stage,
                    body: body.address.clone(),
                });
            }
        }

        Ok(())
    }

    /// Whether vetoes are counted (and awaited) in this stage
    pub fn is_veto_gated(&self) -> bool {
        self.veto_threshold > 0
    }

    /// Bodies that receive sub-decision requests
    pub fn automatic_bodies(&self) -> impl Iterator<Item = (usize, &Body)> {
        self.bodies.iter().enumerate().filter(|(_, b)| !b.is_manual)
    }

    /// Voting period handed to bodies when the stage starts at `start`
    pub fn voting_period(&self, start: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = start
            .checked_add_signed(delta(self.vote_duration))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (start, end)
    }

    /// Timing window for this stage, anchored at `since`
    pub fn window(&self, since: DateTime<Utc>) -> StageWindow<'_> {
        StageWindow { stage: self, since }
    }
}

/// Timing checks for a stage entered at `since`
#[derive(Debug, Clone, Copy)]
pub struct StageWindow<'a> {
    stage: &'a Stage,
    since: DateTime<Utc>,
}

impl StageWindow<'_> {
    /// `now` lies within `[since + min_advance, since + max_advance]`
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.since);
        elapsed >= delta(self.stage.min_advance) && elapsed <= delta(self.stage.max_advance)
    }

    /// `now` is past `since + max_advance`; the stage can never advance again
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.since) > delta(self.stage.max_advance)
    }

    /// Vetoes can no longer arrive: either veto gating is off or the vote has ended
    pub fn veto_period_elapsed(&self, now: DateTime<Utc>) -> bool {
        !self.stage.is_veto_gated()
            || now.signed_duration_since(self.since) >= delta(self.stage.vote_duration)
    }
}

// Durations beyond TimeDelta's range saturate.
fn delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}
