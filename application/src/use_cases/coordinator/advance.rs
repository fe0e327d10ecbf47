//! Advance controller
//!
//! ```text
//! InStage(0) ──▶ InStage(1) ──▶ … ──▶ InFinalStage ──▶ Executed
//!      │              │                    │
//!      └──────────────┴────── Expired ◀────┘   (now > last + max_advance)
//! ```
//!
//! Every transition requires the current stage's window to be open, the
//! veto period to be over for veto-gated stages, and the stage tally to meet
//! its thresholds. The last transition also requires `ExecuteProposal`.

use super::transaction::Transaction;
use super::{AdvanceOutcome, CallContext, Coordinator, CoordinatorError};
use crate::ports::action_executor::{ExecutionReceipt, ExecutionRequest};
use crate::use_cases::dispatch::{BodyDispatcher, BudgetMeter, DispatchPlan};
use crate::use_cases::tally::TallyEngine;
use chrono::{DateTime, Utc};
use staged_domain::{
    Permission, Proposal, ProposalError, ProposalEvent, ProposalId, StageId, Tally,
};
use tracing::{debug, info, warn};

/// A transition computed but not yet committed
pub(super) struct Transition {
    pub(super) proposal: Proposal,
    pub(super) outcome: AdvanceOutcome,
    pub(super) receipt: Option<ExecutionReceipt>,
    pub(super) tx: Transaction,
}

impl Coordinator {
    // ==================== Predicates ====================

    /// Approvals and vetoes for the proposal's current stage
    pub async fn tally(&self, id: &ProposalId) -> Result<Tally, ProposalError> {
        let proposal = self.state.proposals.require(id)?;
        let config = self.config_of(proposal)?;
        let stage = config
            .stages()
            .get(proposal.current_stage)
            .ok_or(ProposalError::UnknownConfiguration {
                index: proposal.stage_config_index,
            })?;
        Ok(TallyEngine::new(&self.state.ledger, self.ports.bodies.as_ref())
            .tally(proposal, stage)
            .await)
    }

    /// Whether the proposal could move on right now, ignoring authorization
    pub async fn can_proposal_advance(&self, id: &ProposalId) -> bool {
        let now = self.ports.clock.now();
        match self.state.proposals.get(id) {
            Some(proposal) => self.is_eligible(proposal, now).await.unwrap_or(false),
            None => false,
        }
    }

    /// Whether the proposal is in its final stage and could be executed now
    pub async fn can_execute(&self, id: &ProposalId) -> bool {
        let Some(proposal) = self.state.proposals.get(id) else {
            return false;
        };
        self.is_in_final_stage(proposal) && self.can_proposal_advance(id).await
    }

    /// Whether the proposal has passed its final stage.
    ///
    /// Unlike [`can_execute`](Self::can_execute) this ignores `min_advance`
    /// and `max_advance`: a proposal that succeeded stays succeeded after its
    /// execution window closes.
    pub async fn has_succeeded(&self, id: &ProposalId) -> bool {
        let Some(proposal) = self.state.proposals.get(id) else {
            return false;
        };
        if proposal.executed {
            return true;
        }
        if !self.is_in_final_stage(proposal) {
            return false;
        }
        let Ok(config) = self.config_of(proposal) else {
            return false;
        };
        let Some(stage) = config.stages().get(proposal.current_stage) else {
            return false;
        };
        let now = self.ports.clock.now();
        if !stage
            .window(proposal.last_stage_transition)
            .veto_period_elapsed(now)
        {
            return false;
        }
        TallyEngine::new(&self.state.ledger, self.ports.bodies.as_ref())
            .tally(proposal, stage)
            .await
            .thresholds_met(stage)
    }

    pub(super) fn is_in_final_stage(&self, proposal: &Proposal) -> bool {
        self.config_of(proposal)
            .map(|config| proposal.current_stage >= config.final_stage())
            .unwrap_or(false)
    }

    pub(super) async fn is_eligible(
        &self,
        proposal: &Proposal,
        now: DateTime<Utc>,
    ) -> Result<bool, ProposalError> {
        if proposal.executed {
            return Ok(false);
        }
        let config = self.config_of(proposal)?;
        let Some(stage) = config.stages().get(proposal.current_stage) else {
            return Ok(false);
        };

        let window = stage.window(proposal.last_stage_transition);
        if !window.is_open(now) {
            debug!(
                "Proposal {} stage {} outside its advance window",
                proposal.id.short(),
                proposal.current_stage
            );
            return Ok(false);
        }
        if !window.veto_period_elapsed(now) {
            debug!(
                "Proposal {} stage {} still in its veto period",
                proposal.id.short(),
                proposal.current_stage
            );
            return Ok(false);
        }

        let tally = TallyEngine::new(&self.state.ledger, self.ports.bodies.as_ref())
            .tally(proposal, stage)
            .await;
        Ok(tally.thresholds_met(stage))
    }

    // ==================== Operations ====================

    /// Move an eligible proposal to its next stage, or execute it when it is
    /// in its final stage.
    pub async fn advance_proposal(
        &mut self,
        ctx: &CallContext,
        id: &ProposalId,
    ) -> Result<AdvanceOutcome, CoordinatorError> {
        let caller = self.caller(ctx).clone();
        let proposal = self.state.proposals.require(id)?;
        let now = self.ports.clock.now();

        if !self.is_eligible(proposal, now).await? {
            return Err(ProposalError::CannotAdvance { id: *id }.into());
        }
        if self.is_in_final_stage(proposal) {
            self.authorize(&caller, Permission::ExecuteProposal)?;
        }

        let mut meter = self.budget(ctx);
        let transition = self.transition(proposal, now, &mut meter).await?;
        let outcome = transition.outcome;
        self.apply(transition);
        Ok(outcome)
    }

    /// Execute a proposal that has passed its final stage
    pub async fn execute(
        &mut self,
        ctx: &CallContext,
        id: &ProposalId,
    ) -> Result<ExecutionReceipt, CoordinatorError> {
        let caller = self.caller(ctx).clone();
        self.authorize(&caller, Permission::ExecuteProposal)?;

        let proposal = self.state.proposals.require(id)?;
        let now = self.ports.clock.now();
        if !self.is_in_final_stage(proposal) || !self.is_eligible(proposal, now).await? {
            return Err(ProposalError::CannotExecute { id: *id }.into());
        }

        let mut meter = self.budget(ctx);
        let mut transition = self.transition(proposal, now, &mut meter).await?;
        let receipt = transition.receipt.take().unwrap_or_default();
        self.apply(transition);
        Ok(receipt)
    }

    // ==================== Transitions ====================

    /// Compute the next transition of an eligible proposal without writing
    /// anything.
    pub(super) async fn transition(
        &self,
        proposal: &Proposal,
        now: DateTime<Utc>,
        meter: &mut BudgetMeter,
    ) -> Result<Transition, CoordinatorError> {
        if self.is_in_final_stage(proposal) {
            self.execution(proposal).await
        } else {
            self.advancement(proposal, now, meter).await
        }
    }

    async fn advancement(
        &self,
        proposal: &Proposal,
        now: DateTime<Utc>,
        meter: &mut BudgetMeter,
    ) -> Result<Transition, CoordinatorError> {
        let config = self.config_of(proposal)?;
        let mut advanced = proposal.clone();
        advanced.advance(now);
        let next: StageId = advanced.current_stage;
        let stage = config
            .stages()
            .get(next)
            .ok_or(ProposalError::CannotAdvance { id: proposal.id })?;

        let mut tx = Transaction::new();
        let outcomes = BodyDispatcher::new(&self.settings.id, self.ports.bodies.as_ref())
            .dispatch(
                DispatchPlan {
                    proposal_id: proposal.id,
                    stage_id: next,
                    stage,
                    start: now,
                    params: advanced.stage_params(next),
                },
                meter,
            )
            .await?;
        tx.absorb(outcomes);
        tx.emit(ProposalEvent::ProposalAdvanced {
            proposal_id: proposal.id,
            stage_id: next,
        });

        info!("Proposal {} advanced to stage {}", proposal.id.short(), next);
        Ok(Transition {
            proposal: advanced,
            outcome: AdvanceOutcome::Advanced { stage: next },
            receipt: None,
            tx,
        })
    }

    async fn execution(&self, proposal: &Proposal) -> Result<Transition, CoordinatorError> {
        let request = ExecutionRequest {
            target: &proposal.target.target,
            correlation_id: &proposal.id,
            actions: &proposal.payload,
            allow_failure_map: proposal.allow_failure_map,
            mode: proposal.target.mode,
        };
        let receipt = self.ports.executor.execute(request).await.map_err(|source| {
            warn!("Execution of proposal {} failed: {}", proposal.id.short(), source);
            CoordinatorError::Execution {
                id: proposal.id,
                source,
            }
        })?;

        let mut executed = proposal.clone();
        executed.executed = true;

        let mut tx = Transaction::new();
        tx.emit(ProposalEvent::ProposalExecuted {
            proposal_id: proposal.id,
        });

        info!(
            "Proposal {} executed on {} (failure map {:#b})",
            proposal.id.short(),
            proposal.target.target,
            receipt.failure_map
        );
        Ok(Transition {
            proposal: executed,
            outcome: AdvanceOutcome::Executed,
            receipt: Some(receipt),
            tx,
        })
    }

    /// Commit a computed transition
    pub(super) fn apply(&mut self, transition: Transition) {
        self.commit(transition.proposal, transition.tx);
    }

    pub(super) fn commit(&mut self, proposal: Proposal, tx: Transaction) {
        if let Ok(stored) = self.state.proposals.require_mut(&proposal.id) {
            *stored = proposal;
        }
        tx.commit(&mut self.state.ledger, self.ports.events.as_ref());
    }
}
