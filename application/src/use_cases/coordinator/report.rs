//! Result reporting

use super::advance::Transition;
use super::transaction::Transaction;
use super::{AdvanceOutcome, CallContext, Coordinator, CoordinatorError};
use crate::stores::LedgerKey;
use staged_domain::{
    Identity, Permission, ProposalError, ProposalEvent, ProposalId, ResultKind, StageId,
};
use tracing::{debug, info};

impl Coordinator {
    /// Record the caller's verdict for a stage, optionally trying to advance.
    ///
    /// Anyone may report; the verdict is keyed by the resolved caller, so a
    /// report only ever counts for a body when the body itself makes it. The
    /// advance attempt is best effort: an ineligible proposal (or a final
    /// stage the caller may not execute) just keeps the verdict. If the
    /// attempt itself fails, the verdict is rolled back with it.
    pub async fn report_result(
        &mut self,
        ctx: &CallContext,
        id: &ProposalId,
        stage_id: StageId,
        result_kind: ResultKind,
        try_advance: bool,
    ) -> Result<Option<AdvanceOutcome>, CoordinatorError> {
        let caller = self.caller(ctx).clone();
        let current = self.state.proposals.require(id)?.current_stage;
        if stage_id > current {
            return Err(ProposalError::StageTooAdvanced {
                id: *id,
                stage: stage_id,
                current,
            }
            .into());
        }

        let key = LedgerKey::new(*id, stage_id, caller.clone());
        let previous = self.state.ledger.record_verdict(key.clone(), result_kind);
        info!(
            "{} reported {} for proposal {} stage {}",
            caller,
            result_kind,
            id.short(),
            stage_id
        );

        let mut tx = Transaction::new();
        tx.emit(ProposalEvent::ResultReported {
            proposal_id: *id,
            stage_id,
            body: caller.clone(),
            result_kind,
        });

        if !try_advance {
            tx.commit(&mut self.state.ledger, self.ports.events.as_ref());
            return Ok(None);
        }

        match self.attempt_advance(ctx, id, &caller).await {
            Ok(Some(transition)) => {
                let outcome = transition.outcome;
                tx.append(transition.tx);
                self.commit(transition.proposal, tx);
                Ok(Some(outcome))
            }
            Ok(None) => {
                tx.commit(&mut self.state.ledger, self.ports.events.as_ref());
                Ok(None)
            }
            Err(e) => {
                self.state.ledger.restore_verdict(key, previous);
                Err(e)
            }
        }
    }

    async fn attempt_advance(
        &self,
        ctx: &CallContext,
        id: &ProposalId,
        caller: &Identity,
    ) -> Result<Option<Transition>, CoordinatorError> {
        let proposal = self.state.proposals.require(id)?;
        let now = self.ports.clock.now();

        if !self.is_eligible(proposal, now).await? {
            debug!("Proposal {} not eligible to advance", id.short());
            return Ok(None);
        }
        if self.is_in_final_stage(proposal)
            && !self.is_granted(caller, Permission::ExecuteProposal)
        {
            debug!(
                "{} may not execute proposal {}; leaving it in its final stage",
                caller,
                id.short()
            );
            return Ok(None);
        }

        let mut meter = self.budget(ctx);
        self.transition(proposal, now, &mut meter).await.map(Some)
    }
}
