//! Proposal creation

use super::transaction::Transaction;
use super::{CallContext, Coordinator, CoordinatorError, CreateProposalInput};
use crate::use_cases::dispatch::{BodyDispatcher, DispatchPlan};
use staged_domain::{Permission, Proposal, ProposalError, ProposalEvent, ProposalId};
use tracing::info;

impl Coordinator {
    /// Create a proposal under the current stage configuration and dispatch
    /// its first stage.
    pub async fn create_proposal(
        &mut self,
        ctx: &CallContext,
        input: CreateProposalInput,
    ) -> Result<ProposalId, CoordinatorError> {
        let caller = self.caller(ctx).clone();
        self.authorize(&caller, Permission::CreateProposal)?;

        let config = self
            .state
            .configs
            .current()
            .ok_or(ProposalError::Unconfigured)?;
        let first_stage = config
            .stages()
            .first()
            .ok_or(ProposalError::Unconfigured)?;

        let id = ProposalId::derive(&input.payload, &input.metadata);
        if self.state.proposals.contains(&id) {
            return Err(ProposalError::AlreadyExists { id }.into());
        }

        let now = self.ports.clock.now();
        let start = match input.start_date {
            Some(start) if start < now => {
                return Err(ProposalError::InvalidStartDate { start, now }.into());
            }
            Some(start) => start,
            None => now,
        };

        let proposal = Proposal {
            id,
            creator: caller.clone(),
            payload: input.payload,
            metadata: input.metadata,
            allow_failure_map: input.allow_failure_map,
            last_stage_transition: start,
            current_stage: 0,
            stage_config_index: config.index(),
            executed: false,
            target: self.state.target.clone(),
            custom_params: input.custom_params,
        };

        let mut tx = Transaction::new();
        tx.emit(ProposalEvent::ProposalCreated {
            proposal_id: id,
            creator: caller.clone(),
            start_date: start,
            metadata: proposal.metadata.clone(),
            payload: proposal.payload.clone(),
            allow_failure_map: proposal.allow_failure_map,
        });

        let mut meter = self.budget(ctx);
        let outcomes = BodyDispatcher::new(&self.settings.id, self.ports.bodies.as_ref())
            .dispatch(
                DispatchPlan {
                    proposal_id: id,
                    stage_id: 0,
                    stage: first_stage,
                    start,
                    params: proposal.stage_params(0),
                },
                &mut meter,
            )
            .await?;
        tx.absorb(outcomes);

        info!(
            "{} created proposal {} under configuration {}",
            caller,
            id.short(),
            proposal.stage_config_index
        );
        self.state.proposals.insert(proposal)?;
        tx.commit(&mut self.state.ledger, self.ports.events.as_ref());
        Ok(id)
    }
}
