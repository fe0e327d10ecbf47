//! Coordinator use case
//!
//! The coordinator owns every piece of mutable state (stage configurations,
//! proposals, verdicts and sub-decision handles) and is the only thing that
//! changes it. All write operations take `&mut self`, so transitions are
//! serialized; each one either commits fully or returns an error with
//! nothing written and nothing published.
//!
//! | Operation                | Permission            | Module       |
//! |--------------------------|-----------------------|--------------|
//! | `set_stages`             | `UpdateStages`        | `configure`  |
//! | `set_trusted_forwarder`  | `SetTrustedForwarder` | `configure`  |
//! | `set_target_config`      | `SetTargetConfig`     | `configure`  |
//! | `create_proposal`        | `CreateProposal`      | `create`     |
//! | `report_result`          | none                  | `report`     |
//! | `advance_proposal`       | final stage only      | `advance`    |
//! | `execute`                | `ExecuteProposal`     | `advance`    |

mod advance;
mod configure;
mod context;
mod create;
mod report;
mod transaction;
mod types;

pub use context::CallContext;
pub use types::{AdvanceOutcome, CoordinatorError, CreateProposalInput};

use crate::config::CoordinatorSettings;
use crate::ports::action_executor::ActionExecutor;
use crate::ports::authorizer::Authorizer;
use crate::ports::body::BodyDirectory;
use crate::ports::capability_probe::CapabilityProbe;
use crate::ports::clock::Clock;
use crate::ports::event_sink::EventSink;
use crate::stores::{LedgerKey, ProposalStore, ResultLedger, StageConfigStore};
use crate::use_cases::dispatch::BudgetMeter;
use serde::{Deserialize, Serialize};
use staged_domain::{
    ConfigIndex, Identity, Permission, Proposal, ProposalError, ProposalId, ProposalStatus,
    ResultKind, Stage, StageConfiguration, StageId, SubDecisionHandle, TargetConfig,
};
use std::sync::Arc;
use tracing::debug;

/// External collaborators of a coordinator
#[derive(Clone)]
pub struct CoordinatorPorts {
    pub authorizer: Arc<dyn Authorizer>,
    pub probe: Arc<dyn CapabilityProbe>,
    pub bodies: Arc<dyn BodyDirectory>,
    pub executor: Arc<dyn ActionExecutor>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
}

/// Everything a coordinator persists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorState {
    pub configs: StageConfigStore,
    pub proposals: ProposalStore,
    pub ledger: ResultLedger,
    pub trusted_forwarder: Option<Identity>,
    pub target: TargetConfig,
}

impl CoordinatorState {
    /// Empty state seeded with the settings' initial forwarder and target
    pub fn initial(settings: &CoordinatorSettings) -> Self {
        Self {
            configs: StageConfigStore::new(),
            proposals: ProposalStore::new(),
            ledger: ResultLedger::new(),
            trusted_forwarder: settings.trusted_forwarder.clone(),
            target: settings.target.clone(),
        }
    }
}

/// The stage-advancement coordinator
pub struct Coordinator {
    settings: CoordinatorSettings,
    ports: CoordinatorPorts,
    state: CoordinatorState,
}

impl Coordinator {
    pub fn new(settings: CoordinatorSettings, ports: CoordinatorPorts) -> Self {
        let state = CoordinatorState::initial(&settings);
        Self::restore(settings, ports, state)
    }

    /// Rebuild a coordinator from a snapshot
    pub fn restore(
        settings: CoordinatorSettings,
        ports: CoordinatorPorts,
        state: CoordinatorState,
    ) -> Self {
        debug!(
            "Coordinator {} holding {} proposals at configuration {}",
            settings.id,
            state.proposals.len(),
            state.configs.current_index()
        );
        Self {
            settings,
            ports,
            state,
        }
    }

    pub fn snapshot(&self) -> CoordinatorState {
        self.state.clone()
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    // ==================== Reads ====================

    pub fn current_config_index(&self) -> ConfigIndex {
        self.state.configs.current_index()
    }

    pub fn stages(&self, index: ConfigIndex) -> Option<&[Stage]> {
        self.state.configs.stages(index)
    }

    pub fn trusted_forwarder(&self) -> Option<&Identity> {
        self.state.trusted_forwarder.as_ref()
    }

    pub fn target_config(&self) -> &TargetConfig {
        &self.state.target
    }

    pub fn proposal(&self, id: &ProposalId) -> Option<&Proposal> {
        self.state.proposals.get(id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.state.proposals.iter()
    }

    /// Verdict reported by `body`, if any
    pub fn body_result(
        &self,
        id: &ProposalId,
        stage: StageId,
        body: &Identity,
    ) -> Option<ResultKind> {
        self.state
            .ledger
            .verdict(&LedgerKey::new(*id, stage, body.clone()))
    }

    /// Handle recorded when `body` was dispatched to, if it was
    pub fn sub_decision_handle(
        &self,
        id: &ProposalId,
        stage: StageId,
        body: &Identity,
    ) -> Option<SubDecisionHandle> {
        self.state
            .ledger
            .handle(&LedgerKey::new(*id, stage, body.clone()))
    }

    pub fn status(&self, id: &ProposalId) -> Option<ProposalStatus> {
        let proposal = self.proposal(id)?;
        let config = self.state.configs.get(proposal.stage_config_index)?;
        Some(proposal.status(config.stages(), self.ports.clock.now()))
    }

    // ==================== Helpers ====================

    fn caller<'a>(&'a self, ctx: &'a CallContext) -> &'a Identity {
        ctx.resolve(self.state.trusted_forwarder.as_ref())
    }

    fn is_granted(&self, caller: &Identity, permission: Permission) -> bool {
        self.ports.authorizer.is_granted(caller, permission)
    }

    fn authorize(&self, caller: &Identity, permission: Permission) -> Result<(), CoordinatorError> {
        if self.is_granted(caller, permission) {
            Ok(())
        } else {
            Err(CoordinatorError::Unauthorized {
                caller: caller.clone(),
                permission,
            })
        }
    }

    fn budget(&self, ctx: &CallContext) -> BudgetMeter {
        BudgetMeter::new(ctx.budget.unwrap_or(self.settings.dispatch_budget))
    }

    /// The configuration a proposal was created under
    fn config_of(&self, proposal: &Proposal) -> Result<&StageConfiguration, ProposalError> {
        self.state
            .configs
            .get(proposal.stage_config_index)
            .ok_or(ProposalError::UnknownConfiguration {
                index: proposal.stage_config_index,
            })
    }
}
