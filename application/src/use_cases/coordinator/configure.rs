//! Configuration operations: stages, trusted forwarder, execution target

use super::transaction::Transaction;
use super::{CallContext, Coordinator, CoordinatorError};
use crate::ports::capability_probe::Capability;
use futures::future::join_all;
use staged_domain::{
    ConfigIndex, ConfigurationError, Identity, Permission, ProposalEvent, Stage, TargetConfig,
    validate_stages,
};
use tracing::{info, warn};

impl Coordinator {
    /// Store a new stage configuration version.
    ///
    /// Every automatic body is probed for sub-decision support first; a
    /// single unsupported body rejects the whole update.
    pub async fn set_stages(
        &mut self,
        ctx: &CallContext,
        stages: Vec<Stage>,
    ) -> Result<ConfigIndex, CoordinatorError> {
        let caller = self.caller(ctx).clone();
        self.authorize(&caller, Permission::UpdateStages)?;
        validate_stages(&stages)?;
        self.probe_bodies(&stages).await?;

        let config_index = self.state.configs.append(stages.clone())?;
        info!(
            "{} stored stage configuration {} ({} stages)",
            caller,
            config_index,
            stages.len()
        );

        let mut tx = Transaction::new();
        tx.emit(ProposalEvent::StagesUpdated {
            config_index,
            stages,
        });
        tx.commit(&mut self.state.ledger, self.ports.events.as_ref());
        Ok(config_index)
    }

    async fn probe_bodies(&self, stages: &[Stage]) -> Result<(), ConfigurationError> {
        let candidates: Vec<(usize, &Identity)> = stages
            .iter()
            .enumerate()
            .flat_map(|(stage, s)| s.automatic_bodies().map(move |(_, b)| (stage, &b.address)))
            .collect();

        let probes = candidates
            .iter()
            .map(|(_, body)| self.ports.probe.supports(body, Capability::SubDecision));
        let supported = join_all(probes).await;

        match candidates
            .iter()
            .zip(supported)
            .find(|(_, supported)| !supported)
        {
            Some(((stage, body), _)) => {
                warn!("Stage {}: body {} failed the capability probe", stage, body);
                Err(ConfigurationError::UnsupportedBody {
                    stage: *stage,
                    body: (*body).clone(),
                })
            }
            None => Ok(()),
        }
    }

    /// Install (or clear) the relay whose `original_sender` is trusted
    pub fn set_trusted_forwarder(
        &mut self,
        ctx: &CallContext,
        forwarder: Option<Identity>,
    ) -> Result<(), CoordinatorError> {
        let caller = self.caller(ctx).clone();
        self.authorize(&caller, Permission::SetTrustedForwarder)?;

        info!(
            "{} set trusted forwarder to {}",
            caller,
            forwarder.as_ref().map_or("none", Identity::as_str)
        );
        self.state.trusted_forwarder = forwarder.clone();

        let mut tx = Transaction::new();
        tx.emit(ProposalEvent::TrustedForwarderUpdated { forwarder });
        tx.commit(&mut self.state.ledger, self.ports.events.as_ref());
        Ok(())
    }

    /// Change the execution target used by proposals created from now on
    pub fn set_target_config(
        &mut self,
        ctx: &CallContext,
        target: TargetConfig,
    ) -> Result<(), CoordinatorError> {
        let caller = self.caller(ctx).clone();
        self.authorize(&caller, Permission::SetTargetConfig)?;

        info!(
            "{} set execution target to {} ({:?})",
            caller, target.target, target.mode
        );
        self.state.target = target.clone();

        let mut tx = Transaction::new();
        tx.emit(ProposalEvent::TargetConfigUpdated { target });
        tx.commit(&mut self.state.ledger, self.ports.events.as_ref());
        Ok(())
    }
}
