//! Scripted bodies for simulations
//!
//! A [`ScriptedBody`] accepts (or rejects) every sub-decision request and
//! remembers the callback that came with it. When the scenario lets the
//! body's sub-decisions succeed, the body marks them succeeded (so polling
//! sees them) and, if asked to, queues a [`BodyReport`] on a channel. The
//! driver drains that channel and delivers each report to the coordinator
//! as an ordinary `report_result` call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use staged_application::{
    BodyCallFailure, BodyDirectory, CallBudget, Capability, CapabilityProbe, ResultCallback,
    SubDecisionBody, SubDecisionReceipt, SubDecisionRequest,
};
use staged_domain::{Identity, SubDecisionId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Budget units a scripted call consumes
const CALL_COST: u64 = 5_000;

/// How a scripted body answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyBehavior {
    /// Create a sub-decision for every request
    #[default]
    Accept,
    /// Fail every request
    Reject,
    /// Fail after consuming everything it was given
    Exhaust,
    /// Fail the capability probe
    Unsupported,
}

/// A report a body wants delivered to the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyReport {
    pub body: Identity,
    pub callback: ResultCallback,
}

pub struct ScriptedBody {
    address: Identity,
    behavior: BodyBehavior,
    next_id: AtomicU64,
    open: Mutex<Vec<(SubDecisionId, ResultCallback)>>,
    succeeded: Mutex<HashSet<SubDecisionId>>,
    reports: mpsc::UnboundedSender<BodyReport>,
}

impl ScriptedBody {
    pub fn new(
        address: impl Into<Identity>,
        behavior: BodyBehavior,
        reports: mpsc::UnboundedSender<BodyReport>,
    ) -> Self {
        Self {
            address: address.into(),
            behavior,
            next_id: AtomicU64::new(0),
            open: Mutex::new(Vec::new()),
            succeeded: Mutex::new(HashSet::new()),
            reports,
        }
    }

    pub fn address(&self) -> &Identity {
        &self.address
    }

    pub fn behavior(&self) -> BodyBehavior {
        self.behavior
    }

    /// Let every open sub-decision succeed.
    ///
    /// With `report`, each one also queues a [`BodyReport`] carrying its
    /// callback. Returns how many sub-decisions concluded.
    pub fn succeed_all(&self, report: bool) -> usize {
        let concluded: Vec<(SubDecisionId, ResultCallback)> = match self.open.lock() {
            Ok(mut open) => std::mem::take(&mut *open),
            Err(e) => {
                warn!("Body {} has no readable open sub-decisions: {}", self.address, e);
                return 0;
            }
        };

        match self.succeeded.lock() {
            Ok(mut succeeded) => succeeded.extend(concluded.iter().map(|(id, _)| *id)),
            Err(e) => warn!("Body {} could not record successes: {}", self.address, e),
        }
        if report {
            for (_, callback) in &concluded {
                let sent = self.reports.send(BodyReport {
                    body: self.address.clone(),
                    callback: callback.clone(),
                });
                if sent.is_err() {
                    warn!(
                        "Body {} could not queue its report for proposal {}: channel closed",
                        self.address,
                        callback.proposal_id.short()
                    );
                }
            }
        }
        debug!(
            "Body {} concluded {} sub-decisions",
            self.address,
            concluded.len()
        );
        concluded.len()
    }
}

#[async_trait]
impl SubDecisionBody for ScriptedBody {
    async fn create_sub_decision(
        &self,
        request: &SubDecisionRequest,
        budget: CallBudget,
    ) -> Result<SubDecisionReceipt, BodyCallFailure> {
        match self.behavior {
            BodyBehavior::Accept | BodyBehavior::Unsupported => {}
            BodyBehavior::Reject => {
                return Err(BodyCallFailure::new(
                    format!("{} rejected the request", self.address).into_bytes(),
                    CALL_COST.min(budget.0),
                ));
            }
            BodyBehavior::Exhaust => {
                return Err(BodyCallFailure::new(b"out of budget".to_vec(), budget.0));
            }
        }
        if budget.0 < CALL_COST {
            return Err(BodyCallFailure::new(b"out of budget".to_vec(), budget.0));
        }

        let id = SubDecisionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut open) = self.open.lock() {
            open.push((id, request.callback.clone()));
        }
        Ok(SubDecisionReceipt {
            sub_decision_id: id,
            consumed: CALL_COST,
        })
    }

    async fn has_succeeded(&self, id: SubDecisionId) -> Result<bool, BodyCallFailure> {
        self.succeeded
            .lock()
            .map(|succeeded| succeeded.contains(&id))
            .map_err(|_| BodyCallFailure::new(b"state unavailable".to_vec(), 0))
    }
}

/// Directory of scripted bodies; also answers capability probes
#[derive(Default)]
pub struct BodyRegistry {
    bodies: HashMap<Identity, Arc<ScriptedBody>>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, body: ScriptedBody) -> Arc<ScriptedBody> {
        let body = Arc::new(body);
        self.bodies.insert(body.address().clone(), Arc::clone(&body));
        body
    }

    pub fn get(&self, address: &Identity) -> Option<&Arc<ScriptedBody>> {
        self.bodies.get(address)
    }
}

impl BodyDirectory for BodyRegistry {
    fn resolve(&self, address: &Identity) -> Option<Arc<dyn SubDecisionBody>> {
        self.bodies
            .get(address)
            .map(|body| Arc::clone(body) as Arc<dyn SubDecisionBody>)
    }
}

#[async_trait]
impl CapabilityProbe for BodyRegistry {
    async fn supports(&self, body: &Identity, capability: Capability) -> bool {
        match capability {
            Capability::SubDecision => self
                .bodies
                .get(body)
                .is_some_and(|b| b.behavior() != BodyBehavior::Unsupported),
        }
    }
}
