//! Body dispatch
//!
//! When a proposal enters a stage, every automatic body of that stage gets a
//! sub-decision request. Calls go out one at a time, in body order, and each
//! is isolated: a failing body is recorded as `NotCreated` and the remaining
//! bodies are still dispatched.
//!
//! # Budget starvation
//!
//! The enclosing operation carries a [`BudgetMeter`]. Each call is forwarded
//! at most 63/64 of what remains. A call that fails after the remaining
//! budget dropped to 1/64 or less of what was available before it counts as
//! starved: [`DispatchError::BudgetStarved`] is fatal and reverts the
//! operation.

use crate::ports::body::{
    BodyCallFailure, BodyDirectory, CallBudget, Correlation, ResultCallback, SubDecisionRequest,
};
use crate::stores::LedgerKey;
use chrono::{DateTime, Utc};
use staged_domain::{Identity, ProposalEvent, ProposalId, Stage, StageId, SubDecisionHandle};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fatal dispatch errors. Ordinary body failures are not errors; they
/// become `NotCreated` outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error(
        "Body {body} failed with {remaining} of {available} budget units left; call budget too small"
    )]
    BudgetStarved {
        body: Identity,
        remaining: u64,
        available: u64,
    },
}

/// Budget remaining for the body calls of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetMeter {
    remaining: u64,
}

impl BudgetMeter {
    pub fn new(total: u64) -> Self {
        Self { remaining: total }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// The most a single call may be forwarded: all but 1/64 of what remains
    pub fn forwardable(&self) -> u64 {
        self.remaining - self.remaining / 64
    }

    /// Deduct what a call used, capped at what it was forwarded
    fn charge(&mut self, consumed: u64, forwarded: u64) {
        self.remaining -= consumed.min(forwarded);
    }

    /// Whether a failure with `available` units before the call looks starved
    fn is_starved(&self, available: u64) -> bool {
        self.remaining <= available / 64
    }
}

/// What to dispatch: one stage of one proposal
#[derive(Debug, Clone, Copy)]
pub struct DispatchPlan<'a> {
    pub proposal_id: ProposalId,
    pub stage_id: StageId,
    pub stage: &'a Stage,
    /// Start of the voting period
    pub start: DateTime<Utc>,
    /// Custom parameters per body index
    pub params: &'a [Vec<u8>],
}

/// Result of dispatching to one body, not yet applied to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub key: LedgerKey,
    pub handle: SubDecisionHandle,
    pub event: ProposalEvent,
}

/// Sends sub-decision requests to the automatic bodies of a stage
pub struct BodyDispatcher<'a> {
    coordinator: &'a Identity,
    bodies: &'a dyn BodyDirectory,
}

impl<'a> BodyDispatcher<'a> {
    pub fn new(coordinator: &'a Identity, bodies: &'a dyn BodyDirectory) -> Self {
        Self {
            coordinator,
            bodies,
        }
    }

    /// Dispatch to every automatic body in `plan.stage`.
    ///
    /// Returns one outcome per automatic body, in body order. Manual bodies
    /// produce nothing. Only budget starvation returns an error.
    pub async fn dispatch(
        &self,
        plan: DispatchPlan<'_>,
        meter: &mut BudgetMeter,
    ) -> Result<Vec<DispatchOutcome>, DispatchError> {
        let (window_start, window_end) = plan.stage.voting_period(plan.start);
        let mut outcomes = Vec::new();

        for (index, body) in plan.stage.automatic_bodies() {
            let request = SubDecisionRequest {
                correlation: Correlation {
                    coordinator: self.coordinator.clone(),
                    proposal_id: plan.proposal_id,
                    stage_id: plan.stage_id,
                },
                callback: ResultCallback {
                    proposal_id: plan.proposal_id,
                    stage_id: plan.stage_id,
                    result_kind: body.result_kind,
                    try_advance: body.try_advance,
                },
                window_start,
                window_end,
                custom_params: plan.params.get(index).cloned().unwrap_or_default(),
            };

            let result = match self.bodies.resolve(&body.address) {
                Some(target) => {
                    let available = meter.remaining();
                    let forwarded = meter.forwardable();
                    let result = target
                        .create_sub_decision(&request, CallBudget(forwarded))
                        .await;

                    let consumed = match &result {
                        Ok(receipt) => receipt.consumed,
                        Err(failure) => failure.consumed,
                    };
                    meter.charge(consumed, forwarded);

                    if result.is_err() && meter.is_starved(available) {
                        warn!(
                            "Body {} failed with {} of {} budget units left",
                            body.address,
                            meter.remaining(),
                            available
                        );
                        return Err(DispatchError::BudgetStarved {
                            body: body.address.clone(),
                            remaining: meter.remaining(),
                            available,
                        });
                    }
                    result
                }
                None => Err(BodyCallFailure::new(b"unknown body".to_vec(), 0)),
            };

            let key = LedgerKey::new(plan.proposal_id, plan.stage_id, body.address.clone());
            let outcome = match result {
                Ok(receipt) => {
                    info!(
                        "Body {} created sub-decision {} for proposal {} stage {}",
                        body.address,
                        receipt.sub_decision_id,
                        plan.proposal_id.short(),
                        plan.stage_id
                    );
                    DispatchOutcome {
                        key,
                        handle: SubDecisionHandle::Created(receipt.sub_decision_id),
                        event: ProposalEvent::SubDecisionCreated {
                            proposal_id: plan.proposal_id,
                            stage_id: plan.stage_id,
                            body: body.address.clone(),
                            sub_decision_id: receipt.sub_decision_id,
                        },
                    }
                }
                Err(failure) => {
                    warn!(
                        "Body {} did not create a sub-decision for proposal {} stage {}: {}",
                        body.address,
                        plan.proposal_id.short(),
                        plan.stage_id,
                        failure
                    );
                    DispatchOutcome {
                        key,
                        handle: SubDecisionHandle::NotCreated,
                        event: ProposalEvent::SubDecisionNotCreated {
                            proposal_id: plan.proposal_id,
                            stage_id: plan.stage_id,
                            body: body.address.clone(),
                            reason: failure.reason,
                        },
                    }
                }
            };
            outcomes.push(outcome);
        }

        debug!(
            "Dispatched stage {} of proposal {} to {} bodies",
            plan.stage_id,
            plan.proposal_id.short(),
            outcomes.len()
        );
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::body::{SubDecisionBody, SubDecisionReceipt};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use staged_domain::{Body, ResultKind, SubDecisionId};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // === Mock implementations ===

    enum Behavior {
        Accept(u64),
        Fail { consumed: u64 },
        BurnForwarded,
    }

    struct MockBody {
        behavior: Behavior,
        requests: Mutex<Vec<(SubDecisionRequest, CallBudget)>>,
    }

    impl MockBody {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SubDecisionBody for MockBody {
        async fn create_sub_decision(
            &self,
            request: &SubDecisionRequest,
            budget: CallBudget,
        ) -> Result<SubDecisionReceipt, BodyCallFailure> {
            self.requests.lock().unwrap().push((request.clone(), budget));
            match self.behavior {
                Behavior::Accept(id) => Ok(SubDecisionReceipt {
                    sub_decision_id: SubDecisionId(id),
                    consumed: 100,
                }),
                Behavior::Fail { consumed } => Err(BodyCallFailure::new(b"nope".to_vec(), consumed)),
                Behavior::BurnForwarded => Err(BodyCallFailure::new(Vec::new(), budget.0)),
            }
        }

        async fn has_succeeded(&self, _id: SubDecisionId) -> Result<bool, BodyCallFailure> {
            Ok(false)
        }
    }

    struct MockDirectory(HashMap<Identity, Arc<MockBody>>);

    impl BodyDirectory for MockDirectory {
        fn resolve(&self, address: &Identity) -> Option<Arc<dyn SubDecisionBody>> {
            self.0
                .get(address)
                .map(|b| Arc::clone(b) as Arc<dyn SubDecisionBody>)
        }
    }

    fn stage(bodies: Vec<Body>) -> Stage {
        Stage {
            bodies,
            max_advance: Duration::from_secs(3600 * 10),
            min_advance: Duration::from_secs(3600),
            vote_duration: Duration::from_secs(3600),
            approval_threshold: 1,
            veto_threshold: 0,
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn plan<'a>(stage: &'a Stage, params: &'a [Vec<u8>]) -> DispatchPlan<'a> {
        DispatchPlan {
            proposal_id: ProposalId::derive(&[], b"dispatch"),
            stage_id: 0,
            stage,
            start: start(),
            params,
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_bodies() {
        let a = MockBody::new(Behavior::Accept(0));
        let b = MockBody::new(Behavior::Fail { consumed: 10 });
        let c = MockBody::new(Behavior::Accept(5));
        let directory = MockDirectory(HashMap::from([
            ("a".into(), a.clone()),
            ("b".into(), b.clone()),
            ("c".into(), c.clone()),
        ]));
        let stage = stage(vec![
            Body::automatic("a", ResultKind::Approval),
            Body::automatic("b", ResultKind::Approval),
            Body::automatic("c", ResultKind::Veto),
        ]);
        let coordinator = Identity::new("spp");
        let dispatcher = BodyDispatcher::new(&coordinator, &directory);

        let mut meter = BudgetMeter::new(1_000_000);
        let outcomes = dispatcher.dispatch(plan(&stage, &[]), &mut meter).await.unwrap();

        let handles: Vec<_> = outcomes.iter().map(|o| o.handle).collect();
        assert_eq!(
            handles,
            vec![
                SubDecisionHandle::Created(SubDecisionId(0)),
                SubDecisionHandle::NotCreated,
                SubDecisionHandle::Created(SubDecisionId(5)),
            ]
        );
        assert!(matches!(
            &outcomes[1].event,
            ProposalEvent::SubDecisionNotCreated { reason, .. } if reason == b"nope"
        ));
        assert_eq!(c.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_manual_bodies_are_skipped() {
        let a = MockBody::new(Behavior::Accept(1));
        let directory = MockDirectory(HashMap::from([("a".into(), a.clone())]));
        let stage = stage(vec![
            Body::manual("m", ResultKind::Veto),
            Body::automatic("a", ResultKind::Approval),
        ]);
        let coordinator = Identity::new("spp");
        let dispatcher = BodyDispatcher::new(&coordinator, &directory);

        let outcomes = dispatcher
            .dispatch(plan(&stage, &[]), &mut BudgetMeter::new(1_000))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].key.body.as_str(), "a");
    }

    #[tokio::test]
    async fn test_request_carries_window_params_and_callback() {
        let a = MockBody::new(Behavior::Accept(1));
        let directory = MockDirectory(HashMap::from([("a".into(), a.clone())]));
        let stage = stage(vec![
            Body::manual("m", ResultKind::Veto),
            Body::automatic("a", ResultKind::Approval).with_try_advance(true),
        ]);
        let params = vec![vec![9], vec![1, 2, 3]];
        let coordinator = Identity::new("spp");
        let dispatcher = BodyDispatcher::new(&coordinator, &directory);

        dispatcher
            .dispatch(plan(&stage, &params), &mut BudgetMeter::new(6_400))
            .await
            .unwrap();

        let requests = a.requests.lock().unwrap();
        let (request, budget) = &requests[0];
        assert_eq!(request.custom_params, vec![1, 2, 3]);
        assert_eq!(request.window_start, start());
        assert_eq!(request.window_end, start() + chrono::TimeDelta::hours(1));
        assert_eq!(request.correlation.coordinator.as_str(), "spp");
        assert_eq!(request.callback.result_kind, ResultKind::Approval);
        assert!(request.callback.try_advance);
        assert_eq!(budget.0, 6_300);
    }

    #[tokio::test]
    async fn test_unknown_body_is_not_created() {
        let directory = MockDirectory(HashMap::new());
        let stage = stage(vec![Body::automatic("ghost", ResultKind::Approval)]);
        let coordinator = Identity::new("spp");
        let dispatcher = BodyDispatcher::new(&coordinator, &directory);

        let outcomes = dispatcher
            .dispatch(plan(&stage, &[]), &mut BudgetMeter::new(1_000))
            .await
            .unwrap();

        assert_eq!(outcomes[0].handle, SubDecisionHandle::NotCreated);
    }

    #[tokio::test]
    async fn test_budget_starvation_is_fatal() {
        let a = MockBody::new(Behavior::BurnForwarded);
        let b = MockBody::new(Behavior::Accept(1));
        let directory = MockDirectory(HashMap::from([
            ("a".into(), a.clone()),
            ("b".into(), b.clone()),
        ]));
        let stage = stage(vec![
            Body::automatic("a", ResultKind::Approval),
            Body::automatic("b", ResultKind::Approval),
        ]);
        let coordinator = Identity::new("spp");
        let dispatcher = BodyDispatcher::new(&coordinator, &directory);

        let result = dispatcher
            .dispatch(plan(&stage, &[]), &mut BudgetMeter::new(6_400))
            .await;

        assert_eq!(
            result,
            Err(DispatchError::BudgetStarved {
                body: "a".into(),
                remaining: 100,
                available: 6_400,
            })
        );
        assert!(b.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cheap_failure_with_ample_budget_is_recoverable() {
        let a = MockBody::new(Behavior::Fail { consumed: 5_000 });
        let directory = MockDirectory(HashMap::from([("a".into(), a.clone())]));
        let stage = stage(vec![Body::automatic("a", ResultKind::Approval)]);
        let coordinator = Identity::new("spp");
        let dispatcher = BodyDispatcher::new(&coordinator, &directory);

        let mut meter = BudgetMeter::new(6_400);
        let outcomes = dispatcher.dispatch(plan(&stage, &[]), &mut meter).await.unwrap();

        assert_eq!(outcomes[0].handle, SubDecisionHandle::NotCreated);
        assert_eq!(meter.remaining(), 1_400);
    }

    #[test]
    fn test_meter_forwards_all_but_one_64th() {
        let meter = BudgetMeter::new(6_400);
        assert_eq!(meter.forwardable(), 6_300);
        assert_eq!(BudgetMeter::new(0).forwardable(), 0);
    }
}
