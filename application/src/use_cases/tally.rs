//! Stage tallying
//!
//! Counts approvals and vetoes for the current stage of a proposal. Reported
//! verdicts win; automatic bodies that have not reported are polled, and a
//! successful sub-decision counts with the body's configured result kind.

use crate::ports::body::BodyDirectory;
use crate::stores::{LedgerKey, ResultLedger};
use staged_domain::{Body, Proposal, ResultKind, Stage, SubDecisionHandle, Tally};
use tracing::{debug, warn};

pub struct TallyEngine<'a> {
    ledger: &'a ResultLedger,
    bodies: &'a dyn BodyDirectory,
}

impl<'a> TallyEngine<'a> {
    pub fn new(ledger: &'a ResultLedger, bodies: &'a dyn BodyDirectory) -> Self {
        Self { ledger, bodies }
    }

    /// Tally `stage`, which must be the proposal's current stage
    pub async fn tally(&self, proposal: &Proposal, stage: &Stage) -> Tally {
        let mut tally = Tally::default();
        for body in &stage.bodies {
            tally.record(self.classify(proposal, body).await);
        }
        debug!(
            "Tally for proposal {} stage {}: {}",
            proposal.id.short(),
            proposal.current_stage,
            tally
        );
        tally
    }

    async fn classify(&self, proposal: &Proposal, body: &Body) -> ResultKind {
        let key = LedgerKey::new(proposal.id, proposal.current_stage, body.address.clone());

        match self.ledger.verdict(&key) {
            Some(kind) if kind != ResultKind::None => return kind,
            _ => {}
        }
        if body.is_manual {
            return ResultKind::None;
        }
        let Some(SubDecisionHandle::Created(id)) = self.ledger.handle(&key) else {
            return ResultKind::None;
        };
        let Some(target) = self.bodies.resolve(&body.address) else {
            debug!("Body {} no longer resolves; not polled", body.address);
            return ResultKind::None;
        };

        match target.has_succeeded(id).await {
            Ok(true) => body.result_kind,
            Ok(false) => ResultKind::None,
            Err(e) => {
                warn!("Polling body {} for sub-decision {} failed: {}", body.address, id, e);
                ResultKind::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::body::{
        BodyCallFailure, CallBudget, SubDecisionBody, SubDecisionReceipt, SubDecisionRequest,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use staged_domain::{
        AllowFailureMap, ConfigIndex, ExecutionMode, Identity, ProposalId, SubDecisionId,
        TargetConfig,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    // === Mock implementations ===

    struct MockBody {
        succeeded: Result<bool, BodyCallFailure>,
        polls: AtomicUsize,
    }

    impl MockBody {
        fn new(succeeded: Result<bool, BodyCallFailure>) -> Arc<Self> {
            Arc::new(Self {
                succeeded,
                polls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SubDecisionBody for MockBody {
        async fn create_sub_decision(
            &self,
            _request: &SubDecisionRequest,
            _budget: CallBudget,
        ) -> Result<SubDecisionReceipt, BodyCallFailure> {
            Err(BodyCallFailure::new(Vec::new(), 0))
        }

        async fn has_succeeded(&self, _id: SubDecisionId) -> Result<bool, BodyCallFailure> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.succeeded.clone()
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

    fn proposal() -> Proposal {
        Proposal {
            id: ProposalId::derive(&[], b"tally"),
            creator: "alice".into(),
            payload: vec![],
            metadata: b"tally".to_vec(),
            allow_failure_map: AllowFailureMap::default(),
            last_stage_transition: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            current_stage: 0,
            stage_config_index: ConfigIndex::new(1),
            executed: false,
            target: TargetConfig::new("dao", ExecutionMode::Call),
            custom_params: vec![],
        }
    }

    fn stage(bodies: Vec<Body>) -> Stage {
        Stage {
            bodies,
            max_advance: Duration::from_secs(100),
            min_advance: Duration::ZERO,
            vote_duration: Duration::ZERO,
            approval_threshold: 1,
            veto_threshold: 0,
        }
    }

    fn key(p: &Proposal, body: &str) -> LedgerKey {
        LedgerKey::new(p.id, p.current_stage, body)
    }

    #[tokio::test]
    async fn test_reported_verdicts_are_counted_without_polling() {
        let a = MockBody::new(Ok(true));
        let directory = MockDirectory(HashMap::from([("a".into(), a.clone())]));
        let p = proposal();
        let mut ledger = ResultLedger::new();
        ledger.record_handle(key(&p, "a"), SubDecisionHandle::Created(SubDecisionId(1)));
        ledger.record_verdict(key(&p, "a"), ResultKind::Veto);
        ledger.record_verdict(key(&p, "m"), ResultKind::Approval);

        let s = stage(vec![
            Body::automatic("a", ResultKind::Approval),
            Body::manual("m", ResultKind::Veto),
        ]);
        let tally = TallyEngine::new(&ledger, &directory).tally(&p, &s).await;

        assert_eq!(tally, Tally::new(1, 1));
        assert_eq!(a.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_succeeded_sub_decision_uses_default_kind() {
        let a = MockBody::new(Ok(true));
        let b = MockBody::new(Ok(false));
        let directory = MockDirectory(HashMap::from([
            ("a".into(), a.clone()),
            ("b".into(), b.clone()),
        ]));
        let p = proposal();
        let mut ledger = ResultLedger::new();
        ledger.record_handle(key(&p, "a"), SubDecisionHandle::Created(SubDecisionId(0)));
        ledger.record_handle(key(&p, "b"), SubDecisionHandle::Created(SubDecisionId(1)));
        // An explicit `None` report does not stop polling
        ledger.record_verdict(key(&p, "a"), ResultKind::None);

        let s = stage(vec![
            Body::automatic("a", ResultKind::Veto),
            Body::automatic("b", ResultKind::Approval),
        ]);
        let tally = TallyEngine::new(&ledger, &directory).tally(&p, &s).await;

        assert_eq!(tally, Tally::new(0, 1));
        assert_eq!(b.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_not_created_and_manual_bodies_are_not_polled() {
        let a = MockBody::new(Ok(true));
        let m = MockBody::new(Ok(true));
        let directory = MockDirectory(HashMap::from([
            ("a".into(), a.clone()),
            ("m".into(), m.clone()),
        ]));
        let p = proposal();
        let mut ledger = ResultLedger::new();
        ledger.record_handle(key(&p, "a"), SubDecisionHandle::NotCreated);

        let s = stage(vec![
            Body::automatic("a", ResultKind::Approval),
            Body::manual("m", ResultKind::Approval),
        ]);
        let tally = TallyEngine::new(&ledger, &directory).tally(&p, &s).await;

        assert_eq!(tally, Tally::default());
        assert_eq!(a.polls.load(Ordering::SeqCst), 0);
        assert_eq!(m.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_poll_failure_is_swallowed() {
        let a = MockBody::new(Err(BodyCallFailure::new(b"down".to_vec(), 0)));
        let b = MockBody::new(Ok(true));
        let directory = MockDirectory(HashMap::from([
            ("a".into(), a.clone()),
            ("b".into(), b.clone()),
        ]));
        let p = proposal();
        let mut ledger = ResultLedger::new();
        ledger.record_handle(key(&p, "a"), SubDecisionHandle::Created(SubDecisionId(1)));
        ledger.record_handle(key(&p, "b"), SubDecisionHandle::Created(SubDecisionId(2)));

        let s = stage(vec![
            Body::automatic("a", ResultKind::Approval),
            Body::automatic("b", ResultKind::Approval),
        ]);
        let tally = TallyEngine::new(&ledger, &directory).tally(&p, &s).await;

        assert_eq!(tally, Tally::new(1, 0));
    }

    #[tokio::test]
    async fn test_only_current_stage_is_counted() {
        let directory = MockDirectory(HashMap::new());
        let mut p = proposal();
        let mut ledger = ResultLedger::new();
        ledger.record_verdict(key(&p, "m"), ResultKind::Approval);
        p.current_stage = 1;

        let s = stage(vec![Body::manual("m", ResultKind::Approval)]);
        let tally = TallyEngine::new(&ledger, &directory).tally(&p, &s).await;

        assert_eq!(tally, Tally::default());
    }
}
