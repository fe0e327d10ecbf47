//! Per-body verdicts and sub-decision handles

use serde::{Deserialize, Serialize};
use staged_domain::{Identity, ProposalId, ResultKind, StageId, SubDecisionHandle};
use std::collections::HashMap;

/// Key of every ledger entry: one body, in one stage, of one proposal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub proposal_id: ProposalId,
    pub stage_id: StageId,
    pub body: Identity,
}

impl LedgerKey {
    pub fn new(proposal_id: ProposalId, stage_id: StageId, body: impl Into<Identity>) -> Self {
        Self {
            proposal_id,
            stage_id,
            body: body.into(),
        }
    }
}

/// Reported verdicts and dispatched sub-decision handles
///
/// Absence of a verdict means "not yet reported"; absence of a handle means
/// "never dispatched" (manual bodies, or stages not reached yet).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LedgerSnapshot", into = "LedgerSnapshot")]
pub struct ResultLedger {
    verdicts: HashMap<LedgerKey, ResultKind>,
    handles: HashMap<LedgerKey, SubDecisionHandle>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verdict(&self, key: &LedgerKey) -> Option<ResultKind> {
        self.verdicts.get(key).copied()
    }

    /// Record a verdict, returning the one it replaced
    pub fn record_verdict(&mut self, key: LedgerKey, kind: ResultKind) -> Option<ResultKind> {
        self.verdicts.insert(key, kind)
    }

    /// Put back a verdict returned by [`record_verdict`](Self::record_verdict)
    pub fn restore_verdict(&mut self, key: LedgerKey, previous: Option<ResultKind>) {
        match previous {
            Some(kind) => {
                self.verdicts.insert(key, kind);
            }
            None => {
                self.verdicts.remove(&key);
            }
        }
    }

    pub fn handle(&self, key: &LedgerKey) -> Option<SubDecisionHandle> {
        self.handles.get(key).copied()
    }

    pub fn record_handle(&mut self, key: LedgerKey, handle: SubDecisionHandle) {
        self.handles.insert(key, handle);
    }
}

/// Serialized form: JSON maps need string keys, so entries are listed
#[derive(Serialize, Deserialize)]
struct LedgerSnapshot {
    verdicts: Vec<(LedgerKey, ResultKind)>,
    handles: Vec<(LedgerKey, SubDecisionHandle)>,
}

impl From<LedgerSnapshot> for ResultLedger {
    fn from(snapshot: LedgerSnapshot) -> Self {
        Self {
            verdicts: snapshot.verdicts.into_iter().collect(),
            handles: snapshot.handles.into_iter().collect(),
        }
    }
}

impl From<ResultLedger> for LedgerSnapshot {
    fn from(ledger: ResultLedger) -> Self {
        let mut verdicts: Vec<_> = ledger.verdicts.into_iter().collect();
        let mut handles: Vec<_> = ledger.handles.into_iter().collect();
        verdicts.sort_by(|a, b| sort_key(&a.0).cmp(&sort_key(&b.0)));
        handles.sort_by(|a, b| sort_key(&a.0).cmp(&sort_key(&b.0)));
        Self { verdicts, handles }
    }
}

fn sort_key(key: &LedgerKey) -> (&ProposalId, StageId, &Identity) {
    (&key.proposal_id, key.stage_id, &key.body)
}
