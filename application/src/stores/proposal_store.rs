//! Durable proposal records

use serde::{Deserialize, Serialize};
use staged_domain::{Proposal, ProposalError, ProposalId};
use std::collections::BTreeMap;

/// Every proposal ever created, keyed by id
///
/// Presence in the map is the existence check; records are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalStore {
    proposals: BTreeMap<ProposalId, Proposal>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ProposalId) -> bool {
        self.proposals.contains_key(id)
    }

    pub fn get(&self, id: &ProposalId) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    /// Like [`get`](Self::get), failing with `NonexistentProposal`
    pub fn require(&self, id: &ProposalId) -> Result<&Proposal, ProposalError> {
        self.get(id)
            .ok_or(ProposalError::NonexistentProposal { id: *id })
    }

    pub fn require_mut(&mut self, id: &ProposalId) -> Result<&mut Proposal, ProposalError> {
        self.proposals
            .get_mut(id)
            .ok_or(ProposalError::NonexistentProposal { id: *id })
    }

    /// Store a new proposal; fails if its id is taken
    pub fn insert(&mut self, proposal: Proposal) -> Result<(), ProposalError> {
        if self.contains(&proposal.id) {
            return Err(ProposalError::AlreadyExists { id: proposal.id });
        }
        self.proposals.insert(proposal.id, proposal);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use staged_domain::{Action, AllowFailureMap, ConfigIndex, ExecutionMode, TargetConfig};

    fn proposal(metadata: &[u8]) -> Proposal {
        let payload = vec![Action::new("treasury", 1, vec![])];
        Proposal {
            id: ProposalId::derive(&payload, metadata),
            creator: "alice".into(),
            payload,
            metadata: metadata.to_vec(),
            allow_failure_map: AllowFailureMap::default(),
            last_stage_transition: Utc::now(),
            current_stage: 0,
            stage_config_index: ConfigIndex::new(1),
            executed: false,
            target: TargetConfig::new("dao", ExecutionMode::Call),
            custom_params: vec![],
        }
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut store = ProposalStore::new();
        store.insert(proposal(b"a")).unwrap();
        let duplicate = store.insert(proposal(b"a"));
        assert!(matches!(duplicate, Err(ProposalError::AlreadyExists { .. })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_require_unknown_id() {
        let store = ProposalStore::new();
        let id = ProposalId::derive(&[], b"missing");
        assert_eq!(
            store.require(&id).unwrap_err(),
            ProposalError::NonexistentProposal { id }
        );
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut store = ProposalStore::new();
        store.insert(proposal(b"a")).unwrap();
        store.insert(proposal(b"b")).unwrap();

        let json = serde_json::to_string(&store).unwrap();
        let restored: ProposalStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, store);
    }
}
