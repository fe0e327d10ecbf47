//! Proposal value objects - identifiers, actions and execution targets.

use crate::core::identity::Identity;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Deterministic identifier of a proposal
///
/// Derived from the payload and metadata only, so two proposals with the same
/// actions and metadata collide. Serialized as a 64-character hex string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalId([u8; 32]);

impl ProposalId {
    /// Derive the id for a payload and its metadata.
    pub fn derive(payload: &[Action], metadata: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(payload.len() as u64).to_le_bytes());
        for action in payload {
            let target = action.target.as_str().as_bytes();
            hasher.update(&(target.len() as u64).to_le_bytes());
            hasher.update(target);
            hasher.update(&action.value.to_le_bytes());
            hasher.update(&(action.data.len() as u64).to_le_bytes());
            hasher.update(&action.data);
        }
        hasher.update(&(metadata.len() as u64).to_le_bytes());
        hasher.update(metadata);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// First 8 hex characters, for display
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProposalId({})", self.short())
    }
}

impl std::str::FromStr for ProposalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        blake3::Hash::from_hex(s.trim())
            .map(|hash| Self(*hash.as_bytes()))
            .map_err(|e| format!("Invalid proposal id '{}': {}", s, e))
    }
}

impl Serialize for ProposalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ProposalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single call in a proposal's payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Callee
    pub target: Identity,
    /// Value transferred with the call
    pub value: u64,
    /// Opaque call data
    pub data: Vec<u8>,
}

impl Action {
    pub fn new(target: impl Into<Identity>, value: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            target: target.into(),
            value,
            data: data.into(),
        }
    }
}

/// Bitmap of payload actions that are allowed to fail during execution
///
/// Bit `i` covers action `i`; actions beyond index 127 can never fail silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowFailureMap(u128);

impl AllowFailureMap {
    pub fn new(bits: u128) -> Self {
        Self(bits)
    }

    /// Build a map from action indices; indices beyond 127 are ignored
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self(
            indices
                .into_iter()
                .filter(|&i| i < 128)
                .fold(0u128, |bits, i| bits | (1 << i)),
        )
    }

    pub fn bits(&self) -> u128 {
        self.0
    }

    pub fn allows(&self, index: usize) -> bool {
        index < 128 && self.0 & (1 << index) != 0
    }
}

/// How the execution engine invokes the payload on the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Call,
    DelegateCall,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Call => "call",
            ExecutionMode::DelegateCall => "delegate_call",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "call" => Ok(ExecutionMode::Call),
            "delegate_call" | "delegatecall" => Ok(ExecutionMode::DelegateCall),
            _ => Err(format!(
                "Unknown execution mode: {}. Valid: call, delegate_call",
                s
            )),
        }
    }
}

/// Execution target descriptor, snapshotted onto each proposal at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub target: Identity,
    pub mode: ExecutionMode,
}

impl TargetConfig {
    pub fn new(target: impl Into<Identity>, mode: ExecutionMode) -> Self {
        Self {
            target: target.into(),
            mode,
        }
    }
}

/// Opaque identifier of a sub-decision created on a body
///
/// Zero is a legitimate id; "not created" is expressed by [`SubDecisionHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubDecisionId(pub u64);

impl std::fmt::Display for SubDecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of dispatching a sub-decision to one body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubDecisionHandle {
    Created(SubDecisionId),
    NotCreated,
}

impl SubDecisionHandle {
    /// The sub-decision id, if dispatch succeeded
    pub fn id(&self) -> Option<SubDecisionId> {
        match self {
            SubDecisionHandle::Created(id) => Some(*id),
            SubDecisionHandle::NotCreated => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Vec<Action> {
        vec![Action::new("treasury", 10, b"transfer".to_vec())]
    }

    #[test]
    fn test_id_is_deterministic() {
        assert_eq!(
            ProposalId::derive(&payload(), b"meta"),
            ProposalId::derive(&payload(), b"meta")
        );
    }

    #[test]
    fn test_id_depends_on_metadata_and_payload() {
        let base = ProposalId::derive(&payload(), b"meta");
        assert_ne!(base, ProposalId::derive(&payload(), b"other"));
        assert_ne!(base, ProposalId::derive(&[], b"meta"));
    }

    #[test]
    fn test_id_hex_round_trip() {
        let id = ProposalId::derive(&payload(), b"meta");
        let parsed: ProposalId = id.to_hex().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.short().len(), 8);

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
    }

    #[test]
    fn test_allow_failure_map() {
        let map = AllowFailureMap::from_indices([0, 2, 200]);
        assert!(map.allows(0));
        assert!(!map.allows(1));
        assert!(map.allows(2));
        assert!(!map.allows(200));
        assert_eq!(map.bits(), 0b101);
    }

    #[test]
    fn test_zero_sub_decision_id_is_created() {
        let handle = SubDecisionHandle::Created(SubDecisionId(0));
        assert_eq!(handle.id(), Some(SubDecisionId(0)));
        assert_eq!(SubDecisionHandle::NotCreated.id(), None);
    }

    #[test]
    fn test_parse_execution_mode() {
        assert_eq!("call".parse::<ExecutionMode>().ok(), Some(ExecutionMode::Call));
        assert_eq!(
            "delegate-call".parse::<ExecutionMode>().ok(),
            Some(ExecutionMode::DelegateCall)
        );
        assert!("static".parse::<ExecutionMode>().is_err());
    }
}
