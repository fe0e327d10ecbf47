//! Capability probe port
//!
//! Before an automatic body is accepted into a stage, the coordinator checks
//! that it actually speaks the sub-decision interface.

use async_trait::async_trait;
use staged_domain::Identity;

/// Interfaces a body can be probed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `create_sub_decision` + `has_succeeded`
    SubDecision,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::SubDecision => write!(f, "sub-decision"),
        }
    }
}

/// Port answering "does `body` support `capability`?"
///
/// Implementations must treat an unreachable body as unsupported rather than
/// failing.
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    async fn supports(&self, body: &Identity, capability: Capability) -> bool;
}
