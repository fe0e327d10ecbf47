//! Caller resolution
//!
//! Every write operation receives a [`CallContext`]. A call relayed by the
//! trusted forwarder carries the identity of whoever asked the forwarder to
//! relay it; that identity is honoured only when the immediate sender really
//! is the configured forwarder.

use staged_domain::Identity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Immediate sender of the call
    pub sender: Identity,
    /// Identity claimed by a relay on behalf of its user
    pub original_sender: Option<Identity>,
    /// Budget for body calls made by this operation; the coordinator's
    /// default applies when absent
    pub budget: Option<u64>,
}

impl CallContext {
    /// A call made directly by `sender`
    pub fn direct(sender: impl Into<Identity>) -> Self {
        Self {
            sender: sender.into(),
            original_sender: None,
            budget: None,
        }
    }

    /// A call relayed by `forwarder` on behalf of `original`
    pub fn forwarded(forwarder: impl Into<Identity>, original: impl Into<Identity>) -> Self {
        Self {
            sender: forwarder.into(),
            original_sender: Some(original.into()),
            budget: None,
        }
    }

    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = Some(budget);
        self
    }

    /// The identity this call acts as
    pub fn resolve(&self, trusted_forwarder: Option<&Identity>) -> &Identity {
        match (&self.original_sender, trusted_forwarder) {
            (Some(original), Some(forwarder)) if *forwarder == self.sender => original,
            _ => &self.sender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_call_resolves_to_sender() {
        let ctx = CallContext::direct("alice");
        assert_eq!(ctx.resolve(None).as_str(), "alice");
        assert_eq!(ctx.resolve(Some(&"relay".into())).as_str(), "alice");
    }

    #[test]
    fn test_trusted_forwarder_passes_original_sender() {
        let ctx = CallContext::forwarded("relay", "alice");
        assert_eq!(ctx.resolve(Some(&"relay".into())).as_str(), "alice");
    }

    #[test]
    fn test_untrusted_forwarder_is_the_caller() {
        let ctx = CallContext::forwarded("mallory", "alice");
        assert_eq!(ctx.resolve(Some(&"relay".into())).as_str(), "mallory");
        assert_eq!(ctx.resolve(None).as_str(), "mallory");
    }
}
