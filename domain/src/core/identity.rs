//! Identity value object

use serde::{Deserialize, Serialize};

/// An address-like identity for callers, bodies and execution targets (Value Object)
///
/// Identities are compared by exact string match; no normalization is applied.
///
/// # Example
///
/// ```
/// use staged_domain::Identity;
///
/// let body = Identity::new("council");
/// assert_eq!(body.as_str(), "council");
/// assert_eq!(body, Identity::from("council"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create a new identity
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity::new(s)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Identity::new(s)
    }
}
