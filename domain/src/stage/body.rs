//! Bodies and the verdicts they report

use crate::core::identity::Identity;
use serde::{Deserialize, Serialize};

/// A verdict reported by a body for one stage of a proposal
///
/// `None` is a legal report but never counts toward either tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    #[default]
    None,
    Approval,
    Veto,
}

impl ResultKind {
    pub fn is_approval(&self) -> bool {
        matches!(self, ResultKind::Approval)
    }

    pub fn is_veto(&self) -> bool {
        matches!(self, ResultKind::Veto)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::None => "none",
            ResultKind::Approval => "approval",
            ResultKind::Veto => "veto",
        }
    }
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(ResultKind::None),
            "approval" | "approve" => Ok(ResultKind::Approval),
            "veto" => Ok(ResultKind::Veto),
            _ => Err(format!(
                "Unknown result kind: {}. Valid: none, approval, veto",
                s
            )),
        }
    }
}

/// An external decision-making entity assigned to a stage
///
/// Automatic bodies receive a sub-decision request when their stage starts.
/// Manual bodies never do; their verdict has to be reported by someone.
///
/// # Example
///
/// ```
/// use staged_domain::{Body, ResultKind};
///
/// let council = Body::automatic("council", ResultKind::Approval).with_try_advance(true);
/// assert!(!council.is_manual);
///
/// let guardian = Body::manual("guardian", ResultKind::Veto);
/// assert!(guardian.is_manual);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    /// Identity of the body; unique within its stage
    pub address: Identity,
    /// Manual bodies are never dispatched to
    pub is_manual: bool,
    /// Whether this body's report should attempt an advance
    pub try_advance: bool,
    /// Classification applied when the body's sub-decision succeeds without a report
    pub result_kind: ResultKind,
}

impl Body {
    /// An automatic body that receives sub-decision requests
    pub fn automatic(address: impl Into<Identity>, result_kind: ResultKind) -> Self {
        Self {
            address: address.into(),
            is_manual: false,
            try_advance: false,
            result_kind,
        }
    }

    /// A manual body whose verdict is reported externally
    pub fn manual(address: impl Into<Identity>, result_kind: ResultKind) -> Self {
        Self {
            is_manual: true,
            ..Self::automatic(address, result_kind)
        }
    }

    pub fn with_try_advance(mut self, try_advance: bool) -> Self {
        self.try_advance = try_advance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_kind() {
        assert_eq!("approval".parse::<ResultKind>().ok(), Some(ResultKind::Approval));
        assert_eq!("Veto".parse::<ResultKind>().ok(), Some(ResultKind::Veto));
        assert_eq!("none".parse::<ResultKind>().ok(), Some(ResultKind::None));
        assert!("maybe".parse::<ResultKind>().is_err());
    }

    #[test]
    fn test_result_kind_serde_lowercase() {
        let json = serde_json::to_string(&ResultKind::Veto).unwrap();
        assert_eq!(json, "\"veto\"");
    }

    #[test]
    fn test_manual_body_keeps_address_and_kind() {
        let body = Body::manual("guardian", ResultKind::Veto);
        assert!(body.is_manual);
        assert!(!body.try_advance);
        assert_eq!(body.address.as_str(), "guardian");
        assert_eq!(body.result_kind, ResultKind::Veto);
    }
}
