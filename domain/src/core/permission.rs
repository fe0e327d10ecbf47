//! Permissions gating privileged coordinator operations

use serde::{Deserialize, Serialize};

/// A privileged operation a caller must be granted before invoking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Replace the live stage configuration
    UpdateStages,
    /// Create new proposals
    CreateProposal,
    /// Execute a proposal that passed its final stage
    ExecuteProposal,
    /// Change the trusted forwarder
    SetTrustedForwarder,
    /// Change the execution target
    SetTargetConfig,
}

impl Permission {
    /// All permissions, in declaration order
    pub const ALL: [Permission; 5] = [
        Permission::UpdateStages,
        Permission::CreateProposal,
        Permission::ExecuteProposal,
        Permission::SetTrustedForwarder,
        Permission::SetTargetConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UpdateStages => "update_stages",
            Permission::CreateProposal => "create_proposal",
            Permission::ExecuteProposal => "execute_proposal",
            Permission::SetTrustedForwarder => "set_trusted_forwarder",
            Permission::SetTargetConfig => "set_target_config",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown permission: {}. Valid: {}",
                    s,
                    Permission::ALL.map(|p| p.as_str()).join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_permission() {
        assert_eq!(
            "execute_proposal".parse::<Permission>().ok(),
            Some(Permission::ExecuteProposal)
        );
        assert_eq!(
            "Update-Stages".parse::<Permission>().ok(),
            Some(Permission::UpdateStages)
        );
        assert!("root".parse::<Permission>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for permission in Permission::ALL {
            assert_eq!(permission.to_string().parse::<Permission>(), Ok(permission));
        }
    }
}
