//! Permission grants from TOML (`[permissions]` section)

use serde::{Deserialize, Serialize};
use staged_domain::config::ConfigIssue;
use staged_domain::{Identity, Permission};
use std::collections::BTreeMap;

/// Raw grants: identity to permission names
///
/// # Example
///
/// ```toml
/// [permissions]
/// admin = ["update_stages", "create_proposal", "execute_proposal"]
/// relay-admin = ["set_trusted_forwarder"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilePermissionsConfig {
    pub grants: BTreeMap<String, Vec<String>>,
}

impl FilePermissionsConfig {
    /// Parse every grant; unknown permission names are skipped and reported.
    pub fn parse_grants(&self) -> (Vec<(Identity, Permission)>, Vec<ConfigIssue>) {
        let valid: Vec<&str> = Permission::ALL.iter().map(Permission::as_str).collect();
        let mut grants = Vec::new();
        let mut issues = Vec::new();

        for (who, names) in &self.grants {
            if who.trim().is_empty() {
                issues.push(ConfigIssue::empty_identity("permissions"));
                continue;
            }
            for name in names {
                match name.parse::<Permission>() {
                    Ok(permission) => grants.push((Identity::new(who.trim()), permission)),
                    Err(_) => issues.push(ConfigIssue::invalid_value(
                        &format!("permissions.{}", who),
                        name,
                        &valid,
                    )),
                }
            }
        }
        (grants, issues)
    }

    /// Whether anyone holds `permission`
    pub fn anyone_holds(&self, permission: Permission) -> bool {
        self.parse_grants().0.iter().any(|(_, p)| *p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grants() {
        let config: FilePermissionsConfig = toml::from_str(
            r#"
admin = ["update_stages", "execute-proposal"]
relay = ["teleport"]
"#,
        )
        .unwrap();

        let (grants, issues) = config.parse_grants();
        assert_eq!(
            grants,
            vec![
                (Identity::new("admin"), Permission::UpdateStages),
                (Identity::new("admin"), Permission::ExecuteProposal),
            ]
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("permissions.relay"));
        assert!(config.anyone_holds(Permission::UpdateStages));
        assert!(!config.anyone_holds(Permission::SetTargetConfig));
    }
}
