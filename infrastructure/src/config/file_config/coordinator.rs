//! Coordinator configuration from TOML (`[coordinator]` section)

use serde::{Deserialize, Serialize};
use staged_application::CoordinatorSettings;
use staged_application::config::coordinator_settings::DEFAULT_DISPATCH_BUDGET;
use staged_domain::config::ConfigIssue;
use staged_domain::{ExecutionMode, Identity, TargetConfig};

/// Raw coordinator configuration from TOML
///
/// # Example
///
/// ```toml
/// [coordinator]
/// id = "spp"
/// trusted_forwarder = "relay"     # omit to disable forwarding
/// dispatch_budget = 1000000
/// target = "dao"
/// mode = "call"                   # "call" or "delegate_call"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCoordinatorConfig {
    pub id: String,
    pub trusted_forwarder: Option<String>,
    pub dispatch_budget: u64,
    /// Execution target identity
    pub target: String,
    /// Execution mode: "call" or "delegate_call"
    pub mode: String,
}

impl Default for FileCoordinatorConfig {
    fn default() -> Self {
        let settings = CoordinatorSettings::default();
        Self {
            id: settings.id.to_string(),
            trusted_forwarder: None,
            dispatch_budget: DEFAULT_DISPATCH_BUDGET,
            target: settings.target.target.to_string(),
            mode: "call".to_string(),
        }
    }
}

impl FileCoordinatorConfig {
    /// Parse mode string into ExecutionMode, falling back to `Call`.
    pub fn parse_mode(&self) -> (ExecutionMode, Vec<ConfigIssue>) {
        match self.mode.parse::<ExecutionMode>() {
            Ok(mode) => (mode, vec![]),
            Err(_) => (
                ExecutionMode::default(),
                vec![ConfigIssue::invalid_value(
                    "coordinator.mode",
                    &self.mode,
                    &["call", "delegate_call"],
                )],
            ),
        }
    }

    /// Build coordinator settings, collecting issues along the way.
    pub fn to_settings(&self) -> (CoordinatorSettings, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        if self.id.trim().is_empty() {
            issues.push(ConfigIssue::empty_identity("coordinator.id"));
        }
        if self.target.trim().is_empty() {
            issues.push(ConfigIssue::empty_identity("coordinator.target"));
        }
        let (mode, mode_issues) = self.parse_mode();
        issues.extend(mode_issues);

        let mut settings = CoordinatorSettings::default()
            .with_id(self.id.trim())
            .with_dispatch_budget(self.dispatch_budget)
            .with_target(TargetConfig::new(self.target.trim(), mode));
        if let Some(forwarder) = &self.trusted_forwarder {
            if forwarder.trim().is_empty() {
                issues.push(ConfigIssue::empty_identity("coordinator.trusted_forwarder"));
            } else {
                settings.trusted_forwarder = Some(Identity::new(forwarder.trim()));
            }
        }
        (settings, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_settings() {
        let (settings, issues) = FileCoordinatorConfig::default().to_settings();
        assert!(issues.is_empty());
        assert_eq!(settings, CoordinatorSettings::default());
    }

    #[test]
    fn test_invalid_mode_falls_back_to_call() {
        let config = FileCoordinatorConfig {
            mode: "static".to_string(),
            ..Default::default()
        };
        let (settings, issues) = config.to_settings();
        assert_eq!(settings.target.mode, ExecutionMode::Call);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("coordinator.mode"));
    }

    #[test]
    fn test_empty_forwarder_is_reported() {
        let config = FileCoordinatorConfig {
            trusted_forwarder: Some("  ".to_string()),
            ..Default::default()
        };
        let (settings, issues) = config.to_settings();
        assert!(settings.trusted_forwarder.is_none());
        assert!(issues[0].is_error());
    }
}
