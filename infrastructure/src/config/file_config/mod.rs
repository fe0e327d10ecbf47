//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to domain and application
//! types on demand, collecting [`ConfigIssue`]s instead of failing.

mod coordinator;
mod output;
mod permissions;
mod stages;

pub use coordinator::FileCoordinatorConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use permissions::FilePermissionsConfig;
pub use stages::{FileBodyConfig, FileStageConfig, parse_stages};

use serde::{Deserialize, Serialize};
use staged_domain::config::{ConfigIssue, ConfigIssueCode, Severity};
use staged_domain::{Permission, Stage};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Coordinator identity, budget and initial target
    pub coordinator: FileCoordinatorConfig,
    /// Stage configuration applied at startup
    pub stages: Vec<FileStageConfig>,
    /// Permission grants
    pub permissions: FilePermissionsConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Domain stages built from `[[stages]]`
    pub fn stages(&self) -> Vec<Stage> {
        parse_stages(&self.stages).0
    }

    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Coordinator identities and execution mode
    /// 2. Body addresses and result kinds
    /// 3. Permission names
    /// 4. That someone may update stages when stages are configured
    ///
    /// Stage invariants (durations, thresholds, duplicates) are checked by
    /// the coordinator when the stages are applied.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.coordinator.to_settings().1);
        issues.extend(parse_stages(&self.stages).1);
        issues.extend(self.permissions.parse_grants().1);

        if !self.stages.is_empty() && !self.permissions.anyone_holds(Permission::UpdateStages) {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                code: ConfigIssueCode::NoStageAdministrator,
                message: "stages are configured but nobody holds update_stages".to_string(),
            });
        }

        issues
    }
}
