//! Stage configuration from TOML (`[[stages]]` array)

use serde::{Deserialize, Serialize};
use staged_domain::config::ConfigIssue;
use staged_domain::{Body, ResultKind, Stage};
use std::time::Duration;

/// Raw stage from TOML
///
/// # Example
///
/// ```toml
/// [[stages]]
/// min_advance_secs = 3600
/// max_advance_secs = 36000
/// vote_duration_secs = 3600
/// approval_threshold = 2
/// veto_threshold = 1              # 0 disables veto gating
///
/// [[stages.bodies]]
/// address = "council"
/// try_advance = true
/// result_kind = "approval"        # "none", "approval" or "veto"
///
/// [[stages.bodies]]
/// address = "guardian"
/// manual = true
/// result_kind = "veto"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStageConfig {
    pub bodies: Vec<FileBodyConfig>,
    pub min_advance_secs: u64,
    pub max_advance_secs: u64,
    pub vote_duration_secs: u64,
    pub approval_threshold: usize,
    pub veto_threshold: usize,
}

impl Default for FileStageConfig {
    fn default() -> Self {
        Self {
            bodies: Vec::new(),
            min_advance_secs: 0,
            max_advance_secs: 7 * 24 * 3600,
            vote_duration_secs: 0,
            approval_threshold: 0,
            veto_threshold: 0,
        }
    }
}

/// Raw body from TOML
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBodyConfig {
    pub address: String,
    pub manual: bool,
    pub try_advance: bool,
    pub result_kind: String,
}

impl FileBodyConfig {
    fn to_body(&self, field: &str) -> (Body, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        if self.address.trim().is_empty() {
            issues.push(ConfigIssue::empty_identity(&format!("{}.address", field)));
        }
        let result_kind = if self.result_kind.trim().is_empty() {
            ResultKind::None
        } else {
            match self.result_kind.parse::<ResultKind>() {
                Ok(kind) => kind,
                Err(_) => {
                    issues.push(ConfigIssue::invalid_value(
                        &format!("{}.result_kind", field),
                        &self.result_kind,
                        &["none", "approval", "veto"],
                    ));
                    ResultKind::None
                }
            }
        };

        let body = Body {
            address: self.address.trim().into(),
            is_manual: self.manual,
            try_advance: self.try_advance,
            result_kind,
        };
        (body, issues)
    }
}

impl FileStageConfig {
    /// Convert to a domain stage. Stage invariants are not checked here;
    /// the coordinator validates them when the stages are applied.
    pub fn to_stage(&self, index: usize) -> (Stage, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let bodies = self
            .bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                let (body, body_issues) = body.to_body(&format!("stages[{}].bodies[{}]", index, i));
                issues.extend(body_issues);
                body
            })
            .collect();

        let stage = Stage {
            bodies,
            max_advance: Duration::from_secs(self.max_advance_secs),
            min_advance: Duration::from_secs(self.min_advance_secs),
            vote_duration: Duration::from_secs(self.vote_duration_secs),
            approval_threshold: self.approval_threshold,
            veto_threshold: self.veto_threshold,
        };
        (stage, issues)
    }
}

/// Convert every configured stage
pub fn parse_stages(stages: &[FileStageConfig]) -> (Vec<Stage>, Vec<ConfigIssue>) {
    let mut issues = Vec::new();
    let stages = stages
        .iter()
        .enumerate()
        .map(|(index, stage)| {
            let (stage, stage_issues) = stage.to_stage(index);
            issues.extend(stage_issues);
            stage
        })
        .collect();
    (stages, issues)
}
