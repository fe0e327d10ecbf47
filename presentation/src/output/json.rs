//! JSON output

use crate::output::formatter::OutputFormatter;
use serde_json::json;
use staged_domain::config::{ConfigIssue, Severity};
use staged_domain::{ProposalEvent, Stage};

/// Renders everything as compact JSON, one document per call
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_event(&self, event: &ProposalEvent) -> String {
        serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_issues(&self, issues: &[ConfigIssue]) -> String {
        let issues: Vec<_> = issues
            .iter()
            .map(|issue| {
                json!({
                    "severity": match issue.severity {
                        Severity::Error => "error",
                        Severity::Warning => "warning",
                    },
                    "message": issue.message,
                })
            })
            .collect();
        serde_json::to_string(&issues).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_stages(&self, stages: &[Stage]) -> String {
        serde_json::to_string(stages).unwrap_or_else(|_| "[]".to_string())
    }
}
