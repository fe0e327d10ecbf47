//! Output formatter trait

use staged_domain::config::ConfigIssue;
use staged_domain::{ProposalEvent, Stage};

/// Trait for rendering coordinator output
pub trait OutputFormatter {
    /// A single committed event
    fn format_event(&self, event: &ProposalEvent) -> String;

    /// Configuration issues found by validation
    fn format_issues(&self, issues: &[ConfigIssue]) -> String;

    /// A stage configuration
    fn format_stages(&self, stages: &[Stage]) -> String;
}
