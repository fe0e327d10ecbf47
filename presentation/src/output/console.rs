//! Console output formatter for coordinator events and simulation runs

use crate::output::formatter::OutputFormatter;
use chrono::{DateTime, Utc};
use colored::Colorize;
use staged_domain::config::{ConfigIssue, Severity};
use staged_domain::{ProposalEvent, ProposalStatus, Stage};
use std::time::Duration;

/// One simulation step, as the console shows it
#[derive(Debug, Clone, Copy)]
pub struct StepView<'a> {
    pub step: usize,
    pub at: DateTime<Utc>,
    pub description: &'a str,
    /// `Ok(detail)` or `Err(error)`
    pub result: Result<&'a str, &'a str>,
    /// Whether the result matched the step's expectation
    pub expected: bool,
    pub events: &'a [ProposalEvent],
}

/// Formats coordinator output for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// One line per event
    pub fn event(event: &ProposalEvent) -> String {
        match event {
            ProposalEvent::StagesUpdated {
                config_index,
                stages,
            } => format!(
                "{} configuration {} stored ({} stages)",
                "⚙".cyan(),
                config_index,
                stages.len()
            ),
            ProposalEvent::TrustedForwarderUpdated { forwarder } => format!(
                "{} trusted forwarder: {}",
                "⚙".cyan(),
                forwarder.as_ref().map_or("none", |f| f.as_str())
            ),
            ProposalEvent::TargetConfigUpdated { target } => format!(
                "{} execution target: {} ({})",
                "⚙".cyan(),
                target.target,
                target.mode
            ),
            ProposalEvent::ProposalCreated {
                proposal_id,
                creator,
                start_date,
                payload,
                ..
            } => format!(
                "{} {} created by {} ({} actions, stage 0 from {})",
                "+".green().bold(),
                proposal_id.short().bold(),
                creator,
                payload.len(),
                start_date.format("%Y-%m-%d %H:%M:%S")
            ),
            ProposalEvent::SubDecisionCreated {
                proposal_id,
                stage_id,
                body,
                sub_decision_id,
            } => format!(
                "{} {} stage {}: {} opened sub-decision #{}",
                "→".blue(),
                proposal_id.short(),
                stage_id,
                body,
                sub_decision_id
            ),
            ProposalEvent::SubDecisionNotCreated {
                proposal_id,
                stage_id,
                body,
                reason,
            } => format!(
                "{} {} stage {}: {} declined ({})",
                "✗".yellow(),
                proposal_id.short(),
                stage_id,
                body,
                String::from_utf8_lossy(reason)
            ),
            ProposalEvent::ResultReported {
                proposal_id,
                stage_id,
                body,
                result_kind,
            } => format!(
                "{} {} stage {}: {} reported {}",
                "●".magenta(),
                proposal_id.short(),
                stage_id,
                body,
                result_kind
            ),
            ProposalEvent::ProposalAdvanced {
                proposal_id,
                stage_id,
            } => format!(
                "{} {} advanced to stage {}",
                "▶".green(),
                proposal_id.short(),
                stage_id
            ),
            ProposalEvent::ProposalExecuted { proposal_id } => format!(
                "{} {} executed",
                "✓".green().bold(),
                proposal_id.short().bold()
            ),
        }
    }

    /// A simulation step and the events it committed
    pub fn step(view: &StepView<'_>) -> String {
        let label = if view.step == 0 {
            "setup".to_string()
        } else {
            format!("#{}", view.step)
        };
        let (mark, detail) = match view.result {
            Ok(detail) => ("ok".green(), detail.normal()),
            Err(error) => ("failed".red(), error.red()),
        };

        let mut output = format!(
            "{} {} {} {} {}",
            format!("{:>6}", label).dimmed(),
            view.at.format("%H:%M:%S").to_string().dimmed(),
            view.description,
            mark,
            detail
        );
        if !view.expected {
            output.push_str(&format!(" {}", "(unexpected)".red().bold()));
        }
        for event in view.events {
            output.push_str(&format!("\n{}", Self::indent(&Self::event(event), "         ")));
        }
        output
    }

    /// Final position of a labelled proposal
    pub fn proposal(label: &str, id: &str, status: Option<ProposalStatus>) -> String {
        let status = match status {
            Some(ProposalStatus::Executed) => "Executed".green().bold(),
            Some(ProposalStatus::Expired) => "Expired".red(),
            Some(status) => status.to_string().yellow(),
            None => "unknown".red(),
        };
        format!("  {:<16} {} {}", label.bold(), id.dimmed(), status)
    }

    pub fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    pub fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    pub fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn duration(duration: Duration) -> String {
        let secs = duration.as_secs();
        match secs {
            0 => "0".to_string(),
            s if s % 86_400 == 0 => format!("{}d", s / 86_400),
            s if s % 3_600 == 0 => format!("{}h", s / 3_600),
            s if s % 60 == 0 => format!("{}m", s / 60),
            s => format!("{}s", s),
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_event(&self, event: &ProposalEvent) -> String {
        Self::event(event)
    }

    fn format_issues(&self, issues: &[ConfigIssue]) -> String {
        if issues.is_empty() {
            return format!("{} configuration is valid", "✓".green());
        }
        issues
            .iter()
            .map(|issue| match issue.severity {
                Severity::Error => format!("{} {}", "error:".red().bold(), issue.message),
                Severity::Warning => format!("{} {}", "warning:".yellow().bold(), issue.message),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_stages(&self, stages: &[Stage]) -> String {
        if stages.is_empty() {
            return "No stages configured".dimmed().to_string();
        }

        let mut output = String::new();
        for (index, stage) in stages.iter().enumerate() {
            let final_mark = if index + 1 == stages.len() {
                " (final)".dimmed().to_string()
            } else {
                String::new()
            };
            output.push_str(&format!(
                "{}{}\n",
                format!("Stage {}", index).yellow().bold(),
                final_mark
            ));
            output.push_str(&format!(
                "  window {}..{}, vote {}, approvals ≥ {}, {}\n",
                Self::duration(stage.min_advance),
                Self::duration(stage.max_advance),
                Self::duration(stage.vote_duration),
                stage.approval_threshold,
                if stage.is_veto_gated() {
                    format!("vetoes < {}", stage.veto_threshold)
                } else {
                    "no veto gate".to_string()
                }
            ));
            for body in &stage.bodies {
                output.push_str(&format!(
                    "  - {} {} {}{}\n",
                    body.address,
                    body.result_kind,
                    if body.is_manual { "manual" } else { "automatic" },
                    if body.try_advance { ", try advance" } else { "" }
                ));
            }
        }
        output
    }
}
