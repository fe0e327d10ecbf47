//! Configuration issues detected while loading settings.
//!
//! Loading never fails on a questionable value; it records a [`ConfigIssue`]
//! and falls back to a default. Callers decide whether `Error` issues abort.
//!
//! # Examples
//!
//! ```
//! use staged_domain::config::{ConfigIssue, ConfigIssueCode, Severity};
//!
//! let issue = ConfigIssue::invalid_value("stages[0].bodies[1].result_kind", "maybe", &["none", "approval", "veto"]);
//! assert_eq!(issue.severity, Severity::Error);
//! ```

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A field holds a value outside its allowed set.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// An identity field is empty.
    EmptyIdentity { field: String },
    /// Stages are configured but nobody may update them.
    NoStageAdministrator,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    /// An `Error` issue for a value outside `valid`
    pub fn invalid_value(field: &str, value: &str, valid: &[&str]) -> Self {
        Self {
            severity: Severity::Error,
            code: ConfigIssueCode::InvalidEnumValue {
                field: field.to_string(),
                value: value.to_string(),
                valid_values: valid.iter().map(|v| v.to_string()).collect(),
            },
            message: format!(
                "{}: unknown value '{}' (valid: {})",
                field,
                value,
                valid.join(", ")
            ),
        }
    }

    /// An `Error` issue for an empty identity
    pub fn empty_identity(field: &str) -> Self {
        Self {
            severity: Severity::Error,
            code: ConfigIssueCode::EmptyIdentity {
                field: field.to_string(),
            },
            message: format!("{}: identity must not be empty", field),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}
