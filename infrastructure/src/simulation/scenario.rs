//! Scenario files
//!
//! A scenario declares the bodies taking part in a simulation and the steps
//! to run against the coordinator, in order:
//!
//! ```toml
//! start = "2026-03-01T12:00:00Z"
//!
//! [[bodies]]
//! address = "council"
//! behavior = "accept"
//!
//! [[steps]]
//! action = "create"
//! caller = "admin"
//! label = "grant"
//! actions = [{ target = "treasury", data = "pay" }]
//!
//! [[steps]]
//! action = "wait"
//! secs = 3600
//!
//! [[steps]]
//! action = "succeed"
//! body = "council"
//! ```
//!
//! Proposals are referred to by the label given when they were created.

use crate::adapters::BodyBehavior;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use staged_domain::{Action, ExecutionMode, ResultKind};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("Configuration has {0} error(s); run `validate` for details")]
    InvalidConfig(usize),

    #[error("Stages are configured but nobody holds update_stages")]
    NoAdministrator,

    #[error("Applying the configured stages failed: {0}")]
    Setup(String),

    #[error("Step {step}: no proposal labelled '{label}'")]
    UnknownLabel { step: usize, label: String },

    #[error("Step {step}: label '{label}' is already taken")]
    DuplicateLabel { step: usize, label: String },

    #[error("Step {step}: no scripted body '{body}'")]
    UnknownBody { step: usize, body: String },
}

/// Whole scenario file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Simulated time at the first step; the wall clock when absent
    pub start: Option<DateTime<Utc>>,
    pub bodies: Vec<ScenarioBody>,
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ScenarioError::Parse {
            path: path.display().to_string(),
            source: Box::new(source),
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// A scripted body taking part in the scenario.
///
/// Automatic bodies named by the stage configuration but not declared here
/// are registered with [`BodyBehavior::Accept`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioBody {
    pub address: String,
    #[serde(default)]
    pub behavior: BodyBehavior,
}

/// Who makes a call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioCaller {
    pub caller: String,
    /// Relay the call through this forwarder on the caller's behalf
    #[serde(default)]
    pub via: Option<String>,
    /// Budget for body calls; the coordinator default when absent
    #[serde(default)]
    pub budget: Option<u64>,
}

/// One payload action; `data` is taken as UTF-8 bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioAction {
    pub target: String,
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub data: String,
}

impl From<&ScenarioAction> for Action {
    fn from(action: &ScenarioAction) -> Self {
        Action::new(action.target.as_str(), action.value, action.data.as_bytes())
    }
}

/// What a step is expected to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    Create {
        #[serde(flatten)]
        caller: ScenarioCaller,
        label: String,
        #[serde(default)]
        metadata: String,
        #[serde(default)]
        actions: Vec<ScenarioAction>,
        /// Indices of actions allowed to fail
        #[serde(default)]
        allow_failure: Vec<usize>,
        /// Delay stage 0 by this many seconds
        #[serde(default)]
        start_in_secs: u64,
        /// Custom parameters per stage, per body index
        #[serde(default)]
        params: Vec<Vec<String>>,
        #[serde(default)]
        expect: Option<Expectation>,
    },
    Report {
        #[serde(flatten)]
        caller: ScenarioCaller,
        proposal: String,
        stage: usize,
        result: ResultKind,
        #[serde(default)]
        try_advance: bool,
        #[serde(default)]
        expect: Option<Expectation>,
    },
    Advance {
        #[serde(flatten)]
        caller: ScenarioCaller,
        proposal: String,
        #[serde(default)]
        expect: Option<Expectation>,
    },
    Execute {
        #[serde(flatten)]
        caller: ScenarioCaller,
        proposal: String,
        #[serde(default)]
        expect: Option<Expectation>,
    },
    SetForwarder {
        #[serde(flatten)]
        caller: ScenarioCaller,
        #[serde(default)]
        forwarder: Option<String>,
        #[serde(default)]
        expect: Option<Expectation>,
    },
    SetTarget {
        #[serde(flatten)]
        caller: ScenarioCaller,
        target: String,
        #[serde(default)]
        mode: ExecutionMode,
        #[serde(default)]
        expect: Option<Expectation>,
    },
    /// Move simulated time forward
    Wait { secs: u64 },
    /// Let a body's open sub-decisions succeed
    Succeed {
        body: String,
        /// Also deliver the bodies' reports
        #[serde(default = "default_true")]
        report: bool,
    },
    /// Record the proposal's tally and predicates
    Inspect { proposal: String },
}

fn default_true() -> bool {
    true
}

impl ScenarioStep {
    pub fn expectation(&self) -> Option<Expectation> {
        match self {
            ScenarioStep::Create { expect, .. }
            | ScenarioStep::Report { expect, .. }
            | ScenarioStep::Advance { expect, .. }
            | ScenarioStep::Execute { expect, .. }
            | ScenarioStep::SetForwarder { expect, .. }
            | ScenarioStep::SetTarget { expect, .. } => *expect,
            ScenarioStep::Wait { .. }
            | ScenarioStep::Succeed { .. }
            | ScenarioStep::Inspect { .. } => None,
        }
    }
}
