//! Scenario-driven simulation of a coordinator
//!
//! Used by the `simulate` command to exercise a stage configuration without
//! any real bodies or execution target.

mod runner;
mod scenario;

pub use runner::{
    ProposalSummary, SimulationReport, SimulationRunner, StepOutcome, StepResult, event_counts,
};
pub use scenario::{
    Expectation, Scenario, ScenarioAction, ScenarioBody, ScenarioCaller, ScenarioError,
    ScenarioStep,
};
