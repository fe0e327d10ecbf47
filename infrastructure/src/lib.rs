//! Infrastructure layer for staged-quorum
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, configuration file loading, state snapshots
//! and the scenario simulator built on top of them.

pub mod adapters;
pub mod config;
pub mod logging;
pub mod simulation;
pub mod state;

// Re-export commonly used types
pub use adapters::{
    BodyBehavior, BodyRegistry, BodyReport, ExecutionRecord, GrantTable, ManualClock,
    RecordingExecutor, ScriptedBody, SystemClock,
};
pub use config::{
    ConfigLoader, FileBodyConfig, FileConfig, FileCoordinatorConfig, FileOutputConfig,
    FileOutputFormat, FilePermissionsConfig, FileStageConfig,
};
pub use logging::JsonlEventLog;
pub use simulation::{
    Scenario, ScenarioError, SimulationReport, SimulationRunner, StepOutcome, StepResult,
};
pub use state::{SnapshotError, StateFile};
