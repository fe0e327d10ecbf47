//! Port adapters for local runs and simulations
//!
//! - [`SystemClock`] / [`ManualClock`] implement `Clock`
//! - [`GrantTable`] implements `Authorizer`
//! - [`ScriptedBody`] / [`BodyRegistry`] implement the body ports
//! - [`RecordingExecutor`] implements `ActionExecutor`

mod clock;
mod grant_table;
mod recording_executor;
mod scripted_body;

pub use clock::{ManualClock, SystemClock};
pub use grant_table::GrantTable;
pub use recording_executor::{ExecutionRecord, FAILING_ACTION_DATA, RecordingExecutor};
pub use scripted_body::{BodyBehavior, BodyRegistry, BodyReport, ScriptedBody};
