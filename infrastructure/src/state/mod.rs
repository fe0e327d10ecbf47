//! Coordinator state persistence

mod state_file;

pub use state_file::{SnapshotError, StateFile};
