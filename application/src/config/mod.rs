//! Application-level configuration.
//!
//! - [`CoordinatorSettings`]: identity, budget and initial state of a coordinator

pub mod coordinator_settings;

pub use coordinator_settings::CoordinatorSettings;
