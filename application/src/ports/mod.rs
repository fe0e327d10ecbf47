//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.
//! Everything the coordinator does not own itself (authorization, bodies,
//! execution, time, event output) sits behind one of these traits.

pub mod action_executor;
pub mod authorizer;
pub mod body;
pub mod capability_probe;
pub mod clock;
pub mod event_sink;
