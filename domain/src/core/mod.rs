//! Core domain concepts shared across all subdomains.
//!
//! - [`identity::Identity`]: callers, bodies and execution targets
//! - [`permission::Permission`]: privileged operations
//! - [`error`]: configuration and proposal errors

pub mod error;
pub mod identity;
pub mod permission;
