//! Authorization port
//!
//! The coordinator never decides who may do what; it asks an [`Authorizer`].
//! Grants live outside the coordinator (a permission manager, a config file,
//! a DAO). Adapters live in the infrastructure layer.

use staged_domain::{Identity, Permission};

/// Port answering "may `caller` perform `permission`?"
///
/// Called with the *resolved* caller, i.e. after trusted-forwarder handling.
pub trait Authorizer: Send + Sync {
    fn is_granted(&self, caller: &Identity, permission: Permission) -> bool;
}
