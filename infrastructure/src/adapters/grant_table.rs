//! Static permission table

use staged_application::Authorizer;
use staged_domain::{Identity, Permission};
use std::collections::HashSet;

/// Authorizer backed by a fixed set of `(identity, permission)` grants
#[derive(Debug, Clone, Default)]
pub struct GrantTable {
    grants: HashSet<(Identity, Permission)>,
}

impl GrantTable {
    pub fn new(grants: impl IntoIterator<Item = (Identity, Permission)>) -> Self {
        Self {
            grants: grants.into_iter().collect(),
        }
    }

    pub fn grant(&mut self, who: impl Into<Identity>, permission: Permission) {
        self.grants.insert((who.into(), permission));
    }

    /// Identities holding `permission`, sorted
    pub fn holders(&self, permission: Permission) -> Vec<&Identity> {
        let mut holders: Vec<&Identity> = self
            .grants
            .iter()
            .filter(|(_, p)| *p == permission)
            .map(|(who, _)| who)
            .collect();
        holders.sort();
        holders
    }
}

impl Authorizer for GrantTable {
    fn is_granted(&self, caller: &Identity, permission: Permission) -> bool {
        self.grants.contains(&(caller.clone(), permission))
    }
}
