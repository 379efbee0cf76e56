//! Per-(type, scope) singleton entries.
//!
//! One entry per scope key per type. Entries behave like the global slot but
//! are keyed by the owning scope: an instance attaching in scope A does not
//! conflict with one attaching in scope B. An entry is removed exactly when
//! its owning instance releases it on detach; scope transitions from "has
//! entry" to "no entry" happen through no other path.

use std::{any::TypeId, collections::HashMap};

use crate::instance::InstanceId;
use crate::registry::{Claim, Release};
use crate::scope::ScopeId;

/// The scoped registry: at most one registered instance per (type, scope).
#[derive(Default)]
pub(crate) struct Entries {
    entries: HashMap<TypeId, HashMap<ScopeId, InstanceId>>,
}

impl Entries {
    /// The registered instance for a (type, scope) pair, if any.
    #[inline]
    pub fn get(&self, key: TypeId, scope: ScopeId) -> Option<InstanceId> {
        self.entries.get(&key)?.get(&scope).copied()
    }

    /// True iff an entry exists for the (type, scope) pair.
    #[inline]
    pub fn contains(&self, key: TypeId, scope: ScopeId) -> bool {
        self.get(key, scope).is_some()
    }

    /// Cache a freshly resolved instance under a free scope key.
    pub fn cache(&mut self, key: TypeId, scope: ScopeId, id: InstanceId) {
        let previous = self.entries.entry(key).or_default().insert(scope, id);
        debug_assert!(
            previous.is_none(),
            "resolution cached into an occupied scope entry"
        );
    }

    /// An instance claims its scope's entry on attach.
    pub fn claim(&mut self, key: TypeId, scope: ScopeId, id: InstanceId) -> Claim {
        let entries = self.entries.entry(key).or_default();
        match entries.get(&scope) {
            Some(&existing) if existing == id => Claim::AlreadyOwner,
            Some(&existing) => Claim::LostTo(existing),
            None => {
                entries.insert(scope, id);
                Claim::Won
            }
        }
    }

    /// An instance releases its scope's entry on detach. Only the owner
    /// removes the entry.
    pub fn release(&mut self, key: TypeId, scope: ScopeId, id: InstanceId) -> Release {
        let Some(entries) = self.entries.get_mut(&key) else {
            return Release::NotOwner;
        };
        match entries.get(&scope) {
            Some(&existing) if existing == id => {
                entries.remove(&scope);
                if entries.is_empty() {
                    self.entries.remove(&key);
                }
                Release::Owner
            }
            _ => Release::NotOwner,
        }
    }

    /// Snapshot of the scopes that currently hold an entry for a type.
    /// Order follows map iteration and is not stable across insert/remove.
    pub fn scopes(&self, key: TypeId) -> Vec<ScopeId> {
        self.entries
            .get(&key)
            .map(|entries| entries.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the registered instances for a type across all scopes.
    pub fn instances(&self, key: TypeId) -> Vec<InstanceId> {
        self.entries
            .get(&key)
            .map(|entries| entries.values().copied().collect())
            .unwrap_or_default()
    }
}
