//! Per-type global singleton slots.
//!
//! One slot per type, states `Absent` and `Present`. A slot transitions to
//! `Present` when resolution caches an instance or an instance wins its
//! attach claim, and back to `Absent` exactly when the owning instance
//! releases it on detach.

use std::{any::TypeId, collections::HashMap};

use crate::instance::InstanceId;
use crate::registry::{Claim, Release};

/// The global registry: at most one registered instance per type.
#[derive(Default)]
pub(crate) struct Slots {
    slots: HashMap<TypeId, InstanceId>,
}

impl Slots {
    /// The registered instance for a type, if any.
    #[inline]
    pub fn get(&self, key: TypeId) -> Option<InstanceId> {
        self.slots.get(&key).copied()
    }

    /// True iff the type's slot is `Present`.
    #[inline]
    pub fn contains(&self, key: TypeId) -> bool {
        self.slots.contains_key(&key)
    }

    /// Cache a freshly resolved instance in an `Absent` slot.
    pub fn cache(&mut self, key: TypeId, id: InstanceId) {
        let previous = self.slots.insert(key, id);
        debug_assert!(
            previous.is_none(),
            "resolution cached into an occupied global slot"
        );
    }

    /// An instance claims the type's slot on attach.
    pub fn claim(&mut self, key: TypeId, id: InstanceId) -> Claim {
        match self.slots.get(&key) {
            Some(&existing) if existing == id => Claim::AlreadyOwner,
            Some(&existing) => Claim::LostTo(existing),
            None => {
                self.slots.insert(key, id);
                Claim::Won
            }
        }
    }

    /// An instance releases the type's slot on detach. Only the owner clears
    /// the slot.
    pub fn release(&mut self, key: TypeId, id: InstanceId) -> Release {
        match self.slots.get(&key) {
            Some(&existing) if existing == id => {
                self.slots.remove(&key);
                Release::Owner
            }
            _ => Release::NotOwner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Instances, Parent};
    use crate::policy::{Singleton, SingletonKind};

    struct NetworkSession;

    impl Singleton for NetworkSession {
        const KIND: SingletonKind = SingletonKind::Global;
    }

    fn key() -> TypeId {
        TypeId::of::<NetworkSession>()
    }

    fn two_ids() -> (InstanceId, InstanceId) {
        let mut instances = Instances::default();
        let a = instances.spawn(key(), Box::new(NetworkSession), Parent::Container);
        let b = instances.spawn(key(), Box::new(NetworkSession), Parent::Container);
        (a, b)
    }

    #[test]
    fn first_claim_wins_the_slot() {
        // Given
        let mut slots = Slots::default();
        let (a, _) = two_ids();

        // When
        let claim = slots.claim(key(), a);

        // Then
        assert_eq!(claim, Claim::Won);
        assert_eq!(slots.get(key()), Some(a));
    }

    #[test]
    fn second_claim_loses_to_the_first() {
        let mut slots = Slots::default();
        let (a, b) = two_ids();
        slots.claim(key(), a);

        let claim = slots.claim(key(), b);

        assert_eq!(claim, Claim::LostTo(a));
        assert_eq!(slots.get(key()), Some(a));
    }

    #[test]
    fn cached_instance_claims_as_already_owner() {
        let mut slots = Slots::default();
        let (a, _) = two_ids();
        slots.cache(key(), a);

        assert_eq!(slots.claim(key(), a), Claim::AlreadyOwner);
    }

    #[test]
    fn owner_release_clears_the_slot() {
        let mut slots = Slots::default();
        let (a, _) = two_ids();
        slots.claim(key(), a);

        let release = slots.release(key(), a);

        assert_eq!(release, Release::Owner);
        assert!(!slots.contains(key()));
    }

    #[test]
    fn non_owner_release_leaves_the_slot() {
        let mut slots = Slots::default();
        let (a, b) = two_ids();
        slots.claim(key(), a);

        let release = slots.release(key(), b);

        assert_eq!(release, Release::NotOwner);
        assert_eq!(slots.get(key()), Some(a));
    }

    #[test]
    fn release_on_absent_slot_is_not_owner() {
        let mut slots = Slots::default();
        let (a, _) = two_ids();

        assert_eq!(slots.release(key(), a), Release::NotOwner);
    }
}
