//! Instance handles and the owning instance store.
//!
//! The runtime owns every live singleton instance in a generational slab.
//! An [`InstanceId`] combines a slot index with a [`Generation`]: when a
//! slot is reused after its instance is destroyed, the generation is bumped
//! first, so stale handles are detected by generation mismatch and can never
//! reach a destroyed instance.

use std::any::{Any, TypeId};

use crate::{
    policy::{Singleton, SingletonKind, resolved_template_path, short_type_name},
    scope::ScopeId,
};

/// The generation of an instance slot, incremented each time the slot's
/// instance is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u32);

impl Generation {
    /// The first generation of a slot.
    const FIRST: Self = Self(0);

    /// Get the next generation from the current.
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// A handle to a live singleton instance.
///
/// Handles stay valid until the instance is destroyed; afterwards every
/// access through them returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId {
    index: u32,
    generation: Generation,
}

impl InstanceId {
    /// The slot index of this handle.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// The generation this handle was issued under.
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Object-safe view of a singleton instance: downcasting plus the
/// type-level declarations and hooks resolution needs behind type erasure.
pub(crate) trait AnySingleton: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn kind(&self) -> SingletonKind;
    fn type_name(&self) -> &'static str;
    fn template_path(&self) -> Option<String>;
    fn on_attached(&mut self, was_discarded: bool);
    fn on_detached(&mut self, was_discarded: bool);
    fn on_validate(&mut self);
}

impl<T: Singleton> AnySingleton for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind(&self) -> SingletonKind {
        T::KIND
    }

    fn type_name(&self) -> &'static str {
        short_type_name::<T>()
    }

    fn template_path(&self) -> Option<String> {
        resolved_template_path::<T>()
    }

    fn on_attached(&mut self, was_discarded: bool) {
        Singleton::on_attached(self, was_discarded);
    }

    fn on_detached(&mut self, was_discarded: bool) {
        Singleton::on_detached(self, was_discarded);
    }

    fn on_validate(&mut self) {
        Singleton::on_validate(self);
    }
}

/// Where an instance currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parent {
    /// Owned by a scope; destroyed when the scope unloads.
    Scope(ScopeId),
    /// Reparented under the global container; survives scope unloads.
    Container,
}

/// A live instance and its bookkeeping.
pub(crate) struct Instance {
    pub type_id: TypeId,
    pub value: Box<dyn AnySingleton>,
    pub parent: Parent,
    pub attached: bool,
}

impl Instance {
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.value.type_name()
    }
}

/// A slot in the instance store.
struct Slot {
    generation: Generation,
    instance: Option<Instance>,
}

/// The owning store for all live singleton instances.
///
/// Slots are reused through a dead pool; reuse bumps the slot generation so
/// stale [`InstanceId`]s miss rather than alias the new occupant.
#[derive(Default)]
pub(crate) struct Instances {
    slots: Vec<Slot>,
    dead: Vec<u32>,
}

impl Instances {
    /// Store a new instance and return its handle.
    pub fn spawn(
        &mut self,
        type_id: TypeId,
        value: Box<dyn AnySingleton>,
        parent: Parent,
    ) -> InstanceId {
        let instance = Instance {
            type_id,
            value,
            parent,
            attached: false,
        };
        match self.dead.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.instance = Some(instance);
                InstanceId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: Generation::FIRST,
                    instance: Some(instance),
                });
                InstanceId {
                    index,
                    generation: Generation::FIRST,
                }
            }
        }
    }

    /// Get the instance behind a handle, if it is still live.
    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.instance.as_ref())
    }

    /// Mutable variant of [`get`](Instances::get).
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.instance.as_mut())
    }

    /// Remove and return the instance behind a handle. The slot's generation
    /// is bumped so the handle (and any copy of it) goes stale.
    pub fn remove(&mut self, id: InstanceId) -> Option<Instance> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation || slot.instance.is_none() {
            return None;
        }
        slot.generation = slot.generation.next();
        self.dead.push(id.index);
        slot.instance.take()
    }

    /// Iterate all live instances in slot order, which is spawn order for
    /// slots that have not been recycled.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.instance.as_ref().map(|instance| {
                (
                    InstanceId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    instance,
                )
            })
        })
    }

    /// The number of live instances.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len() - self.dead.len()
    }

    /// True iff no instances are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::CreationPolicy;

    struct InputRouter {
        bindings: u32,
    }

    impl Singleton for InputRouter {
        const KIND: SingletonKind = SingletonKind::Global;
    }

    struct PathfindingGrid;

    impl Singleton for PathfindingGrid {
        const KIND: SingletonKind = SingletonKind::SceneScoped;

        fn policy() -> CreationPolicy<Self> {
            CreationPolicy::CreateFromTemplate(None)
        }
    }

    fn store_with(value: impl Singleton) -> (Instances, InstanceId) {
        let mut instances = Instances::default();
        let type_id = value.as_any().type_id();
        let id = instances.spawn(type_id, Box::new(value), Parent::Container);
        (instances, id)
    }

    #[test]
    fn spawned_instance_is_reachable() {
        // Given
        let (instances, id) = store_with(InputRouter { bindings: 4 });

        // When
        let instance = instances.get(id).unwrap();

        // Then
        let router = instance.value.as_any().downcast_ref::<InputRouter>().unwrap();
        assert_eq!(router.bindings, 4);
        assert!(!instance.attached);
    }

    #[test]
    fn removed_handle_goes_stale() {
        // Given
        let (mut instances, id) = store_with(InputRouter { bindings: 0 });

        // When
        let removed = instances.remove(id);

        // Then
        assert!(removed.is_some());
        assert!(instances.get(id).is_none());
        assert!(instances.remove(id).is_none());
    }

    #[test]
    fn recycled_slot_does_not_alias_old_handle() {
        // Given
        let (mut instances, first) = store_with(InputRouter { bindings: 1 });
        instances.remove(first);

        // When
        let second = instances.spawn(
            std::any::TypeId::of::<InputRouter>(),
            Box::new(InputRouter { bindings: 2 }),
            Parent::Container,
        );

        // Then
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(instances.get(first).is_none());
        assert_eq!(
            instances
                .get(second)
                .unwrap()
                .value
                .as_any()
                .downcast_ref::<InputRouter>()
                .unwrap()
                .bindings,
            2
        );
    }

    #[test]
    fn iteration_follows_spawn_order() {
        let mut instances = Instances::default();
        let a = instances.spawn(
            std::any::TypeId::of::<InputRouter>(),
            Box::new(InputRouter { bindings: 1 }),
            Parent::Container,
        );
        let b = instances.spawn(
            std::any::TypeId::of::<InputRouter>(),
            Box::new(InputRouter { bindings: 2 }),
            Parent::Container,
        );

        let order: Vec<_> = instances.iter().map(|(id, _)| id).collect();

        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn len_tracks_live_instances() {
        let mut instances = Instances::default();
        assert!(instances.is_empty());

        let id = instances.spawn(
            std::any::TypeId::of::<InputRouter>(),
            Box::new(InputRouter { bindings: 0 }),
            Parent::Container,
        );
        assert_eq!(instances.len(), 1);

        instances.remove(id);
        assert!(instances.is_empty());
    }

    #[test]
    fn erased_view_reports_type_declarations() {
        let (instances, id) = store_with(PathfindingGrid);

        let instance = instances.get(id).unwrap();

        assert_eq!(instance.value.kind(), SingletonKind::SceneScoped);
        assert_eq!(instance.type_name(), "PathfindingGrid");
        assert_eq!(
            instance.value.template_path(),
            Some("Singletons/PathfindingGrid".to_string())
        );
    }
}
