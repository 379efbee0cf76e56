//! The singleton runtime.
//!
//! [`Runtime`] is the single owner of all lifecycle state: loaded scopes,
//! live instances, both registries, the bound-factory cache, the template
//! loader, and the global container. Consumers resolve instances through
//! the typed `get_*` APIs; the host integration layer drives lifecycle by
//! calling [`spawn_in`], [`attach`], [`detach`], and the scope management
//! methods.
//!
//! # Lifecycle host contract
//!
//! For every host-authored instance, the host must deliver exactly one
//! [`attach`] once the instance becomes live, and at most one [`detach`]
//! when it stops being live, in that order. Two exceptions, both owned by
//! the registry:
//!
//! - instances *created* by resolution are attached by the registry itself;
//! - an instance that loses the first-wins duplicate race is destroyed
//!   during its attach, and must not be detached afterwards.
//!
//! Contract violations (double attach, detach before attach, stale handles)
//! panic. Everything recoverable is surfaced as a [`ResolveError`].
//!
//! All mutation happens through `&mut self` on the host's main thread; hook
//! callbacks receive `&mut self` of the instance only and cannot re-enter
//! the runtime.
//!
//! [`spawn_in`]: Runtime::spawn_in
//! [`attach`]: Runtime::attach
//! [`detach`]: Runtime::detach

use std::any::TypeId;

use crate::{
    container::Container,
    error::ResolveError,
    factory::FactoryCache,
    guard::{self, ValidationIssue},
    instance::{AnySingleton, InstanceId, Instances, Parent},
    policy::{Singleton, SingletonKind, short_type_name},
    registry::{Claim, Release, global, scoped},
    scope::{ScopeId, Scopes},
    template::{MemoryTemplates, TemplateLoader},
};

/// The central lifecycle manager for singleton component instances.
pub struct Runtime {
    pub(crate) scopes: Scopes,
    pub(crate) instances: Instances,
    pub(crate) globals: global::Slots,
    pub(crate) scoped: scoped::Entries,
    pub(crate) factories: FactoryCache,
    pub(crate) templates: Box<dyn TemplateLoader>,
    pub(crate) container: Container,
    shutting_down: bool,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create a runtime with no templates available.
    pub fn new() -> Self {
        Self::with_templates(MemoryTemplates::new())
    }

    /// Create a runtime backed by the given template loader.
    pub fn with_templates(templates: impl TemplateLoader + 'static) -> Self {
        Self {
            scopes: Scopes::default(),
            instances: Instances::default(),
            globals: global::Slots::default(),
            scoped: scoped::Entries::default(),
            factories: FactoryCache::default(),
            templates: Box::new(templates),
            container: Container::default(),
            shutting_down: false,
        }
    }

    // ==================== Scope management ====================

    /// Load a new scope. The first loaded scope becomes active.
    pub fn load_scope(&mut self, name: impl Into<String>) -> ScopeId {
        self.scopes.load(name)
    }

    /// Unload a scope, detaching every live attached instance owned by it
    /// and dropping spawned-but-unattached ones. No instance outlives its
    /// owning scope's unload; container members are untouched.
    pub fn unload_scope(&mut self, scope: ScopeId) {
        assert!(
            self.scopes.is_loaded(scope),
            "unload delivered for scope {scope:?} which is not loaded"
        );
        let doomed: Vec<(InstanceId, bool)> = self
            .instances
            .iter()
            .filter(|(_, instance)| instance.parent == Parent::Scope(scope))
            .map(|(id, instance)| (id, instance.attached))
            .collect();
        for (id, attached) in doomed {
            if attached {
                self.detach(id);
            } else {
                self.destroy_unattached(id);
            }
        }
        self.scopes.unload(scope);
    }

    /// Make a loaded scope the active one.
    pub fn set_active_scope(&mut self, scope: ScopeId) {
        self.scopes.set_active(scope);
    }

    /// The currently active scope, if any scope has been loaded.
    #[inline]
    pub fn active_scope(&self) -> Option<ScopeId> {
        self.scopes.active()
    }

    /// True iff the scope is currently loaded.
    #[inline]
    pub fn is_scope_loaded(&self, scope: ScopeId) -> bool {
        self.scopes.is_loaded(scope)
    }

    /// Flag the beginning of application teardown. Idempotent; once set,
    /// resolution never creates new instances and only serves cached ones.
    pub fn begin_shutdown(&mut self) {
        if !self.shutting_down {
            log::debug!("singleton runtime entering shutdown: creation disabled");
            self.shutting_down = true;
        }
    }

    /// True once [`begin_shutdown`](Runtime::begin_shutdown) has been called.
    #[inline]
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    // ==================== Host lifecycle integration ====================

    /// Store a host-authored instance in a loaded scope. The instance is
    /// not live until the host delivers [`attach`](Runtime::attach).
    pub fn spawn_in<T: Singleton>(&mut self, scope: ScopeId, value: T) -> InstanceId {
        assert!(
            self.scopes.is_loaded(scope),
            "cannot spawn `{}` into scope {scope:?}: scope is not loaded",
            short_type_name::<T>()
        );
        self.instances
            .spawn(TypeId::of::<T>(), Box::new(value), Parent::Scope(scope))
    }

    /// Deliver the attach event for an instance: it becomes live and claims
    /// its registry key. If a different instance already holds the key, the
    /// newcomer loses the first-wins race and is destroyed immediately,
    /// observing `was_discarded = true` in its hooks.
    pub fn attach(&mut self, id: InstanceId) {
        let instance = self
            .instances
            .get(id)
            .unwrap_or_else(|| panic!("attach delivered for unknown or destroyed instance {id:?}"));
        assert!(
            !instance.attached,
            "attach delivered twice for instance {id:?} of `{}`",
            instance.type_name()
        );
        let key = instance.type_id;
        let kind = instance.value.kind();
        let parent = instance.parent;

        let claim = match kind {
            SingletonKind::Global => self.globals.claim(key, id),
            SingletonKind::SceneScoped => {
                let Parent::Scope(scope) = parent else {
                    panic!(
                        "scene-scoped instance {id:?} of `{}` has no owning scope",
                        self.instances.get(id).map(|i| i.type_name()).unwrap_or("?")
                    );
                };
                self.scoped.claim(key, scope, id)
            }
        };

        match claim {
            Claim::LostTo(existing) => {
                let mut discarded = self
                    .instances
                    .remove(id)
                    .expect("claimed instance vanished");
                log::warn!(
                    "instance of `{}` already present ({existing:?}); discarding {id:?}",
                    discarded.type_name()
                );
                discarded.value.on_attached(true);
                discarded.value.on_detached(true);
            }
            Claim::Won | Claim::AlreadyOwner => {
                if kind == SingletonKind::Global {
                    self.container.adopt(id);
                }
                let instance = self.instances.get_mut(id).expect("claimed instance vanished");
                if kind == SingletonKind::Global {
                    instance.parent = Parent::Container;
                }
                instance.attached = true;
                instance.value.on_attached(false);
            }
        }
    }

    /// Deliver the detach event for an attached instance: its registry key
    /// is released if it owns one, its detach hook fires, and the instance
    /// is destroyed. The handle (and all copies) goes stale.
    pub fn detach(&mut self, id: InstanceId) {
        let instance = self
            .instances
            .get(id)
            .unwrap_or_else(|| panic!("detach delivered for unknown or destroyed instance {id:?}"));
        assert!(
            instance.attached,
            "detach delivered before attach for instance {id:?} of `{}`",
            instance.type_name()
        );
        let key = instance.type_id;
        let kind = instance.value.kind();
        let parent = instance.parent;

        let release = match kind {
            SingletonKind::Global => self.globals.release(key, id),
            SingletonKind::SceneScoped => {
                let Parent::Scope(scope) = parent else {
                    unreachable!("scene-scoped instances are never reparented");
                };
                self.scoped.release(key, scope, id)
            }
        };

        self.container.forget(id);
        let mut destroyed = self.instances.remove(id).expect("released instance vanished");
        destroyed.value.on_detached(matches!(release, Release::NotOwner));
    }

    /// Destroy a spawned-but-unattached instance, dropping any record a
    /// resolution find may have cached for it. No hooks fire: hooks are
    /// paired with attach, which never happened.
    fn destroy_unattached(&mut self, id: InstanceId) {
        let instance = self.instances.remove(id).expect("instance vanished");
        self.globals.release(instance.type_id, id);
        if let Parent::Scope(scope) = instance.parent {
            self.scoped.release(instance.type_id, scope, id);
        }
    }

    // ==================== Global resolution ====================

    /// Resolve the global instance of `T`, lazily invoking its bound
    /// factory on first access. Repeated calls with no intervening detach
    /// return the identical instance.
    pub fn get_instance<T: Singleton>(&mut self) -> Result<InstanceId, ResolveError> {
        assert_kind::<T>(SingletonKind::Global);
        let key = TypeId::of::<T>();
        if let Some(id) = self.globals.get(key) {
            return Ok(id);
        }
        if self.shutting_down {
            return Err(ResolveError::UnableToResolve {
                type_name: short_type_name::<T>(),
                reason: "the application is shutting down; no new instances are created".into(),
            });
        }
        let factory = self.factories.resolve::<T>();
        let scope = self.scopes.active();
        let resolution = factory(self, scope)?;
        self.globals.cache(key, resolution.id);
        if resolution.created {
            self.attach(resolution.id);
        }
        Ok(resolution.id)
    }

    /// True iff a global instance of `T` is currently registered.
    pub fn is_instantiated<T: Singleton>(&self) -> bool {
        assert_kind::<T>(SingletonKind::Global);
        self.globals.contains(TypeId::of::<T>())
    }

    // ==================== Scoped resolution ====================

    /// Resolve the instance of `T` registered in `scope`, lazily invoking
    /// the bound factory with the scope as explicit creation context.
    pub fn get_scoped_instance<T: Singleton>(
        &mut self,
        scope: ScopeId,
    ) -> Result<InstanceId, ResolveError> {
        assert_kind::<T>(SingletonKind::SceneScoped);
        if !self.scopes.is_loaded(scope) {
            return Err(ResolveError::ScopeNotLoaded { scope });
        }
        let key = TypeId::of::<T>();
        if let Some(id) = self.scoped.get(key, scope) {
            return Ok(id);
        }
        if self.shutting_down {
            return Err(ResolveError::UnableToResolve {
                type_name: short_type_name::<T>(),
                reason: "the application is shutting down; no new instances are created".into(),
            });
        }
        let factory = self.factories.resolve::<T>();
        let resolution = factory(self, Some(scope))?;
        self.scoped.cache(key, scope, resolution.id);
        if resolution.created {
            self.attach(resolution.id);
        }
        Ok(resolution.id)
    }

    /// Resolve the instance of `T` for the currently active scope.
    ///
    /// Panics if no scope has ever been loaded; resolving before the first
    /// scope load is a host contract violation.
    pub fn get_active_scene_instance<T: Singleton>(&mut self) -> Result<InstanceId, ResolveError> {
        assert_kind::<T>(SingletonKind::SceneScoped);
        let scope = self
            .scopes
            .active()
            .expect("no scope loaded; load a scope before resolving active-scene singletons");
        self.get_scoped_instance::<T>(scope)
    }

    /// True iff `scope` is loaded and holds a registered instance of `T`.
    /// Unloaded scopes report `false` unconditionally.
    pub fn is_instantiated_in<T: Singleton>(&self, scope: ScopeId) -> bool {
        assert_kind::<T>(SingletonKind::SceneScoped);
        self.scopes.is_loaded(scope) && self.scoped.contains(TypeId::of::<T>(), scope)
    }

    /// Snapshot of the scopes currently holding a registered instance of
    /// `T`. Order follows map iteration and is not stable across
    /// insert/remove.
    pub fn instantiated_scopes<T: Singleton>(&self) -> Vec<ScopeId> {
        assert_kind::<T>(SingletonKind::SceneScoped);
        self.scoped.scopes(TypeId::of::<T>())
    }

    /// Snapshot of the registered instances of `T` across all scopes.
    pub fn scoped_instances<T: Singleton>(&self) -> Vec<InstanceId> {
        assert_kind::<T>(SingletonKind::SceneScoped);
        self.scoped.instances(TypeId::of::<T>())
    }

    // ==================== Validation ====================

    /// Authoring-time validation of a scope: reports duplicate singleton
    /// instances and unresolvable template paths without mutating any
    /// registry state. See [`ValidationIssue`].
    pub fn validate_scope(&mut self, scope: ScopeId) -> Vec<ValidationIssue> {
        guard::validate_scope(self, scope)
    }

    // ==================== Instance access ====================

    /// Borrow the instance behind a handle, if it is still live and of
    /// type `T`.
    pub fn get<T: Singleton>(&self, id: InstanceId) -> Option<&T> {
        self.instances
            .get(id)
            .and_then(|instance| instance.value.as_any().downcast_ref::<T>())
    }

    /// Mutable variant of [`get`](Runtime::get).
    pub fn get_mut<T: Singleton>(&mut self, id: InstanceId) -> Option<&mut T> {
        self.instances
            .get_mut(id)
            .and_then(|instance| instance.value.as_any_mut().downcast_mut::<T>())
    }

    /// True iff the handle refers to a live instance.
    #[inline]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.get(id).is_some()
    }

    /// The instances currently grouped under the global container, in
    /// adoption order.
    #[inline]
    pub fn container_members(&self) -> &[InstanceId] {
        self.container.members()
    }

    // ==================== Factory support ====================

    /// Find the first live instance of a type, in spawn order, optionally
    /// restricted to one scope.
    pub(crate) fn find_live(&self, key: TypeId, scope: Option<ScopeId>) -> Option<InstanceId> {
        self.instances
            .iter()
            .find(|(_, instance)| {
                instance.type_id == key
                    && scope.is_none_or(|scope| instance.parent == Parent::Scope(scope))
            })
            .map(|(id, _)| id)
    }

    /// Store a factory-created instance. With no scope context the instance
    /// is placed directly under the global container.
    pub(crate) fn spawn_resolved(
        &mut self,
        key: TypeId,
        value: Box<dyn AnySingleton>,
        scope: Option<ScopeId>,
    ) -> InstanceId {
        let parent = match scope {
            Some(scope) => Parent::Scope(scope),
            None => Parent::Container,
        };
        self.instances.spawn(key, value, parent)
    }
}

/// Guard the typed APIs against dual use: a type declared for one registry
/// cannot be resolved through the other.
fn assert_kind<T: Singleton>(expected: SingletonKind) {
    if T::KIND != expected {
        panic!(
            "singleton type `{}` is declared {}, cannot be used through the {} registry",
            short_type_name::<T>(),
            T::KIND,
            expected
        );
    }
}
