//! Per-type factory resolution.
//!
//! A type's [`CreationPolicy`] is inspected once and bound into a factory
//! closure; the binding is cached by `std::any::TypeId` in a `DashMap` with
//! a lock-free fast path for the common repeat lookup. Invoking the factory
//! is the only point where instances are found or created — resolution
//! itself has no side effects.
//!
//! Factories receive the target scope as an explicit parameter (`None`
//! means "no scope context": the instance is created directly under the
//! global container) rather than reading ambient "current scope" state.

use std::{any::TypeId, sync::Arc};

use dashmap::DashMap;

use crate::{
    error::ResolveError,
    instance::InstanceId,
    policy::{CreationPolicy, Singleton, SingletonKind, default_template_path, short_type_name},
    runtime::Runtime,
    scope::ScopeId,
};

/// The result of invoking a bound factory.
pub(crate) struct Resolution {
    /// The found or created instance.
    pub id: InstanceId,
    /// True iff the factory created the instance (as opposed to finding a
    /// live one). Created instances are attached by the registry itself.
    pub created: bool,
}

/// A factory bound to one singleton type's creation policy.
pub(crate) type Factory =
    Arc<dyn Fn(&mut Runtime, Option<ScopeId>) -> Result<Resolution, ResolveError> + Send + Sync>;

/// Cache of bound factories, one per singleton type.
#[derive(Default)]
pub(crate) struct FactoryCache {
    factories: DashMap<TypeId, Factory>,
}

impl FactoryCache {
    /// Get the bound factory for `T`, binding it from `T::policy()` on first
    /// use. The policy is inspected exactly once per type.
    pub fn resolve<T: Singleton>(&self) -> Factory {
        let key = TypeId::of::<T>();

        // Fast path: already bound.
        if let Some(factory) = self.factories.get(&key) {
            return factory.clone();
        }

        let factory = bind::<T>();
        self.factories.entry(key).or_insert(factory).clone()
    }
}

/// The scope filter a find step uses: scene-scoped types search their target
/// scope only, global types search everywhere.
fn find_filter<T: Singleton>(scope: Option<ScopeId>) -> Option<ScopeId> {
    match T::KIND {
        SingletonKind::Global => None,
        SingletonKind::SceneScoped => scope,
    }
}

/// Bind `T::policy()` into a factory closure.
fn bind<T: Singleton>() -> Factory {
    match T::policy() {
        CreationPolicy::FindOnly => Arc::new(|runtime: &mut Runtime, scope: Option<ScopeId>| {
            runtime
                .find_live(TypeId::of::<T>(), find_filter::<T>(scope))
                .map(|id| Resolution { id, created: false })
                .ok_or_else(|| ResolveError::UnableToResolve {
                    type_name: short_type_name::<T>(),
                    reason: "no live instance found and the creation policy is find-only".into(),
                })
        }),

        CreationPolicy::CreateBare(ctor) => Arc::new(move |runtime: &mut Runtime, scope: Option<ScopeId>| {
            if let Some(id) = runtime.find_live(TypeId::of::<T>(), find_filter::<T>(scope)) {
                return Ok(Resolution { id, created: false });
            }
            log::debug!("lazily creating bare instance of `{}`", short_type_name::<T>());
            let id = runtime.spawn_resolved(TypeId::of::<T>(), Box::new(ctor()), scope);
            Ok(Resolution { id, created: true })
        }),

        CreationPolicy::CreateFromTemplate(declared) => {
            // The path is resolved once, at binding time.
            let path = declared
                .map(str::to_owned)
                .unwrap_or_else(default_template_path::<T>);
            Arc::new(move |runtime: &mut Runtime, scope: Option<ScopeId>| {
                if let Some(id) = runtime.find_live(TypeId::of::<T>(), find_filter::<T>(scope)) {
                    return Ok(Resolution { id, created: false });
                }
                let Some(template) = runtime.templates.load(&path) else {
                    #[cfg(debug_assertions)]
                    log::error!(
                        "missing template `{}` for `{}`: expected a loadable template at that \
                         path under the templates root",
                        path,
                        short_type_name::<T>()
                    );
                    return Err(ResolveError::TemplateNotFound {
                        type_name: short_type_name::<T>(),
                        path: path.clone(),
                    });
                };
                let Ok(value) = template.instantiate().downcast::<T>() else {
                    // A template exists at the path but produces the wrong
                    // type; to the requester that template is missing.
                    #[cfg(debug_assertions)]
                    log::error!(
                        "template `{}` does not produce a value of `{}`",
                        path,
                        short_type_name::<T>()
                    );
                    return Err(ResolveError::TemplateNotFound {
                        type_name: short_type_name::<T>(),
                        path: path.clone(),
                    });
                };
                log::debug!(
                    "instantiating `{}` from template `{}`",
                    short_type_name::<T>(),
                    path
                );
                let id = runtime.spawn_resolved(TypeId::of::<T>(), value, scope);
                Ok(Resolution { id, created: true })
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DebugConsole;

    impl Singleton for DebugConsole {
        const KIND: SingletonKind = SingletonKind::Global;
    }

    #[test]
    fn resolve_returns_the_same_binding() {
        // Given
        let cache = FactoryCache::default();

        // When
        let first = cache.resolve::<DebugConsole>();
        let second = cache.resolve::<DebugConsole>();

        // Then
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn binding_alone_has_no_side_effects() {
        // Given
        let cache = FactoryCache::default();
        let runtime = Runtime::new();

        // When
        cache.resolve::<DebugConsole>();

        // Then
        assert!(!runtime.is_instantiated::<DebugConsole>());
    }
}
