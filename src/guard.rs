//! Authoring-time validation of a scope's singleton population.
//!
//! This is the advisory half of duplicate handling: it enumerates the live
//! instances of a scope, reports exactly one finding per offending type, and
//! never aborts or mutates registry state. The enforcing half lives in the
//! attach path, where later claimants of an occupied key are destroyed
//! unconditionally.

use std::any::TypeId;

use crate::{
    instance::Parent,
    runtime::Runtime,
    scope::ScopeId,
};

/// A finding produced by authoring-time validation. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// More than one live instance of a singleton type in the same scope.
    /// At runtime the first to attach would win and the rest would be
    /// destroyed.
    DuplicateInstances {
        /// Short name of the offending singleton type.
        type_name: &'static str,
        /// The scope holding the duplicates.
        scope: ScopeId,
        /// How many live instances were found.
        count: usize,
    },
    /// A template-backed type is present in the scope but its template path
    /// does not resolve; runtime resolution would fail.
    MissingTemplate {
        /// Short name of the template-backed singleton type.
        type_name: &'static str,
        /// The template path that failed to load.
        path: String,
    },
}

/// Per-type tally built while scanning a scope.
struct Tally {
    type_id: TypeId,
    type_name: &'static str,
    count: usize,
    template_path: Option<String>,
}

/// Validate a scope's live instances. Reports one [`ValidationIssue`] per
/// offending type, logs each finding, and fires `on_validate` on every
/// instance in the scope. Registry state is not touched.
pub(crate) fn validate_scope(runtime: &mut Runtime, scope: ScopeId) -> Vec<ValidationIssue> {
    let mut tallies: Vec<Tally> = Vec::new();
    let mut scanned = Vec::new();

    for (id, instance) in runtime.instances.iter() {
        if instance.parent != Parent::Scope(scope) {
            continue;
        }
        scanned.push(id);
        match tallies.iter_mut().find(|tally| tally.type_id == instance.type_id) {
            Some(tally) => tally.count += 1,
            None => tallies.push(Tally {
                type_id: instance.type_id,
                type_name: instance.type_name(),
                count: 1,
                template_path: instance.value.template_path(),
            }),
        }
    }

    let mut issues = Vec::new();
    for tally in &tallies {
        if tally.count > 1 {
            log::error!(
                "more than one instance of `{}` present in scope {:?} ({} found)",
                tally.type_name,
                scope,
                tally.count
            );
            issues.push(ValidationIssue::DuplicateInstances {
                type_name: tally.type_name,
                scope,
                count: tally.count,
            });
        }
        if let Some(path) = &tally.template_path
            && runtime.templates.load(path).is_none()
        {
            log::error!(
                "missing template `{}` for `{}`; runtime resolution will fail",
                path,
                tally.type_name
            );
            issues.push(ValidationIssue::MissingTemplate {
                type_name: tally.type_name,
                path: path.clone(),
            });
        }
    }

    for id in scanned {
        if let Some(instance) = runtime.instances.get_mut(id) {
            instance.value.on_validate();
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::policy::{CreationPolicy, Singleton, SingletonKind};

    struct WaveSpawner;

    impl Singleton for WaveSpawner {
        const KIND: SingletonKind = SingletonKind::SceneScoped;
    }

    struct SkyboxRig;

    impl Singleton for SkyboxRig {
        const KIND: SingletonKind = SingletonKind::SceneScoped;

        fn policy() -> CreationPolicy<Self> {
            CreationPolicy::CreateFromTemplate(None)
        }
    }

    #[test]
    fn duplicates_yield_one_issue_per_type() {
        // Given
        let mut runtime = Runtime::new();
        let hub = runtime.load_scope("Hub");
        runtime.spawn_in(hub, WaveSpawner);
        runtime.spawn_in(hub, WaveSpawner);
        runtime.spawn_in(hub, WaveSpawner);

        // When
        let issues = runtime.validate_scope(hub);

        // Then
        assert_eq!(
            issues,
            vec![ValidationIssue::DuplicateInstances {
                type_name: "WaveSpawner",
                scope: hub,
                count: 3,
            }]
        );
    }

    #[test]
    fn unresolvable_template_path_is_reported() {
        // Given: a template-backed type present in the scope, no template
        // registered anywhere.
        let mut runtime = Runtime::new();
        let hub = runtime.load_scope("Hub");
        runtime.spawn_in(hub, SkyboxRig);

        // When
        let issues = runtime.validate_scope(hub);

        // Then
        assert_eq!(
            issues,
            vec![ValidationIssue::MissingTemplate {
                type_name: "SkyboxRig",
                path: "Singletons/SkyboxRig".to_string(),
            }]
        );
    }

    #[test]
    fn validation_does_not_mutate_registry_state() {
        // Given
        let mut runtime = Runtime::new();
        let hub = runtime.load_scope("Hub");
        let first = runtime.spawn_in(hub, WaveSpawner);
        let second = runtime.spawn_in(hub, WaveSpawner);

        // When
        runtime.validate_scope(hub);

        // Then: both duplicates are still live and attach still decides.
        assert!(runtime.contains(first));
        assert!(runtime.contains(second));
        runtime.attach(first);
        runtime.attach(second);
        assert!(runtime.contains(first));
        assert!(!runtime.contains(second));
    }

    #[test]
    fn validate_hook_fires_for_every_scanned_instance() {
        static VALIDATED: AtomicU32 = AtomicU32::new(0);

        struct TriggerVolume;

        impl Singleton for TriggerVolume {
            const KIND: SingletonKind = SingletonKind::SceneScoped;

            fn on_validate(&mut self) {
                VALIDATED.fetch_add(1, Ordering::Relaxed);
            }
        }

        let mut runtime = Runtime::new();
        let hub = runtime.load_scope("Hub");
        let arena = runtime.load_scope("Arena");
        runtime.spawn_in(hub, TriggerVolume);
        runtime.spawn_in(hub, TriggerVolume);
        runtime.spawn_in(arena, TriggerVolume);

        runtime.validate_scope(hub);

        assert_eq!(VALIDATED.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn clean_scope_yields_no_issues() {
        let mut runtime = Runtime::new();
        let hub = runtime.load_scope("Hub");
        runtime.spawn_in(hub, WaveSpawner);

        assert!(runtime.validate_scope(hub).is_empty());
    }
}
