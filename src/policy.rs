//! Singleton type declarations.
//!
//! Every singleton type declares two things through the [`Singleton`] trait:
//! which registry it lives in ([`SingletonKind`]) and how an instance is
//! produced when resolution finds none ([`CreationPolicy`]). The policy is a
//! plain enum value rather than an attribute scan: exactly one policy per
//! type, resolved once into a bound factory and cached for the lifetime of
//! the cache.
//!
//! # Example
//!
//! ```rust,ignore
//! struct AudioMixer {
//!     channels: u32,
//! }
//!
//! impl Singleton for AudioMixer {
//!     const KIND: SingletonKind = SingletonKind::Global;
//!
//!     fn policy() -> CreationPolicy<Self> {
//!         CreationPolicy::CreateBare(|| AudioMixer { channels: 8 })
//!     }
//! }
//! ```

use std::fmt;

/// The registry a singleton type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonKind {
    /// At most one live instance per process. Attached instances are
    /// reparented under the global container and survive scope unloads.
    Global,
    /// At most one live instance per loaded scope.
    SceneScoped,
}

impl fmt::Display for SingletonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingletonKind::Global => write!(f, "global"),
            SingletonKind::SceneScoped => write!(f, "scene-scoped"),
        }
    }
}

/// How an instance of `T` is produced when resolution finds no live one.
pub enum CreationPolicy<T> {
    /// Only find an existing live instance; never create. Resolution with no
    /// live instance fails with `UnableToResolve`.
    FindOnly,
    /// Find an existing live instance, or construct a fresh one from the
    /// given constructor.
    CreateBare(fn() -> T),
    /// Find an existing live instance, or instantiate one from the template
    /// at the given path. `None` derives the conventional path
    /// `"Singletons/" + TypeName`.
    CreateFromTemplate(Option<&'static str>),
}

/// A singleton component type.
///
/// Implementors pick a [`SingletonKind`] and optionally override [`policy`]
/// (the default is find-only) and the lifecycle hooks. Hooks receive
/// `&mut self` only and cannot re-enter the registry.
///
/// [`policy`]: Singleton::policy
pub trait Singleton: 'static + Send + Sync {
    /// Which registry instances of this type are tracked in.
    const KIND: SingletonKind;

    /// The creation policy used when resolution finds no live instance.
    /// Computed once per type and cached as a bound factory.
    fn policy() -> CreationPolicy<Self>
    where
        Self: Sized,
    {
        CreationPolicy::FindOnly
    }

    /// Called once when the instance becomes the registered one
    /// (`was_discarded = false`), or when it loses the first-wins race and is
    /// about to be destroyed (`was_discarded = true`).
    fn on_attached(&mut self, _was_discarded: bool) {}

    /// Called once when the instance stops being live. `was_discarded`
    /// mirrors the value passed to [`on_attached`](Singleton::on_attached).
    fn on_detached(&mut self, _was_discarded: bool) {}

    /// Called during authoring-time validation of the instance's scope.
    fn on_validate(&mut self) {}
}

/// Root of the conventional template path for singleton types.
pub const TEMPLATE_ROOT: &str = "Singletons";

/// The template path derived for a type that declares none:
/// `"Singletons/" + TypeName`.
pub fn default_template_path<T>() -> String {
    format!("{TEMPLATE_ROOT}/{}", short_type_name::<T>())
}

/// The unqualified name of `T`, used in template paths and diagnostics.
#[inline]
pub(crate) fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

/// The template path a type's policy resolves to, if it is template-backed.
pub(crate) fn resolved_template_path<T: Singleton>() -> Option<String> {
    match T::policy() {
        CreationPolicy::CreateFromTemplate(path) => {
            Some(path.map(str::to_owned).unwrap_or_else(default_template_path::<T>))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GameClock;

    impl Singleton for GameClock {
        const KIND: SingletonKind = SingletonKind::Global;
    }

    struct Minimap;

    impl Singleton for Minimap {
        const KIND: SingletonKind = SingletonKind::SceneScoped;

        fn policy() -> CreationPolicy<Self> {
            CreationPolicy::CreateFromTemplate(Some("Ui/Minimap"))
        }
    }

    struct HudOverlay;

    impl Singleton for HudOverlay {
        const KIND: SingletonKind = SingletonKind::Global;

        fn policy() -> CreationPolicy<Self> {
            CreationPolicy::CreateFromTemplate(None)
        }
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(short_type_name::<GameClock>(), "GameClock");
    }

    #[test]
    fn default_path_uses_conventional_root() {
        assert_eq!(default_template_path::<GameClock>(), "Singletons/GameClock");
    }

    #[test]
    fn default_policy_is_find_only() {
        assert!(matches!(GameClock::policy(), CreationPolicy::FindOnly));
    }

    #[test]
    fn template_path_prefers_declared_path() {
        assert_eq!(
            resolved_template_path::<Minimap>(),
            Some("Ui/Minimap".to_string())
        );
    }

    #[test]
    fn template_path_falls_back_to_derived_path() {
        assert_eq!(
            resolved_template_path::<HudOverlay>(),
            Some("Singletons/HudOverlay".to_string())
        );
    }

    #[test]
    fn non_template_policy_has_no_path() {
        assert_eq!(resolved_template_path::<GameClock>(), None);
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(SingletonKind::Global.to_string(), "global");
        assert_eq!(SingletonKind::SceneScoped.to_string(), "scene-scoped");
    }
}
