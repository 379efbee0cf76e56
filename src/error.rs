//! Error taxonomy for singleton resolution.
//!
//! Resolution either returns a usable instance or fails with one of the typed
//! errors below. Violations of the lifecycle host contract (double attach,
//! detach before attach, stale handles) are programmer errors and panic
//! instead of surfacing here. Duplicate instances are advisory only: they are
//! logged and auto-resolved in favor of the first registered instance, never
//! reported as an error value.

use thiserror::Error;

use crate::scope::ScopeId;

/// An error produced while resolving a singleton instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No live instance was found and the type's creation policy either
    /// forbids creation or creation failed. Recoverable; surfaced to the
    /// caller of the resolution APIs.
    #[error("unable to resolve an instance of `{type_name}`: {reason}")]
    UnableToResolve {
        /// Short name of the singleton type that failed to resolve.
        type_name: &'static str,
        /// Why resolution could not produce an instance.
        reason: String,
    },

    /// A template-backed type's template path resolved to nothing, or the
    /// loaded template did not produce a value of the expected type. The
    /// registry is left untouched: the failure is not cached as a success.
    #[error("missing template `{path}` for singleton type `{type_name}`")]
    TemplateNotFound {
        /// Short name of the singleton type whose template is missing.
        type_name: &'static str,
        /// The logical template path that failed to load.
        path: String,
    },

    /// A scope-keyed operation was attempted against a scope that is not
    /// currently loaded. Always surfaced, never recovered locally.
    #[error("scope {scope:?} is not loaded")]
    ScopeNotLoaded {
        /// The scope handle that failed the loaded check.
        scope: ScopeId,
    },
}
