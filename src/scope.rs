//! Scope handles and load-state tracking.
//!
//! A scope is a logical, loadable unit of the host world with its own
//! lifetime. The runtime tracks which scopes are loaded and which one is
//! currently active; scope-scoped singletons are keyed by [`ScopeId`].
//!
//! Scope identifiers are never reused: unloading a scope retires its id for
//! good, so a stale handle held by a consumer can only ever report as not
//! loaded rather than aliasing a newer scope.

/// A stable handle to a loaded (or previously loaded) scope.
///
/// Equality is identity: two handles compare equal iff they refer to the
/// same load of the same scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    /// Get the index of this id for use in indexable storage.
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Per-scope bookkeeping.
struct ScopeState {
    name: String,
    loaded: bool,
}

/// Tracks loaded scopes and the currently active one.
#[derive(Default)]
pub(crate) struct Scopes {
    scopes: Vec<ScopeState>,
    active: Option<ScopeId>,
}

impl Scopes {
    /// Load a new scope under the given name and return its handle.
    ///
    /// The first loaded scope becomes the active scope.
    pub fn load(&mut self, name: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeState {
            name: name.into(),
            loaded: true,
        });
        if self.active.is_none() {
            self.active = Some(id);
        }
        id
    }

    /// Mark a scope as unloaded. Its id is retired, never reused.
    pub fn unload(&mut self, id: ScopeId) {
        if let Some(state) = self.scopes.get_mut(id.index()) {
            state.loaded = false;
        }
    }

    /// True iff the scope is currently loaded. Stale or foreign handles
    /// report as not loaded.
    #[inline]
    pub fn is_loaded(&self, id: ScopeId) -> bool {
        self.scopes.get(id.index()).is_some_and(|state| state.loaded)
    }

    /// The currently active scope, if any scope has been loaded. The active
    /// scope may itself have been unloaded since; callers are expected to
    /// check [`is_loaded`](Scopes::is_loaded).
    #[inline]
    pub fn active(&self) -> Option<ScopeId> {
        self.active
    }

    /// Make a loaded scope the active one.
    ///
    /// Panics if the scope is not loaded; activating a torn-down scope is a
    /// host contract violation.
    pub fn set_active(&mut self, id: ScopeId) {
        assert!(
            self.is_loaded(id),
            "cannot activate scope {id:?}: scope is not loaded"
        );
        self.active = Some(id);
    }

    /// The name a scope was loaded under.
    #[inline]
    pub fn name(&self, id: ScopeId) -> Option<&str> {
        self.scopes.get(id.index()).map(|state| state.name.as_str())
    }
}
