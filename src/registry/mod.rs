//! Registry state machines.
//!
//! Both registries are pure transition tables over `(type, key) -> instance`
//! bookkeeping: [`global::Slots`] keys by type alone, [`scoped::Entries`] by
//! `(type, scope)`. They decide *what happened* — the runtime performs the
//! side effects (hook invocation, destruction, reparenting) based on the
//! returned outcome, which keeps the transitions independently testable.

pub(crate) mod global;
pub(crate) mod scoped;

use crate::instance::InstanceId;

/// Outcome of an instance claiming its registry key on attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// The key was free; this instance is now the registered one.
    Won,
    /// The key already recorded this very instance (cached by resolution
    /// before its attach was delivered).
    AlreadyOwner,
    /// A different instance holds the key; the claimant lost the first-wins
    /// race and must be discarded.
    LostTo(InstanceId),
}

/// Outcome of an instance releasing its registry key on detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
    /// The instance owned the key; the key is now free.
    Owner,
    /// The instance did not own the key; nothing was changed.
    NotOwner,
}
