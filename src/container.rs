//! The reload-surviving global container.
//!
//! Global singleton instances are reparented under a single grouping object
//! when they attach. The container is created lazily on first need and is
//! never torn down by scope unloads, so its members outlive the scope they
//! were originally authored or created in.

use crate::instance::InstanceId;

/// Name of the process-wide grouping object for global singletons.
pub const GLOBAL_CONTAINER_NAME: &str = "GlobalSingletons";

/// Groups attached global singleton instances for the process lifetime.
#[derive(Default)]
pub(crate) struct Container {
    created: bool,
    members: Vec<InstanceId>,
}

impl Container {
    /// Reparent an instance under the container, creating the container on
    /// first use. Adopting an existing member is a no-op.
    pub fn adopt(&mut self, id: InstanceId) {
        if !self.created {
            log::debug!("creating global singleton container `{GLOBAL_CONTAINER_NAME}`");
            self.created = true;
        }
        if !self.members.contains(&id) {
            self.members.push(id);
        }
    }

    /// Drop an instance from the container, if it is a member.
    pub fn forget(&mut self, id: InstanceId) {
        self.members.retain(|member| *member != id);
    }

    /// True once the container has been lazily created.
    #[inline]
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Current members, in adoption order.
    #[inline]
    pub fn members(&self) -> &[InstanceId] {
        &self.members
    }
}
