//! Singleton lifecycle registry for component-based runtimes.
//!
//! Hosts that manage component instances across loadable scopes (scenes,
//! levels, worlds) use this crate to guarantee at most one live instance per
//! singleton type — per process for global types, per loaded scope for
//! scene-scoped ones — with find-or-create-once resolution, first-wins
//! duplicate neutralization, and template-based creation.
//!
//! The entry point is [`Runtime`]: consumers resolve instances through
//! [`Runtime::get_instance`] and friends, while the host integration layer
//! feeds lifecycle events in through [`Runtime::spawn_in`],
//! [`Runtime::attach`], [`Runtime::detach`], and the scope management
//! methods.
//!
//! ```rust
//! use singleton_registry::{CreationPolicy, Runtime, Singleton, SingletonKind};
//!
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
//!
//! let mut runtime = Runtime::new();
//! runtime.load_scope("Hub");
//!
//! let mixer = runtime.get_instance::<AudioMixer>().unwrap();
//! assert_eq!(runtime.get_instance::<AudioMixer>().unwrap(), mixer);
//! assert_eq!(runtime.get::<AudioMixer>(mixer).unwrap().channels, 8);
//! ```

pub mod error;
pub mod guard;
pub mod policy;
pub mod runtime;
pub mod scope;
pub mod template;

mod container;
mod factory;
mod instance;
mod registry;

pub use container::GLOBAL_CONTAINER_NAME;
pub use error::ResolveError;
pub use guard::ValidationIssue;
pub use instance::{Generation, InstanceId};
pub use policy::{CreationPolicy, Singleton, SingletonKind, TEMPLATE_ROOT, default_template_path};
pub use runtime::Runtime;
pub use scope::ScopeId;
pub use template::{MemoryTemplates, Template, TemplateLoader};
