//! Instance construction for Verdant components.
//!
//! A [`Runtime`] owns every instance it creates. [`Runtime::instantiate`]
//! assigns a uid, builds the instance configuration (merging for root
//! instances, a read-through fast path for instances created by a parent
//! render), then runs initialization in a fixed order:
//!
//! 1. lifecycle and tree wiring
//! 2. events
//! 3. render context
//! 4. `before_create`
//! 5. injections
//! 6. state
//! 7. provide
//! 8. `created`
//!
//! and mounts the instance when an `el` target is configured.

pub mod config;
pub mod diagnostics;
pub mod events;
pub mod init;
pub mod inject;
pub mod instance;
pub mod lifecycle;
pub mod mount;
pub mod reactivity;
pub mod render;
pub mod runtime;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RuntimeConfig;
pub use diagnostics::{classify, Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use events::EventChannel;
pub use init::{init_internal_component, InstantiateOptions, InternalOptions, RootOptions};
pub use instance::{Instance, InstanceConfig, MutationGuard, Properties, ReactiveProperty};
pub use lifecycle::LifecycleState;
pub use mount::{LifecycleMounter, Mounter};
pub use reactivity::{Observation, Reactivity};
pub use render::{hyphenate, resolve_slots, ProxyMode, RenderContext, RenderProxy, Slots, DEFAULT_SLOT};
pub use runtime::{InstanceScope, Runtime};
pub use state::{DefaultState, StateInitializer};
