//! The instance arena and the scope callbacks run against.

use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};
use verdant_core::{BoxError, InstanceError, InstanceId, OptionSource, Scope, Uid, Value, WatchFn};

use crate::config::RuntimeConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::instance::{Instance, MutationGuard};
use crate::mount::{LifecycleMounter, Mounter};
use crate::reactivity::{Observation, Reactivity};
use crate::state::{DefaultState, StateInitializer};

/// Owns every instance created through it.
///
/// Instances are addressed by [`InstanceId`] and live as long as the
/// runtime. The observation engine, state initializer, mounter and
/// diagnostic sink are pluggable.
pub struct Runtime {
    instances: Vec<Instance>,
    config: RuntimeConfig,
    reactivity: Rc<dyn Reactivity>,
    state: Rc<dyn StateInitializer>,
    mounter: Rc<dyn Mounter>,
    diagnostics: Rc<dyn DiagnosticSink>,
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            config: RuntimeConfig::default(),
            reactivity: Rc::new(Observation::new()),
            state: Rc::new(DefaultState),
            mounter: Rc::new(LifecycleMounter),
            diagnostics: Rc::new(TracingSink),
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_reactivity(mut self, reactivity: impl Reactivity + 'static) -> Self {
        self.reactivity = Rc::new(reactivity);
        self
    }

    pub fn with_state(mut self, state: impl StateInitializer + 'static) -> Self {
        self.state = Rc::new(state);
        self
    }

    pub fn with_mounter(mut self, mounter: impl Mounter + 'static) -> Self {
        self.mounter = Rc::new(mounter);
        self
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Rc::new(sink);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn reactivity(&self) -> &dyn Reactivity {
        self.reactivity.as_ref()
    }

    pub(crate) fn reactivity_handle(&self) -> Rc<dyn Reactivity> {
        Rc::clone(&self.reactivity)
    }

    pub(crate) fn state_handle(&self) -> Rc<dyn StateInitializer> {
        Rc::clone(&self.state)
    }

    pub(crate) fn mounter_handle(&self) -> Rc<dyn Mounter> {
        Rc::clone(&self.mounter)
    }

    pub fn diagnostics(&self) -> &dyn DiagnosticSink {
        self.diagnostics.as_ref()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    pub fn instance(&self, id: InstanceId) -> Result<&Instance, InstanceError> {
        self.instances.get(id.0).ok_or(InstanceError::UnknownInstance(id))
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> Result<&mut Instance, InstanceError> {
        self.instances.get_mut(id.0).ok_or(InstanceError::UnknownInstance(id))
    }

    pub(crate) fn push(&mut self, instance: Instance) {
        debug_assert_eq!(instance.id.0, self.instances.len());
        self.instances.push(instance);
    }

    /// Scope for running user code against `id` outside instantiation.
    pub fn scope(&mut self, id: InstanceId) -> Result<InstanceScope<'_>, InstanceError> {
        self.instance(id)?;
        Ok(InstanceScope::new(self, id))
    }

    pub fn get(&self, id: InstanceId, key: &str) -> Option<&Value> {
        self.instance(id).ok()?.get(key)
    }

    /// Assign `key` on `id`.
    ///
    /// Unknown keys are installed as plain reactive properties. Guarded
    /// properties report their diagnostic; read-only ones keep their value.
    /// Watchers of `key` run when the value actually changes.
    pub fn set(&mut self, id: InstanceId, key: &str, value: Value) -> Result<(), InstanceError> {
        let reactivity = self.reactivity_handle();
        let instance = self.instance_mut(id)?;
        let Some(property) = instance.properties.get(key) else {
            reactivity.define_reactive(&mut instance.properties, key, value, None);
            return Ok(());
        };

        if let Some(guard) = property.guard {
            self.warn(Some(id), guard.message(key));
            if guard == MutationGuard::ReadOnly {
                return Ok(());
            }
        }

        let instance = self.instance_mut(id)?;
        let Some(property) = instance.properties.get_mut(key) else {
            return Ok(());
        };
        if property.value == value {
            return Ok(());
        }
        let old = std::mem::replace(&mut property.value, value.clone());
        property.revision += 1;
        let watchers: Vec<WatchFn> = instance.watchers.get(key).cloned().unwrap_or_default();
        trace!(instance = %id, key, watchers = watchers.len(), "set");
        for watcher in &watchers {
            watcher(&value, &old);
        }
        Ok(())
    }

    /// Invoke a method from the instance's `methods` option.
    pub fn call_method(&mut self, id: InstanceId, method: &str, args: &[Value]) -> Result<Value, InstanceError> {
        let Some(handler) = self.instance(id)?.methods.get(method).cloned() else {
            return Err(InstanceError::UnknownMethod {
                instance: id,
                method: method.to_string(),
            });
        };
        let mut scope = InstanceScope::new(self, id);
        handler(&mut scope, args).map_err(InstanceError::callback)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("instances", &self.instances.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// [`Scope`] over one instance of a runtime.
pub struct InstanceScope<'a> {
    runtime: &'a mut Runtime,
    id: InstanceId,
}

impl<'a> InstanceScope<'a> {
    pub(crate) fn new(runtime: &'a mut Runtime, id: InstanceId) -> Self {
        Self { runtime, id }
    }

    pub fn runtime(&mut self) -> &mut Runtime {
        self.runtime
    }
}

impl Scope for InstanceScope<'_> {
    fn uid(&self) -> Uid {
        self.runtime
            .instance(self.id)
            .map(|instance| instance.uid)
            .unwrap_or(Uid(0))
    }

    fn id(&self) -> InstanceId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.runtime.instance(self.id).ok()?.config.name()
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.runtime.get(self.id, key)
    }

    fn set(&mut self, key: &str, value: Value) {
        if let Err(err) = self.runtime.set(self.id, key, value) {
            warn!(instance = %self.id, key, %err, "assignment from a callback failed");
        }
    }

    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, BoxError> {
        self.runtime
            .call_method(self.id, method, args)
            .map_err(InstanceError::into_boxed)
    }

    fn emit(&mut self, event: &str, args: &[Value]) {
        if let Err(err) = self.runtime.emit(self.id, event, args) {
            warn!(instance = %self.id, event, %err, "emit from a callback failed");
        }
    }
}
