//! Provide/inject resolution across the instance tree.

use std::rc::Rc;

use tracing::trace;
use verdant_core::{
    keys, InjectDefault, Injections, InstanceError, InstanceId, OptionSource, OptionValue, Value,
    ValueMap,
};

use crate::instance::MutationGuard;
use crate::runtime::{InstanceScope, Runtime};

impl Runtime {
    /// Resolve `declarations` for instance `id`.
    ///
    /// Each source key is looked up on `id` and then on each ancestor in
    /// turn; the nearest provider wins. Keys nobody provides fall back to
    /// their default, or stay unbound with a diagnostic.
    pub fn resolve_inject(
        &mut self,
        declarations: Option<&Injections>,
        id: InstanceId,
    ) -> Result<Option<ValueMap>, InstanceError> {
        let Some(declarations) = declarations else {
            return Ok(None);
        };
        self.instance(id)?;

        let mut resolved = ValueMap::new();
        for (key, spec) in declarations.iter() {
            if let Some(value) = self.find_provided(id, &spec.from).cloned() {
                resolved.insert(key.clone(), value);
                continue;
            }
            match &spec.default {
                Some(InjectDefault::Value(value)) => {
                    resolved.insert(key.clone(), value.clone());
                }
                Some(InjectDefault::Producer(producer)) => {
                    let scope = InstanceScope::new(self, id);
                    let value = producer(&scope).map_err(InstanceError::callback)?;
                    resolved.insert(key.clone(), value);
                }
                None => self.warn(Some(id), format!("Injection \"{key}\" not found")),
            }
        }
        Ok(Some(resolved))
    }

    /// Nearest value provided under `key`, starting at `id` itself.
    fn find_provided(&self, id: InstanceId, key: &str) -> Option<&Value> {
        let mut current = Some(id);
        while let Some(cursor) = current {
            let instance = self.instance(cursor).ok()?;
            if let Some(value) = instance.provided.as_ref().and_then(|provided| provided.get(key)) {
                trace!(instance = %id, key, provider = %cursor, "injection resolved");
                return Some(value);
            }
            current = instance.parent;
        }
        None
    }

    /// Resolve the instance's `inject` option and install the results as
    /// shallow reactive properties.
    pub(crate) fn init_injections(&mut self, id: InstanceId) -> Result<(), InstanceError> {
        let declarations = match self.instance(id)?.config.option(keys::INJECT) {
            Some(OptionValue::Inject(declarations)) => Some(Rc::clone(declarations)),
            _ => None,
        };
        let Some(resolved) = self.resolve_inject(declarations.as_deref(), id)? else {
            return Ok(());
        };

        let reactivity = self.reactivity_handle();
        reactivity.set_observation_enabled(false);
        let properties = &mut self.instance_mut(id)?.properties;
        for (key, value) in resolved {
            reactivity.define_reactive(properties, &key, value, Some(MutationGuard::Injected));
        }
        reactivity.set_observation_enabled(true);
        Ok(())
    }

    /// Evaluate the instance's `provide` option into its provided map.
    pub(crate) fn init_provide(&mut self, id: InstanceId) -> Result<(), InstanceError> {
        let Some(source) = self.instance(id)?.config.provide().cloned() else {
            return Ok(());
        };
        let scope = InstanceScope::new(self, id);
        let provided = source.evaluate(&scope).map_err(InstanceError::callback)?;
        self.instance_mut(id)?.provided = Some(provided);
        Ok(())
    }
}
