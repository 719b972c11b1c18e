//! The reactive observation seam.

use std::cell::Cell;

use verdant_core::Value;

use crate::instance::{MutationGuard, Properties, ReactiveProperty};

/// The observation engine instances install their properties through.
pub trait Reactivity {
    /// Install `key` as a reactive property. `guard` selects the diagnostic
    /// raised when the property is later assigned to.
    fn define_reactive(
        &self,
        properties: &mut Properties,
        key: &str,
        value: Value,
        guard: Option<MutationGuard>,
    );

    /// Toggle deep observation of newly installed values.
    fn set_observation_enabled(&self, enabled: bool);

    fn observation_enabled(&self) -> bool;
}

/// Default observation engine: records whether a container value was
/// deeply observed when it was installed.
#[derive(Debug)]
pub struct Observation {
    enabled: Cell<bool>,
}

impl Observation {
    pub fn new() -> Self {
        Self {
            enabled: Cell::new(true),
        }
    }
}

impl Default for Observation {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactivity for Observation {
    fn define_reactive(
        &self,
        properties: &mut Properties,
        key: &str,
        value: Value,
        guard: Option<MutationGuard>,
    ) {
        let observed = self.enabled.get() && value.is_container();
        properties.insert(
            key.to_string(),
            ReactiveProperty {
                value,
                observed,
                guard,
                revision: 0,
            },
        );
    }

    fn set_observation_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    fn observation_enabled(&self) -> bool {
        self.enabled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containers_observed_only_when_enabled() {
        let observation = Observation::new();
        let mut properties = Properties::new();

        observation.define_reactive(&mut properties, "list", Value::List(vec![]), None);
        observation.define_reactive(&mut properties, "count", Value::from(1), None);
        observation.set_observation_enabled(false);
        observation.define_reactive(&mut properties, "shallow", Value::List(vec![]), None);
        observation.set_observation_enabled(true);

        assert!(properties["list"].observed);
        assert!(!properties["count"].observed);
        assert!(!properties["shallow"].observed);
        assert!(observation.observation_enabled());
    }
}
