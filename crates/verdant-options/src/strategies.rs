//! Per-field merge strategies.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::warn;
use verdant_core::{keys, DataSource, LifecycleHook, OptionValue, Uid, Value};

type CustomFn = dyn Fn(Option<&OptionValue>, Option<&OptionValue>) -> Option<OptionValue>;

/// A user-supplied merge function for one field.
#[derive(Clone)]
pub struct CustomStrategy(Rc<CustomFn>);

impl CustomStrategy {
    pub fn new(
        f: impl Fn(Option<&OptionValue>, Option<&OptionValue>) -> Option<OptionValue> + 'static,
    ) -> Self {
        CustomStrategy(Rc::new(f))
    }
}

impl fmt::Debug for CustomStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomStrategy({:p})", Rc::as_ptr(&self.0))
    }
}

/// How a field combines a parent value with a child value.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Child value if present, parent value otherwise.
    Override,
    /// Ordered concatenation, parent first, duplicate handlers removed.
    Hooks,
    /// Registry union, child entries win on collision.
    Assets,
    /// Key-set union for props, methods, inject and computed, child wins.
    Extend,
    /// Per-key concatenation of watcher lists.
    Watch,
    /// Data-or-factory merge used by `data` and `provide`.
    Data,
    /// Only meaningful on an instance merge; warns when merged into a definition.
    InstanceOnly,
    Custom(CustomStrategy),
}

impl Strategy {
    /// Merge one field. `None` leaves the field out of the result.
    pub fn apply(
        &self,
        key: &str,
        parent: Option<&OptionValue>,
        child: Option<&OptionValue>,
        instance: Option<Uid>,
    ) -> Option<OptionValue> {
        match self {
            Strategy::Override => default_strategy(parent, child),
            Strategy::Hooks => merge_hooks(parent, child),
            Strategy::Assets | Strategy::Extend => merge_keyed(parent, child),
            Strategy::Watch => merge_watch(parent, child),
            Strategy::Data => merge_data(key, parent, child, instance),
            Strategy::InstanceOnly => {
                if instance.is_none() && child.is_some() && cfg!(debug_assertions) {
                    warn!(
                        option = key,
                        "option \"{key}\" can only be used during instance creation"
                    );
                }
                default_strategy(parent, child)
            }
            Strategy::Custom(custom) => (custom.0)(parent, child),
        }
    }
}

/// Field name to strategy. Unlisted fields use [`Strategy::Override`].
#[derive(Debug, Clone)]
pub struct MergeStrategies {
    fields: IndexMap<String, Strategy>,
}

impl MergeStrategies {
    /// The default table: hooks concatenate, registries and keyed fields
    /// union, `data`/`provide` merge as factories, `el`/`props_data` are
    /// instance-only.
    pub fn new() -> Self {
        let mut fields = IndexMap::new();
        for hook in LifecycleHook::ALL {
            fields.insert(hook.as_str().to_string(), Strategy::Hooks);
        }
        for kind in keys::ASSET_TYPES {
            fields.insert(kind.to_string(), Strategy::Assets);
        }
        for key in [keys::PROPS, keys::METHODS, keys::INJECT, keys::COMPUTED] {
            fields.insert(key.to_string(), Strategy::Extend);
        }
        fields.insert(keys::WATCH.to_string(), Strategy::Watch);
        fields.insert(keys::DATA.to_string(), Strategy::Data);
        fields.insert(keys::PROVIDE.to_string(), Strategy::Data);
        fields.insert(keys::EL.to_string(), Strategy::InstanceOnly);
        fields.insert(keys::PROPS_DATA.to_string(), Strategy::InstanceOnly);
        Self { fields }
    }

    pub fn set(&mut self, field: impl Into<String>, strategy: Strategy) -> &mut Self {
        self.fields.insert(field.into(), strategy);
        self
    }

    pub fn with(mut self, field: impl Into<String>, strategy: Strategy) -> Self {
        self.set(field, strategy);
        self
    }

    pub fn get(&self, field: &str) -> &Strategy {
        const OVERRIDE: &Strategy = &Strategy::Override;
        self.fields.get(field).unwrap_or(OVERRIDE)
    }
}

impl Default for MergeStrategies {
    fn default() -> Self {
        Self::new()
    }
}

fn default_strategy(parent: Option<&OptionValue>, child: Option<&OptionValue>) -> Option<OptionValue> {
    child.or(parent).cloned()
}

fn merge_hooks(parent: Option<&OptionValue>, child: Option<&OptionValue>) -> Option<OptionValue> {
    match (parent, child) {
        (_, None) => parent.cloned(),
        (None, Some(OptionValue::Hooks(handlers))) => {
            Some(OptionValue::Hooks(dedupe_hooks(handlers)))
        }
        (Some(OptionValue::Hooks(inherited)), Some(OptionValue::Hooks(own))) => {
            let mut handlers = Vec::with_capacity(inherited.len() + own.len());
            for handler in inherited.iter().chain(own.iter()) {
                if !handlers.iter().any(|h: &verdant_core::Hook| h.ptr_eq(handler)) {
                    handlers.push(handler.clone());
                }
            }
            Some(OptionValue::Hooks(Rc::new(handlers)))
        }
        _ => default_strategy(parent, child),
    }
}

fn dedupe_hooks(handlers: &Rc<Vec<verdant_core::Hook>>) -> Rc<Vec<verdant_core::Hook>> {
    let has_duplicates = handlers
        .iter()
        .enumerate()
        .any(|(i, h)| handlers[..i].iter().any(|earlier| earlier.ptr_eq(h)));
    if !has_duplicates {
        return Rc::clone(handlers);
    }
    let mut unique: Vec<verdant_core::Hook> = Vec::with_capacity(handlers.len());
    for handler in handlers.iter() {
        if !unique.iter().any(|h| h.ptr_eq(handler)) {
            unique.push(handler.clone());
        }
    }
    Rc::new(unique)
}

fn union<T: Clone>(parent: &IndexMap<String, T>, child: &IndexMap<String, T>) -> IndexMap<String, T> {
    let mut merged = parent.clone();
    for (key, value) in child {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn merge_keyed(parent: Option<&OptionValue>, child: Option<&OptionValue>) -> Option<OptionValue> {
    let (Some(parent_value), Some(child_value)) = (parent, child) else {
        return default_strategy(parent, child);
    };
    let merged = match (parent_value, child_value) {
        (OptionValue::Assets(p), OptionValue::Assets(c)) => OptionValue::Assets(Rc::new(union(p, c))),
        (OptionValue::Props(p), OptionValue::Props(c)) => OptionValue::Props(Rc::new(union(p, c))),
        (OptionValue::Computed(p), OptionValue::Computed(c)) => {
            OptionValue::Computed(Rc::new(union(p, c)))
        }
        (OptionValue::Methods(p), OptionValue::Methods(c)) => {
            OptionValue::Methods(Rc::new(union(p, c)))
        }
        (OptionValue::Inject(p), OptionValue::Inject(c)) => {
            let mut merged = p.as_ref().clone();
            merged.extend_from(c);
            OptionValue::Inject(Rc::new(merged))
        }
        _ => child_value.clone(),
    };
    Some(merged)
}

fn merge_watch(parent: Option<&OptionValue>, child: Option<&OptionValue>) -> Option<OptionValue> {
    match (parent, child) {
        (Some(OptionValue::Watch(inherited)), Some(OptionValue::Watch(own))) => {
            let mut merged = inherited.as_ref().clone();
            for (key, watchers) in own.iter() {
                merged
                    .entry(key.clone())
                    .or_default()
                    .extend(watchers.iter().cloned());
            }
            Some(OptionValue::Watch(Rc::new(merged)))
        }
        _ => default_strategy(parent, child),
    }
}

fn merge_data(
    key: &str,
    parent: Option<&OptionValue>,
    child: Option<&OptionValue>,
    instance: Option<Uid>,
) -> Option<OptionValue> {
    if instance.is_none() && key == keys::DATA {
        if let Some(OptionValue::Data(DataSource::Static(_))) = child {
            if cfg!(debug_assertions) {
                warn!(
                    "The \"data\" option should be a factory that returns a per-instance value in component definitions."
                );
            }
            return parent.cloned();
        }
    }

    match (parent, child) {
        (Some(OptionValue::Data(inherited)), Some(OptionValue::Data(own))) => {
            let inherited = inherited.clone();
            let own = own.clone();
            Some(OptionValue::Data(DataSource::factory(move |scope| {
                let mut values = own.evaluate(scope)?;
                let parent_values = inherited.evaluate(scope)?;
                Value::merge_maps(&mut values, &parent_values);
                Ok(values)
            })))
        }
        _ => default_strategy(parent, child),
    }
}
