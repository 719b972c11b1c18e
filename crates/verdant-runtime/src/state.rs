//! Instance state initialization: props, methods, data, computed, watchers.

use std::rc::Rc;

use indexmap::IndexMap;
use verdant_core::{
    keys, InstanceError, InstanceId, MethodFn, OptionSource, OptionValue, PropSpec, ValueFn,
};

use crate::instance::MutationGuard;
use crate::runtime::{InstanceScope, Runtime};

/// Populates an instance's state during instantiation.
pub trait StateInitializer {
    fn init_state(&self, runtime: &mut Runtime, id: InstanceId) -> Result<(), InstanceError>;
}

/// Props, methods, data, computed values and watchers, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultState;

impl StateInitializer for DefaultState {
    fn init_state(&self, runtime: &mut Runtime, id: InstanceId) -> Result<(), InstanceError> {
        init_props(runtime, id)?;
        init_methods(runtime, id)?;
        init_data(runtime, id)?;
        init_computed(runtime, id)?;
        init_watch(runtime, id)
    }
}

fn declared_props(runtime: &Runtime, id: InstanceId) -> Result<Rc<IndexMap<String, PropSpec>>, InstanceError> {
    Ok(match runtime.instance(id)?.config.option(keys::PROPS) {
        Some(OptionValue::Props(props)) => Rc::clone(props),
        _ => Rc::default(),
    })
}

fn init_props(runtime: &mut Runtime, id: InstanceId) -> Result<(), InstanceError> {
    let props = declared_props(runtime, id)?;
    if props.is_empty() {
        return Ok(());
    }
    let instance = runtime.instance(id)?;
    let props_data = instance.config.props_data().cloned().unwrap_or_default();
    let is_root = instance.parent.is_none();

    let reactivity = runtime.reactivity_handle();
    // Parent-passed values are observed by the parent.
    if !is_root {
        reactivity.set_observation_enabled(false);
    }
    for (key, spec) in props.iter() {
        let value = match props_data.get(key) {
            Some(value) => value.clone(),
            None => {
                if spec.required {
                    runtime.warn(Some(id), format!("Missing required prop: \"{key}\""));
                }
                spec.default.clone().unwrap_or_default()
            }
        };
        let guard = (!is_root).then_some(MutationGuard::Prop);
        let properties = &mut runtime.instance_mut(id)?.properties;
        reactivity.define_reactive(properties, key, value, guard);
    }
    reactivity.set_observation_enabled(true);
    Ok(())
}

fn init_methods(runtime: &mut Runtime, id: InstanceId) -> Result<(), InstanceError> {
    let methods: Rc<IndexMap<String, MethodFn>> = match runtime.instance(id)?.config.option(keys::METHODS) {
        Some(OptionValue::Methods(methods)) => Rc::clone(methods),
        _ => return Ok(()),
    };
    let props = declared_props(runtime, id)?;
    for key in methods.keys() {
        if props.contains_key(key) {
            runtime.warn(Some(id), format!("Method \"{key}\" has already been defined as a prop."));
        }
        if key.starts_with('_') || key.starts_with('$') {
            runtime.warn(
                Some(id),
                format!(
                    "Method \"{key}\" conflicts with an existing instance method. Avoid defining component methods that start with _ or $."
                ),
            );
        }
    }
    runtime.instance_mut(id)?.methods = methods;
    Ok(())
}

fn init_data(runtime: &mut Runtime, id: InstanceId) -> Result<(), InstanceError> {
    let Some(source) = runtime.instance(id)?.config.data().cloned() else {
        return Ok(());
    };
    let scope = InstanceScope::new(runtime, id);
    let data = source.evaluate(&scope).map_err(InstanceError::callback)?;

    let props = declared_props(runtime, id)?;
    let reactivity = runtime.reactivity_handle();
    for (key, value) in data {
        if runtime.instance(id)?.methods.contains_key(&key) {
            runtime.warn(Some(id), format!("Method \"{key}\" has already been defined as a data property."));
        }
        if props.contains_key(&key) {
            runtime.warn(
                Some(id),
                format!("The data property \"{key}\" is already declared as a prop. Use prop default value instead."),
            );
            continue;
        }
        let properties = &mut runtime.instance_mut(id)?.properties;
        reactivity.define_reactive(properties, &key, value, None);
    }
    Ok(())
}

/// Computed values are evaluated once, after data, and are read-only.
fn init_computed(runtime: &mut Runtime, id: InstanceId) -> Result<(), InstanceError> {
    let computed: Rc<IndexMap<String, ValueFn>> = match runtime.instance(id)?.config.option(keys::COMPUTED) {
        Some(OptionValue::Computed(computed)) => Rc::clone(computed),
        _ => return Ok(()),
    };
    let props = declared_props(runtime, id)?;
    let reactivity = runtime.reactivity_handle();
    for (key, getter) in computed.iter() {
        let instance = runtime.instance(id)?;
        let conflict = if props.contains_key(key) {
            Some("as a prop")
        } else if instance.properties.contains_key(key) {
            Some("in data")
        } else if instance.methods.contains_key(key) {
            Some("as a method")
        } else {
            None
        };
        if let Some(conflict) = conflict {
            runtime.warn(Some(id), format!("The computed property \"{key}\" is already defined {conflict}."));
            continue;
        }

        let scope = InstanceScope::new(runtime, id);
        let value = getter(&scope).map_err(InstanceError::callback)?;
        let properties = &mut runtime.instance_mut(id)?.properties;
        reactivity.define_reactive(properties, key, value, Some(MutationGuard::ReadOnly));
    }
    Ok(())
}

fn init_watch(runtime: &mut Runtime, id: InstanceId) -> Result<(), InstanceError> {
    let instance = runtime.instance_mut(id)?;
    let watch = match instance.config.option(keys::WATCH) {
        Some(OptionValue::Watch(watch)) => Rc::clone(watch),
        _ => return Ok(()),
    };
    for (key, watchers) in watch.iter() {
        instance
            .watchers
            .entry(key.clone())
            .or_default()
            .extend(watchers.iter().cloned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::init::{InternalOptions, RootOptions};
    use crate::testing::{recording_runtime, Failure};
    use verdant_core::{
        ComponentVNodeOptions, DataSource, Definition, LifecycleHook, Options, VNode, Value,
        ValueMap, WatchFn,
    };
    use verdant_options::extend;

    fn literal(entries: &[(&str, Value)]) -> DataSource {
        let values: ValueMap = entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        DataSource::factory(move |_| Ok(values.clone()))
    }

    #[test]
    fn test_props_from_props_data_and_defaults() {
        let (mut runtime, sink) = recording_runtime();
        let base = Definition::root(
            Options::new()
                .with_prop("title", PropSpec::required())
                .with_prop("size", PropSpec::optional(10))
                .with_prop("label", PropSpec::required()),
        );
        let mut props_data = ValueMap::new();
        props_data.insert("title".into(), Value::from("Hello"));
        let id = runtime
            .instantiate(&base, Options::new().with_props_data(props_data))
            .unwrap();

        assert_eq!(runtime.get(id, "title"), Some(&Value::from("Hello")));
        assert_eq!(runtime.get(id, "size"), Some(&Value::from(10)));
        assert_eq!(runtime.get(id, "label"), Some(&Value::Null));
        assert_eq!(sink.messages(), vec!["Missing required prop: \"label\"".to_string()]);
    }

    #[test]
    fn test_child_prop_mutation_warns() {
        let (mut runtime, sink) = recording_runtime();
        let base = Definition::root(Options::new());
        let child_def = extend(
            &base,
            Options::new().with_prop("items", PropSpec::optional(Value::List(vec![]))),
            &runtime.config().strategies,
        );
        let parent = runtime.instantiate(&base, Options::new()).unwrap();

        let mut props_data = ValueMap::new();
        props_data.insert("items".into(), Value::List(vec![Value::from(1)]));
        let vnode = Rc::new(VNode::component(
            "list",
            ComponentVNodeOptions::new(Rc::clone(&child_def)).props_data(props_data),
        ));
        let child = runtime
            .instantiate(&child_def, InternalOptions::new(parent, vnode))
            .unwrap();

        let property = &runtime.instance(child).unwrap().properties["items"];
        assert!(!property.observed);
        runtime.set(child, "items", Value::Null).unwrap();
        assert!(sink.contains("Prop being mutated: \"items\""));
        assert_eq!(runtime.get(child, "items"), Some(&Value::Null));
    }

    #[test]
    fn test_data_collisions_warn() {
        let (mut runtime, sink) = recording_runtime();
        let base = Definition::root(
            Options::new()
                .with_prop("title", PropSpec::optional("x"))
                .with_method("save", |_, _| Ok(Value::Null))
                .with_data(literal(&[
                    ("title", Value::from("shadow")),
                    ("save", Value::from(1)),
                    ("count", Value::from(0)),
                ])),
        );
        let id = runtime.instantiate(&base, Options::new()).unwrap();

        assert_eq!(runtime.get(id, "title"), Some(&Value::from("x")));
        assert_eq!(runtime.get(id, "count"), Some(&Value::from(0)));
        assert!(sink.contains("The data property \"title\" is already declared as a prop"));
        assert!(sink.contains("Method \"save\" has already been defined as a data property"));
    }

    #[test]
    fn test_computed_is_read_only() {
        let (mut runtime, sink) = recording_runtime();
        let base = Definition::root(
            Options::new()
                .with_data(literal(&[("count", Value::from(2))]))
                .with_computed("double", |scope| {
                    let count = scope.get("count").and_then(Value::as_number).unwrap_or(0.0);
                    Ok(Value::from(count * 2.0))
                }),
        );
        let id = runtime.instantiate(&base, Options::new()).unwrap();

        assert_eq!(runtime.get(id, "double"), Some(&Value::from(4.0)));
        runtime.set(id, "double", Value::from(0)).unwrap();
        assert_eq!(runtime.get(id, "double"), Some(&Value::from(4.0)));
        assert!(sink.contains("Computed property \"double\" was assigned to but it has no setter."));
    }

    #[test]
    fn test_methods_callable_through_scope() {
        let (mut runtime, _sink) = recording_runtime();
        let base = Definition::root(
            Options::new()
                .with_data(literal(&[("count", Value::from(1))]))
                .with_method("increment", |scope, args| {
                    let step = args.first().and_then(Value::as_number).unwrap_or(1.0);
                    let count = scope.get("count").and_then(Value::as_number).unwrap_or(0.0);
                    scope.set("count", Value::from(count + step));
                    Ok(Value::from(count + step))
                }),
        );
        let id = runtime.instantiate(&base, Options::new()).unwrap();

        let result = runtime.call_method(id, "increment", &[Value::from(4)]).unwrap();
        assert_eq!(result, Value::from(5.0));
        assert_eq!(runtime.get(id, "count"), Some(&Value::from(5.0)));
        assert!(matches!(
            runtime.call_method(id, "missing", &[]),
            Err(InstanceError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_watchers_fire_on_change() {
        let (mut runtime, _sink) = recording_runtime();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let base = Definition::root(
            Options::new()
                .with_data(literal(&[("count", Value::from(0))]))
                .with_watch(
                    "count",
                    WatchFn::new(move |new, old| log.borrow_mut().push((new.clone(), old.clone()))),
                ),
        );
        let id = runtime.instantiate(&base, Options::new()).unwrap();

        runtime.set(id, "count", Value::from(1)).unwrap();
        runtime.set(id, "count", Value::from(1)).unwrap();
        assert_eq!(*seen.borrow(), vec![(Value::from(1), Value::from(0))]);
        assert_eq!(runtime.instance(id).unwrap().properties["count"].revision, 1);
    }

    #[test]
    fn test_state_visible_in_created_only() {
        let (mut runtime, _sink) = recording_runtime();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let before = Rc::clone(&seen);
        let after = Rc::clone(&seen);
        let base = Definition::root(
            Options::new()
                .with_data(literal(&[("count", Value::from(1))]))
                .on(LifecycleHook::BeforeCreate, move |scope| {
                    before.borrow_mut().push(scope.get("count").cloned());
                    Ok(())
                })
                .on(LifecycleHook::Created, move |scope| {
                    after.borrow_mut().push(scope.get("count").cloned());
                    Ok(())
                }),
        );
        runtime
            .instantiate(&base, RootOptions::new(Options::new()))
            .unwrap();
        assert_eq!(*seen.borrow(), vec![None, Some(Value::from(1))]);
    }

    #[test]
    fn test_data_factory_failure_stops_construction() {
        let (mut runtime, _sink) = recording_runtime();
        let created = Rc::new(Cell::new(false));
        let flag = Rc::clone(&created);
        let base = Definition::root(
            Options::new()
                .with_data(DataSource::factory(|_| Err(Box::new(Failure("data boom")))))
                .on(LifecycleHook::Created, move |_| {
                    flag.set(true);
                    Ok(())
                }),
        );

        let err = runtime.instantiate(&base, Options::new()).unwrap_err();
        assert_eq!(err.to_string(), "data boom");
        assert!(err.as_callback().unwrap().downcast_ref::<Failure>().is_some());
        assert!(!created.get());
    }
}
