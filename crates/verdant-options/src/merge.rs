//! The option merge function.

use std::borrow::Cow;

use verdant_core::{keys, OptionValue, Options, Uid};

use crate::strategies::MergeStrategies;

/// Merge `child` onto `parent`, returning a new record.
///
/// The child's `extends` and then each of its `mixins` are folded into the
/// parent first. Neither field survives into the result. Fields are visited
/// parent first, then child-only fields, so insertion order is stable.
/// `instance` is set when merging for a specific instance rather than a
/// definition.
pub fn merge_options(
    parent: &Options,
    child: &Options,
    strategies: &MergeStrategies,
    instance: Option<Uid>,
) -> Options {
    let mut base = Cow::Borrowed(parent);
    if let Some(OptionValue::Extends(extends)) = child.get(keys::EXTENDS) {
        base = Cow::Owned(merge_options(&base, extends, strategies, instance));
    }
    if let Some(OptionValue::Mixins(mixins)) = child.get(keys::MIXINS) {
        for mixin in mixins.iter() {
            base = Cow::Owned(merge_options(&base, mixin, strategies, instance));
        }
    }
    let parent = base.as_ref();

    let mut merged = Options::new();
    for key in parent.keys() {
        merge_field(&mut merged, key, parent, child, strategies, instance);
    }
    for key in child.keys() {
        if !parent.contains_key(key) {
            merge_field(&mut merged, key, parent, child, strategies, instance);
        }
    }
    merged
}

fn merge_field(
    merged: &mut Options,
    key: &str,
    parent: &Options,
    child: &Options,
    strategies: &MergeStrategies,
    instance: Option<Uid>,
) {
    if key == keys::EXTENDS || key == keys::MIXINS {
        return;
    }
    if let Some(value) = strategies
        .get(key)
        .apply(key, parent.get(key), child.get(key), instance)
    {
        merged.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use verdant_core::{
        DataSource, Hook, LifecycleHook, OptionSource, PropSpec, Scope, Uid, Value, ValueMap,
        InstanceId, BoxError,
    };

    struct NullScope;

    impl Scope for NullScope {
        fn uid(&self) -> Uid {
            Uid(0)
        }
        fn id(&self) -> InstanceId {
            InstanceId(0)
        }
        fn name(&self) -> Option<&str> {
            None
        }
        fn get(&self, _key: &str) -> Option<&Value> {
            None
        }
        fn set(&mut self, _key: &str, _value: Value) {}
        fn call(&mut self, _method: &str, _args: &[Value]) -> Result<Value, BoxError> {
            Ok(Value::Null)
        }
        fn emit(&mut self, _event: &str, _args: &[Value]) {}
    }

    fn data(entries: &[(&str, Value)]) -> DataSource {
        let values: ValueMap = entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        DataSource::factory(move |_| Ok(values.clone()))
    }

    #[test]
    fn test_parent_keys_first_then_child_only() {
        let parent = Options::new().with("a", Value::from(1)).with("b", Value::from(2));
        let child = Options::new().with("c", Value::from(3)).with("a", Value::from(10));
        let merged = merge_options(&parent, &child, &MergeStrategies::new(), None);
        let keys: Vec<&str> = merged.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(merged.value("a"), Some(&Value::from(10)));
    }

    #[test]
    fn test_single_sided_field_keeps_identity() {
        let parent = Options::new().with_prop("title", PropSpec::required());
        let merged = merge_options(&parent, &Options::new(), &MergeStrategies::new(), None);
        assert!(merged.get(keys::PROPS).unwrap().same(parent.get(keys::PROPS).unwrap()));
    }

    #[test]
    fn test_mixins_apply_before_child() {
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        let hook = |label: &'static str| {
            let order = Rc::clone(&order);
            Hook::new(move |_| {
                order.borrow_mut().push(label);
                Ok(())
            })
        };
        let parent = Options::new().with_hook(LifecycleHook::Created, hook("parent"));
        let child = Options::new()
            .with_mixin(Options::new().with_hook(LifecycleHook::Created, hook("mixin")))
            .with_extends(Options::new().with_hook(LifecycleHook::Created, hook("extends")))
            .with_hook(LifecycleHook::Created, hook("child"));

        let merged = merge_options(&parent, &child, &MergeStrategies::new(), None);
        assert!(!merged.contains_key(keys::MIXINS));
        assert!(!merged.contains_key(keys::EXTENDS));

        let mut scope = NullScope;
        for handler in merged.hooks(LifecycleHook::Created) {
            handler(&mut scope).unwrap();
        }
        assert_eq!(*order.borrow(), vec!["parent", "extends", "mixin", "child"]);
    }

    #[test]
    fn test_data_factories_merge_child_wins() {
        let parent = Options::new().with_data(data(&[
            ("shared", Value::from("parent")),
            ("inherited", Value::from(1)),
            ("nested", Value::map([("a", Value::from(1)), ("b", Value::from(2))])),
        ]));
        let child = Options::new().with_data(data(&[
            ("shared", Value::from("child")),
            ("nested", Value::map([("a", Value::from(10))])),
        ]));
        let merged = merge_options(&parent, &child, &MergeStrategies::new(), None);
        let values = merged.data().unwrap().evaluate(&NullScope).unwrap();

        assert_eq!(values["shared"], Value::from("child"));
        assert_eq!(values["inherited"], Value::from(1));
        let nested = values["nested"].as_map().unwrap();
        assert_eq!(nested["a"], Value::from(10));
        assert_eq!(nested["b"], Value::from(2));
    }

    #[test]
    fn test_data_factory_runs_per_evaluation() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let child = Options::new().with_data(DataSource::factory(move |_| {
            counter.set(counter.get() + 1);
            Ok(ValueMap::new())
        }));
        let parent = Options::new().with_data(data(&[]));
        let merged = merge_options(&parent, &child, &MergeStrategies::new(), None);
        let source = merged.data().unwrap();
        source.evaluate(&NullScope).unwrap();
        source.evaluate(&NullScope).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_instance_merge_accepts_static_data() {
        let child = Options::new().with_data(DataSource::literal(
            [("count".to_string(), Value::from(0))].into_iter().collect(),
        ));
        let merged = merge_options(&Options::new(), &child, &MergeStrategies::new(), Some(Uid(1)));
        let values = merged.data().unwrap().evaluate(&NullScope).unwrap();
        assert_eq!(values["count"], Value::from(0));
    }

    mod props {
        use proptest::prelude::*;
        use verdant_core::{OptionValue, Options, Value};

        use crate::merge::merge_options;
        use crate::strategies::MergeStrategies;

        fn fields() -> impl proptest::strategy::Strategy<Value = Vec<(String, i32)>> {
            prop::collection::vec(("[a-f]", any::<i32>()), 0..8)
        }

        fn record(fields: &[(String, i32)]) -> Options {
            fields
                .iter()
                .map(|(k, v)| (k.clone(), OptionValue::Value(Value::from(*v))))
                .collect()
        }

        fn same_record(a: &Options, b: &Options) -> bool {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && va.same(vb))
        }

        proptest! {
            #[test]
            fn test_merge_leaves_inputs_untouched(parent in fields(), child in fields()) {
                let parent = record(&parent);
                let child = record(&child);
                let parent_before = parent.clone();
                let child_before = child.clone();
                let strategies = MergeStrategies::new();

                let first = merge_options(&parent, &child, &strategies, None);
                let second = merge_options(&parent, &child, &strategies, None);

                prop_assert!(same_record(&parent, &parent_before));
                prop_assert!(same_record(&child, &child_before));
                prop_assert!(same_record(&first, &second));
            }

            #[test]
            fn test_scalar_fields_prefer_child(parent in fields(), child in fields()) {
                let parent = record(&parent);
                let child = record(&child);
                let merged = merge_options(&parent, &child, &MergeStrategies::new(), None);

                for (key, value) in merged.iter() {
                    let expected = child.get(key).or_else(|| parent.get(key));
                    prop_assert!(expected.is_some_and(|e| e.same(value)));
                }
                prop_assert!(parent.keys().chain(child.keys()).all(|k| merged.contains_key(k)));
            }
        }
    }
}
