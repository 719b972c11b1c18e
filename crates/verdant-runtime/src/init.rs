//! Instance construction.

use std::rc::Rc;

use tracing::trace;
use verdant_core::{
    keys, Definition, InstanceError, InstanceId, LifecycleHook, Listeners, OptionSource,
    OptionValue, Options, RenderFn, Uid, VNode,
};
use verdant_options::{merge_options, resolve_constructor_options, MergeStrategies};

use crate::instance::{Instance, InstanceConfig};
use crate::render::ProxyMode;
use crate::runtime::Runtime;

/// Options for an instance created directly by user code.
#[derive(Debug, Clone, Default)]
pub struct RootOptions {
    /// Merged against the definition's resolved options.
    pub options: Options,
    pub parent: Option<InstanceId>,
    pub listeners: Option<Rc<Listeners>>,
    pub render_children: Option<Rc<Vec<VNode>>>,
}

impl RootOptions {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: InstanceId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_listeners(mut self, listeners: Listeners) -> Self {
        self.listeners = Some(Rc::new(listeners));
        self
    }

    pub fn with_render_children(mut self, children: Vec<VNode>) -> Self {
        self.render_children = Some(Rc::new(children));
        self
    }
}

/// Options for a child instance created from a component node of a parent
/// render.
#[derive(Debug, Clone)]
pub struct InternalOptions {
    pub parent: InstanceId,
    pub parent_vnode: Rc<VNode>,
    pub render: Option<RenderFn>,
    pub static_render_fns: Option<Rc<Vec<RenderFn>>>,
}

impl InternalOptions {
    pub fn new(parent: InstanceId, parent_vnode: Rc<VNode>) -> Self {
        Self {
            parent,
            parent_vnode,
            render: None,
            static_render_fns: None,
        }
    }

    /// Render function replacing the definition's own, e.g. an inline template.
    pub fn with_render(mut self, render: RenderFn, static_render_fns: Vec<RenderFn>) -> Self {
        self.render = Some(render);
        self.static_render_fns = Some(Rc::new(static_render_fns));
        self
    }
}

#[derive(Debug, Clone)]
pub enum InstantiateOptions {
    Root(RootOptions),
    Component(InternalOptions),
}

impl From<RootOptions> for InstantiateOptions {
    fn from(options: RootOptions) -> Self {
        InstantiateOptions::Root(options)
    }
}

impl From<InternalOptions> for InstantiateOptions {
    fn from(options: InternalOptions) -> Self {
        InstantiateOptions::Component(options)
    }
}

impl From<Options> for InstantiateOptions {
    fn from(options: Options) -> Self {
        InstantiateOptions::Root(RootOptions::new(options))
    }
}

/// Build a child instance's configuration without merging.
///
/// The definition's resolved options are shared as the read-through layer;
/// everything the parent render passes is copied by reference from the
/// component node.
pub fn init_internal_component(
    definition: &Rc<Definition>,
    options: &InternalOptions,
    strategies: &MergeStrategies,
) -> Result<InstanceConfig, InstanceError> {
    let vnode = &options.parent_vnode;
    let Some(component) = vnode.component_options.as_ref() else {
        return Err(InstanceError::NotAComponentNode {
            tag: vnode.display_tag().to_string(),
        });
    };

    let mut config = InstanceConfig::new(resolve_constructor_options(definition, strategies));
    config.parent = Some(options.parent);
    config.parent_vnode = Some(Rc::clone(vnode));
    config.props_data = Some(Rc::clone(&component.props_data));
    config.listeners = Some(Rc::clone(&component.listeners));
    config.render_children = Some(Rc::clone(&component.children));
    config.component_tag = component.tag.clone();

    if let Some(render) = &options.render {
        config.set_override(keys::RENDER, OptionValue::Render(render.clone()));
        if let Some(static_render_fns) = &options.static_render_fns {
            config.set_override(
                keys::STATIC_RENDER_FNS,
                OptionValue::StaticRenderFns(Rc::clone(static_render_fns)),
            );
        }
    }
    trace!(cid = %definition.cid(), parent = %options.parent, "internal component config");
    Ok(config)
}

impl Runtime {
    /// Create and fully initialize an instance of `definition`.
    ///
    /// Hooks, state initializers, injection defaults and provide factories
    /// run synchronously; the first failure is returned unchanged. When the
    /// configuration names an `el` the instance is mounted before returning.
    pub fn instantiate(
        &mut self,
        definition: &Rc<Definition>,
        options: impl Into<InstantiateOptions>,
    ) -> Result<InstanceId, InstanceError> {
        let uid = Uid::next();
        let id = InstanceId(self.len());

        let config = match options.into() {
            InstantiateOptions::Component(internal) => {
                self.instance(internal.parent)?;
                init_internal_component(definition, &internal, &self.config().strategies)?
            }
            InstantiateOptions::Root(root) => {
                let strategies = &self.config().strategies;
                let resolved = resolve_constructor_options(definition, strategies);
                let merged = merge_options(&resolved, &root.options, strategies, Some(uid));
                let mut config = InstanceConfig::new(Rc::new(merged));
                config.parent = root.parent;
                config.listeners = root.listeners;
                config.render_children = root.render_children;
                config
            }
        };

        let mut instance = Instance::new(uid, id, Rc::clone(definition), config);
        instance.proxy_mode = ProxyMode::for_build();
        trace!(
            uid = %uid,
            instance = %id,
            component = instance.config.name().unwrap_or("<anonymous>"),
            "instantiating"
        );
        self.push(instance);

        self.init_lifecycle(id)?;
        self.init_events(id)?;
        self.init_render(id)?;
        self.call_hook(id, LifecycleHook::BeforeCreate)?;
        self.init_injections(id)?;
        let state = self.state_handle();
        state.init_state(self, id)?;
        self.init_provide(id)?;
        self.call_hook(id, LifecycleHook::Created)?;

        let el = self.instance(id)?.config.el().map(str::to_string);
        if let Some(target) = el {
            self.mount(id, &target)?;
        }
        Ok(id)
    }

    /// Instantiate the component described by a node of `parent`'s render.
    pub fn instantiate_child(&mut self, parent: InstanceId, vnode: Rc<VNode>) -> Result<InstanceId, InstanceError> {
        let Some(component) = vnode.component_options.as_ref() else {
            return Err(InstanceError::NotAComponentNode {
                tag: vnode.display_tag().to_string(),
            });
        };
        let definition = Rc::clone(&component.definition);
        self.instantiate(&definition, InternalOptions::new(parent, vnode))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::testing::recording_runtime;
    use verdant_core::{
        ComponentVNodeOptions, DataSource, Hook, Injections, Listener, PropSpec, Scope, Value,
        ValueMap,
    };
    use verdant_options::extend;

    fn component_node(definition: &Rc<Definition>, props: ValueMap) -> Rc<VNode> {
        let mut listeners = Listeners::new();
        listeners.entry("close".into()).or_default().push(Listener::new(|_| {}));
        Rc::new(VNode::component(
            "child",
            ComponentVNodeOptions::new(Rc::clone(definition))
                .props_data(props)
                .listeners(listeners)
                .children(vec![VNode::text("slot content")])
                .tag("child"),
        ))
    }

    #[test]
    fn test_uids_unique_and_increasing() {
        let (mut runtime, _sink) = recording_runtime();
        let base = Definition::root(Options::new());
        let ids: Vec<InstanceId> = (0..16)
            .map(|_| runtime.instantiate(&base, Options::new()).unwrap())
            .collect();
        let uids: Vec<Uid> = ids.iter().map(|id| runtime.instance(*id).unwrap().uid).collect();
        assert!(uids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(runtime.instances().all(|instance| instance.observation_exempt));
    }

    #[test]
    fn test_root_options_merge_with_definition() {
        let (mut runtime, _sink) = recording_runtime();
        let hook = Hook::new(|_| Ok(()));
        let base = Definition::root(Options::new().with_name("App").with_hook(LifecycleHook::Created, hook.clone()));
        let own = Hook::new(|_| Ok(()));
        let id = runtime
            .instantiate(&base, Options::new().with_hook(LifecycleHook::Created, own.clone()))
            .unwrap();

        let config = &runtime.instance(id).unwrap().config;
        let hooks = config.hooks(LifecycleHook::Created);
        assert_eq!(hooks.len(), 2);
        assert!(hooks[0].ptr_eq(&hook));
        assert!(hooks[1].ptr_eq(&own));
        assert_eq!(config.name(), Some("App"));
    }

    #[test]
    fn test_fast_path_matches_full_merge() {
        let (mut runtime, _sink) = recording_runtime();
        let strategies = runtime.config().strategies.clone();
        let base = Definition::root(Options::new().on(LifecycleHook::Created, |_| Ok(())));
        let child_def = extend(
            &base,
            Options::new()
                .with_name("Child")
                .with_prop("title", PropSpec::optional("none"))
                .with_data(DataSource::factory(|_| Ok(ValueMap::new())))
                .with_inject(Injections::keys(["theme"])),
            &strategies,
        );
        let parent = runtime.instantiate(&base, Options::new()).unwrap();

        let mut props = ValueMap::new();
        props.insert("title".into(), Value::from("Hi"));
        let vnode = component_node(&child_def, props.clone());
        let fast = init_internal_component(&child_def, &InternalOptions::new(parent, Rc::clone(&vnode)), &strategies)
            .unwrap();

        let resolved = resolve_constructor_options(&child_def, &strategies);
        let full = merge_options(
            &resolved,
            &Options::new().with_props_data(props),
            &strategies,
            Some(Uid(u64::MAX)),
        );

        for (key, value) in full.iter() {
            if key == keys::PROPS_DATA {
                continue;
            }
            let fast_value = fast.option(key).unwrap();
            assert!(fast_value.same(value), "field {key} differs");
        }
        assert_eq!(fast.props_data(), full.value(keys::PROPS_DATA).and_then(Value::as_map));
        assert!(Rc::ptr_eq(fast.fallback(), &child_def.options()));
        assert!(Rc::ptr_eq(fast.parent_vnode.as_ref().unwrap(), &vnode));
        let component = vnode.component_options.as_ref().unwrap();
        assert!(Rc::ptr_eq(fast.props_data.as_ref().unwrap(), &component.props_data));
        assert!(Rc::ptr_eq(fast.listeners.as_ref().unwrap(), &component.listeners));
        assert!(Rc::ptr_eq(fast.render_children.as_ref().unwrap(), &component.children));
        assert_eq!(fast.component_tag.as_deref(), Some("child"));
    }

    #[test]
    fn test_fast_path_render_override() {
        let (mut runtime, _sink) = recording_runtime();
        let base = Definition::root(Options::new().with_render(RenderFn::new(|_| VNode::text("own"))));
        let parent = runtime.instantiate(&base, Options::new()).unwrap();
        let vnode = component_node(&base, ValueMap::new());

        let render = RenderFn::new(|_| VNode::text("inline"));
        let options = InternalOptions::new(parent, vnode).with_render(render.clone(), vec![]);
        let config = init_internal_component(&base, &options, &runtime.config().strategies).unwrap();
        match config.option(keys::RENDER) {
            Some(OptionValue::Render(found)) => assert!(found.ptr_eq(&render)),
            other => panic!("unexpected render option {other:?}"),
        }
        assert!(config.option(keys::STATIC_RENDER_FNS).is_some());
    }

    #[test]
    fn test_fast_path_rejects_plain_nodes() {
        let (mut runtime, _sink) = recording_runtime();
        let base = Definition::root(Options::new());
        let parent = runtime.instantiate(&base, Options::new()).unwrap();
        let err = runtime
            .instantiate_child(parent, Rc::new(VNode::element("div", vec![])))
            .unwrap_err();
        assert!(matches!(err, InstanceError::NotAComponentNode { tag } if tag == "div"));
    }

    #[test]
    fn test_child_instance_from_component_node() {
        let (mut runtime, _sink) = recording_runtime();
        let base = Definition::root(Options::new());
        let child_def = extend(
            &base,
            Options::new().with_name("Child").with_prop("title", PropSpec::required()),
            &runtime.config().strategies,
        );
        let parent = runtime.instantiate(&base, Options::new()).unwrap();

        let mut props = ValueMap::new();
        props.insert("title".into(), Value::from("Hello"));
        let child = runtime
            .instantiate_child(parent, component_node(&child_def, props))
            .unwrap();

        let instance = runtime.instance(child).unwrap();
        assert_eq!(instance.parent, Some(parent));
        assert_eq!(instance.root, parent);
        assert_eq!(instance.get("title"), Some(&Value::from("Hello")));
        assert_eq!(instance.render.slots["default"].len(), 1);
        assert_eq!(instance.events.listeners("close").len(), 1);
        assert_eq!(runtime.instance(parent).unwrap().children, vec![child]);
    }

    #[test]
    fn test_construction_order() {
        let (mut runtime, _sink) = recording_runtime();
        let order = Rc::new(RefCell::new(Vec::new()));
        let record = |label: &'static str| {
            let order = Rc::clone(&order);
            Hook::new(move |scope: &mut dyn Scope| {
                let attrs = scope.get("$attrs").is_some();
                let data = scope.get("count").is_some();
                order.borrow_mut().push((label, attrs, data));
                Ok(())
            })
        };
        let base = Definition::root(
            Options::new()
                .with_data(DataSource::factory(|_| {
                    let mut values = ValueMap::new();
                    values.insert("count".into(), Value::from(0));
                    Ok(values)
                }))
                .with_hook(LifecycleHook::BeforeCreate, record("before_create"))
                .with_hook(LifecycleHook::Created, record("created")),
        );
        runtime.instantiate(&base, Options::new()).unwrap();

        assert_eq!(
            *order.borrow(),
            vec![("before_create", true, false), ("created", true, true)]
        );
    }
}
