//! Live instances and their resolved configuration.

use std::rc::Rc;

use indexmap::IndexMap;
use verdant_core::{
    keys, Definition, InstanceId, Listeners, MethodFn, OptionSource, OptionValue, Options, Uid,
    VNode, Value, ValueMap, WatchFn,
};

use crate::events::EventChannel;
use crate::lifecycle::LifecycleState;
use crate::render::{ProxyMode, RenderContext};

/// Diagnostic raised when a guarded property is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationGuard {
    /// Injected from an ancestor; overwritten when the provider re-renders.
    Injected,
    /// Prop of a child component; overwritten when the parent re-renders.
    Prop,
    /// `$attrs`, owned by the parent render.
    Attrs,
    /// Computed value without a setter. Assignments are ignored.
    ReadOnly,
}

impl MutationGuard {
    pub fn message(self, key: &str) -> String {
        match self {
            MutationGuard::Injected => format!(
                "Avoid mutating an injected value directly since the changes will be overwritten whenever the provided component re-renders. injection being mutated: \"{key}\""
            ),
            MutationGuard::Prop => format!(
                "Avoid mutating a prop directly since the value will be overwritten whenever the parent component re-renders. Instead, use a data or computed property based on the prop's value. Prop being mutated: \"{key}\""
            ),
            MutationGuard::Attrs => format!("{key} is readonly."),
            MutationGuard::ReadOnly => {
                format!("Computed property \"{key}\" was assigned to but it has no setter.")
            }
        }
    }
}

/// A property installed through the observation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactiveProperty {
    pub value: Value,
    /// Whether the value was deeply observed when installed.
    pub observed: bool,
    pub guard: Option<MutationGuard>,
    /// Number of accepted assignments.
    pub revision: u64,
}

pub type Properties = IndexMap<String, ReactiveProperty>;

/// An instance's resolved configuration.
///
/// Fields not set on the instance itself read through to `fallback`, which
/// is either the full merge result (root instances) or the definition's
/// resolved options shared as-is (instances built by a parent render).
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    fallback: Rc<Options>,
    overrides: Options,
    /// Instance the caller asked to nest under.
    pub parent: Option<InstanceId>,
    /// Placeholder node in the parent's render tree.
    pub parent_vnode: Option<Rc<VNode>>,
    pub props_data: Option<Rc<ValueMap>>,
    pub listeners: Option<Rc<Listeners>>,
    pub render_children: Option<Rc<Vec<VNode>>>,
    pub component_tag: Option<String>,
}

impl InstanceConfig {
    pub fn new(fallback: Rc<Options>) -> Self {
        Self {
            fallback,
            overrides: Options::new(),
            parent: None,
            parent_vnode: None,
            props_data: None,
            listeners: None,
            render_children: None,
            component_tag: None,
        }
    }

    pub fn fallback(&self) -> &Rc<Options> {
        &self.fallback
    }

    pub fn overrides(&self) -> &Options {
        &self.overrides
    }

    /// Set a field on the instance layer.
    pub fn set_override(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.overrides.insert(key, value);
    }

    /// Prop values passed by the parent, or `props_data` from the merged
    /// options of a root instance.
    pub fn props_data(&self) -> Option<&ValueMap> {
        match &self.props_data {
            Some(values) => Some(&**values),
            None => self.value(keys::PROPS_DATA).and_then(Value::as_map),
        }
    }
}

impl OptionSource for InstanceConfig {
    fn option(&self, key: &str) -> Option<&OptionValue> {
        self.overrides.get(key).or_else(|| self.fallback.get(key))
    }
}

/// A live component instance.
#[derive(Debug)]
pub struct Instance {
    pub uid: Uid,
    pub id: InstanceId,
    /// The definition this instance was created from.
    pub definition: Rc<Definition>,
    pub config: InstanceConfig,
    /// Instances are never deeply observed as values.
    pub observation_exempt: bool,
    pub proxy_mode: ProxyMode,
    /// Nearest non-abstract ancestor.
    pub parent: Option<InstanceId>,
    pub root: InstanceId,
    pub children: Vec<InstanceId>,
    pub refs: IndexMap<String, InstanceId>,
    pub lifecycle: LifecycleState,
    pub events: EventChannel,
    pub render: RenderContext,
    pub properties: Properties,
    pub methods: Rc<IndexMap<String, MethodFn>>,
    pub watchers: IndexMap<String, Vec<WatchFn>>,
    /// Values this instance provides to its descendants.
    pub provided: Option<ValueMap>,
}

impl Instance {
    pub(crate) fn new(uid: Uid, id: InstanceId, definition: Rc<Definition>, config: InstanceConfig) -> Self {
        Self {
            uid,
            id,
            definition,
            config,
            observation_exempt: true,
            proxy_mode: ProxyMode::Bare,
            parent: None,
            root: id,
            children: Vec::new(),
            refs: IndexMap::new(),
            lifecycle: LifecycleState::default(),
            events: EventChannel::new(),
            render: RenderContext::default(),
            properties: Properties::new(),
            methods: Rc::default(),
            watchers: IndexMap::new(),
            provided: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).map(|property| &property.value)
    }

    pub fn is_root(&self) -> bool {
        self.root == self.id
    }
}
