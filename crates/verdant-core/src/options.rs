//! Component option records.
//!
//! An [`Options`] record is an ordered map from field name to [`OptionValue`].
//! Field values carry identity: scalar values compare by value, everything
//! else is shared behind `Rc` and compares by pointer (see
//! [`OptionValue::same`]). Merging never mutates a record in place; it builds
//! a new one that shares untouched payloads with its inputs.

use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::callback::{DataFn, FilterFn, Hook, MethodFn, RenderFn, ValueFn, WatchFn};
use crate::definition::Definition;
use crate::errors::BoxError;
use crate::scope::Scope;
use crate::value::{Value, ValueMap};

/// Well-known option field names.
pub mod keys {
    pub const NAME: &str = "name";
    pub const EL: &str = "el";
    pub const ABSTRACT: &str = "abstract";
    pub const COMPONENTS: &str = "components";
    pub const DIRECTIVES: &str = "directives";
    pub const FILTERS: &str = "filters";
    pub const PROPS: &str = "props";
    pub const PROPS_DATA: &str = "props_data";
    pub const INJECT: &str = "inject";
    pub const PROVIDE: &str = "provide";
    pub const DATA: &str = "data";
    pub const COMPUTED: &str = "computed";
    pub const METHODS: &str = "methods";
    pub const WATCH: &str = "watch";
    pub const RENDER: &str = "render";
    pub const STATIC_RENDER_FNS: &str = "static_render_fns";
    pub const MIXINS: &str = "mixins";
    pub const EXTENDS: &str = "extends";

    /// Registry fields merged as key-set unions.
    pub const ASSET_TYPES: [&str; 3] = [COMPONENTS, DIRECTIVES, FILTERS];
}

/// Lifecycle hooks an option record can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    BeforeCreate,
    Created,
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    BeforeDestroy,
    Destroyed,
    Activated,
    Deactivated,
    ErrorCaptured,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 11] = [
        LifecycleHook::BeforeCreate,
        LifecycleHook::Created,
        LifecycleHook::BeforeMount,
        LifecycleHook::Mounted,
        LifecycleHook::BeforeUpdate,
        LifecycleHook::Updated,
        LifecycleHook::BeforeDestroy,
        LifecycleHook::Destroyed,
        LifecycleHook::Activated,
        LifecycleHook::Deactivated,
        LifecycleHook::ErrorCaptured,
    ];

    /// The option field this hook is stored under.
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleHook::BeforeCreate => "before_create",
            LifecycleHook::Created => "created",
            LifecycleHook::BeforeMount => "before_mount",
            LifecycleHook::Mounted => "mounted",
            LifecycleHook::BeforeUpdate => "before_update",
            LifecycleHook::Updated => "updated",
            LifecycleHook::BeforeDestroy => "before_destroy",
            LifecycleHook::Destroyed => "destroyed",
            LifecycleHook::Activated => "activated",
            LifecycleHook::Deactivated => "deactivated",
            LifecycleHook::ErrorCaptured => "error_captured",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hook| hook.as_str() == name)
    }
}

/// A component registered in a `components` registry.
#[derive(Debug, Clone)]
pub enum ComponentRef {
    Owned(Rc<Definition>),
    /// A definition registered under its own name. Held weakly so a
    /// definition never keeps itself alive.
    Recursive(Weak<Definition>),
}

impl ComponentRef {
    pub fn definition(&self) -> Option<Rc<Definition>> {
        match self {
            ComponentRef::Owned(def) => Some(Rc::clone(def)),
            ComponentRef::Recursive(weak) => weak.upgrade(),
        }
    }
}

/// An entry of a registry field (`components`, `directives`, `filters`).
#[derive(Debug, Clone)]
pub enum Asset {
    Component(ComponentRef),
    Filter(FilterFn),
    Value(Value),
}

impl Asset {
    pub fn as_component(&self) -> Option<Rc<Definition>> {
        match self {
            Asset::Component(component) => component.definition(),
            _ => None,
        }
    }
}

/// Registry field payload.
pub type AssetMap = IndexMap<String, Asset>;

/// Declared input property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropSpec {
    pub default: Option<Value>,
    pub required: bool,
}

impl PropSpec {
    pub fn optional(default: impl Into<Value>) -> Self {
        Self {
            default: Some(default.into()),
            required: false,
        }
    }

    pub fn required() -> Self {
        Self {
            default: None,
            required: true,
        }
    }
}

/// Fallback used when no ancestor provides an injection's source key.
#[derive(Debug, Clone)]
pub enum InjectDefault {
    Value(Value),
    /// Invoked once per resolution, with the injecting instance.
    Producer(ValueFn),
}

/// One normalized injection declaration.
#[derive(Debug, Clone)]
pub struct InjectSpec {
    /// Provided key searched for among the ancestors.
    pub from: String,
    pub default: Option<InjectDefault>,
}

impl InjectSpec {
    /// Inject the value provided under `key`.
    pub fn source(key: impl Into<String>) -> Self {
        Self {
            from: key.into(),
            default: None,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(InjectDefault::Value(value.into()));
        self
    }

    pub fn default_with(
        mut self,
        producer: impl Fn(&dyn Scope) -> Result<Value, BoxError> + 'static,
    ) -> Self {
        self.default = Some(InjectDefault::Producer(ValueFn::new(producer)));
        self
    }
}

/// Ordered injection declarations, already normalized to `key -> {from, default}`.
#[derive(Debug, Clone, Default)]
pub struct Injections {
    entries: IndexMap<String, InjectSpec>,
}

impl Injections {
    pub fn new() -> Self {
        Self::default()
    }

    /// List form: each key injects the provided value of the same name.
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let entries = keys
            .into_iter()
            .map(|key| {
                let key = key.into();
                let spec = InjectSpec::source(key.clone());
                (key, spec)
            })
            .collect();
        Self { entries }
    }

    pub fn with(mut self, key: impl Into<String>, spec: InjectSpec) -> Self {
        self.insert(key, spec);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, spec: InjectSpec) {
        self.entries.insert(key.into(), spec);
    }

    pub fn get(&self, key: &str) -> Option<&InjectSpec> {
        self.entries.get(key)
    }

    /// Key-set union; declarations in `other` replace same-named ones.
    pub fn extend_from(&mut self, other: &Injections) {
        for (key, spec) in other.iter() {
            self.entries.insert(key.clone(), spec.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InjectSpec)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `data` / `provide` payload: a literal map or a factory run per instance.
#[derive(Debug, Clone)]
pub enum DataSource {
    Static(Rc<ValueMap>),
    Factory(DataFn),
}

impl DataSource {
    pub fn literal(values: ValueMap) -> Self {
        DataSource::Static(Rc::new(values))
    }

    pub fn factory(f: impl Fn(&dyn Scope) -> Result<ValueMap, BoxError> + 'static) -> Self {
        DataSource::Factory(DataFn::new(f))
    }

    pub fn evaluate(&self, scope: &dyn Scope) -> Result<ValueMap, BoxError> {
        match self {
            DataSource::Static(values) => Ok(values.as_ref().clone()),
            DataSource::Factory(f) => f(scope),
        }
    }

    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (DataSource::Static(a), DataSource::Static(b)) => Rc::ptr_eq(a, b),
            (DataSource::Factory(a), DataSource::Factory(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// The value of one option field.
#[derive(Debug, Clone)]
pub enum OptionValue {
    Value(Value),
    Hooks(Rc<Vec<Hook>>),
    Assets(Rc<AssetMap>),
    Props(Rc<IndexMap<String, PropSpec>>),
    Inject(Rc<Injections>),
    Data(DataSource),
    Computed(Rc<IndexMap<String, ValueFn>>),
    Methods(Rc<IndexMap<String, MethodFn>>),
    Watch(Rc<IndexMap<String, Vec<WatchFn>>>),
    Render(RenderFn),
    StaticRenderFns(Rc<Vec<RenderFn>>),
    Mixins(Rc<Vec<Options>>),
    Extends(Rc<Options>),
}

impl OptionValue {
    /// Identity comparison: scalars by value, shared payloads by pointer.
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (OptionValue::Value(a), OptionValue::Value(b)) => a == b,
            (OptionValue::Hooks(a), OptionValue::Hooks(b)) => Rc::ptr_eq(a, b),
            (OptionValue::Assets(a), OptionValue::Assets(b)) => Rc::ptr_eq(a, b),
            (OptionValue::Props(a), OptionValue::Props(b)) => Rc::ptr_eq(a, b),
            (OptionValue::Inject(a), OptionValue::Inject(b)) => Rc::ptr_eq(a, b),
            (OptionValue::Data(a), OptionValue::Data(b)) => a.same(b),
            (OptionValue::Computed(a), OptionValue::Computed(b)) => Rc::ptr_eq(a, b),
            (OptionValue::Methods(a), OptionValue::Methods(b)) => Rc::ptr_eq(a, b),
            (OptionValue::Watch(a), OptionValue::Watch(b)) => Rc::ptr_eq(a, b),
            (OptionValue::Render(a), OptionValue::Render(b)) => a.ptr_eq(b),
            (OptionValue::StaticRenderFns(a), OptionValue::StaticRenderFns(b)) => Rc::ptr_eq(a, b),
            (OptionValue::Mixins(a), OptionValue::Mixins(b)) => Rc::ptr_eq(a, b),
            (OptionValue::Extends(a), OptionValue::Extends(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Short variant name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            OptionValue::Value(_) => "value",
            OptionValue::Hooks(_) => "hooks",
            OptionValue::Assets(_) => "assets",
            OptionValue::Props(_) => "props",
            OptionValue::Inject(_) => "inject",
            OptionValue::Data(_) => "data",
            OptionValue::Computed(_) => "computed",
            OptionValue::Methods(_) => "methods",
            OptionValue::Watch(_) => "watch",
            OptionValue::Render(_) => "render",
            OptionValue::StaticRenderFns(_) => "static render fns",
            OptionValue::Mixins(_) => "mixins",
            OptionValue::Extends(_) => "extends",
        }
    }
}

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        OptionValue::Value(value)
    }
}

/// An option record.
#[derive(Debug, Clone, Default)]
pub struct Options {
    fields: IndexMap<String, OptionValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut OptionValue> {
        self.fields.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Option<OptionValue> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        self.fields.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy every field of `other` over this record.
    pub fn extend_from(&mut self, other: &Options) {
        for (key, value) in other.iter() {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with(keys::NAME, Value::String(name.into()))
    }

    pub fn with_el(self, target: impl Into<String>) -> Self {
        self.with(keys::EL, Value::String(target.into()))
    }

    pub fn with_abstract(self, is_abstract: bool) -> Self {
        self.with(keys::ABSTRACT, Value::Bool(is_abstract))
    }

    /// Append a handler to a hook field.
    pub fn with_hook(mut self, hook: LifecycleHook, handler: Hook) -> Self {
        match self.fields.get_mut(hook.as_str()) {
            Some(OptionValue::Hooks(handlers)) => Rc::make_mut(handlers).push(handler),
            _ => {
                self.insert(hook.as_str(), OptionValue::Hooks(Rc::new(vec![handler])));
            }
        }
        self
    }

    pub fn on(
        self,
        hook: LifecycleHook,
        f: impl Fn(&mut dyn Scope) -> Result<(), BoxError> + 'static,
    ) -> Self {
        self.with_hook(hook, Hook::new(f))
    }

    pub fn with_asset(mut self, kind: &str, name: impl Into<String>, asset: Asset) -> Self {
        match self.fields.get_mut(kind) {
            Some(OptionValue::Assets(assets)) => {
                Rc::make_mut(assets).insert(name.into(), asset);
            }
            _ => {
                let mut assets = AssetMap::new();
                assets.insert(name.into(), asset);
                self.insert(kind, OptionValue::Assets(Rc::new(assets)));
            }
        }
        self
    }

    pub fn with_component(self, name: impl Into<String>, definition: Rc<Definition>) -> Self {
        self.with_asset(keys::COMPONENTS, name, Asset::Component(ComponentRef::Owned(definition)))
    }

    pub fn with_directive(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_asset(keys::DIRECTIVES, name, Asset::Value(value.into()))
    }

    pub fn with_filter(self, name: impl Into<String>, filter: FilterFn) -> Self {
        self.with_asset(keys::FILTERS, name, Asset::Filter(filter))
    }

    pub fn with_prop(mut self, name: impl Into<String>, spec: PropSpec) -> Self {
        match self.fields.get_mut(keys::PROPS) {
            Some(OptionValue::Props(props)) => {
                Rc::make_mut(props).insert(name.into(), spec);
            }
            _ => {
                let mut props = IndexMap::new();
                props.insert(name.into(), spec);
                self.insert(keys::PROPS, OptionValue::Props(Rc::new(props)));
            }
        }
        self
    }

    pub fn with_props_data(self, values: ValueMap) -> Self {
        self.with(keys::PROPS_DATA, Value::Map(values))
    }

    pub fn with_inject(self, injections: Injections) -> Self {
        self.with(keys::INJECT, OptionValue::Inject(Rc::new(injections)))
    }

    pub fn with_provide(self, source: DataSource) -> Self {
        self.with(keys::PROVIDE, OptionValue::Data(source))
    }

    pub fn with_data(self, source: DataSource) -> Self {
        self.with(keys::DATA, OptionValue::Data(source))
    }

    pub fn with_computed(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&dyn Scope) -> Result<Value, BoxError> + 'static,
    ) -> Self {
        let getter = ValueFn::new(getter);
        match self.fields.get_mut(keys::COMPUTED) {
            Some(OptionValue::Computed(computed)) => {
                Rc::make_mut(computed).insert(name.into(), getter);
            }
            _ => {
                let mut computed = IndexMap::new();
                computed.insert(name.into(), getter);
                self.insert(keys::COMPUTED, OptionValue::Computed(Rc::new(computed)));
            }
        }
        self
    }

    pub fn with_method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&mut dyn Scope, &[Value]) -> Result<Value, BoxError> + 'static,
    ) -> Self {
        let method = MethodFn::new(method);
        match self.fields.get_mut(keys::METHODS) {
            Some(OptionValue::Methods(methods)) => {
                Rc::make_mut(methods).insert(name.into(), method);
            }
            _ => {
                let mut methods = IndexMap::new();
                methods.insert(name.into(), method);
                self.insert(keys::METHODS, OptionValue::Methods(Rc::new(methods)));
            }
        }
        self
    }

    pub fn with_watch(mut self, key: impl Into<String>, watcher: WatchFn) -> Self {
        match self.fields.get_mut(keys::WATCH) {
            Some(OptionValue::Watch(watch)) => {
                Rc::make_mut(watch).entry(key.into()).or_default().push(watcher);
            }
            _ => {
                let mut watch = IndexMap::new();
                watch.insert(key.into(), vec![watcher]);
                self.insert(keys::WATCH, OptionValue::Watch(Rc::new(watch)));
            }
        }
        self
    }

    pub fn with_render(self, render: RenderFn) -> Self {
        self.with(keys::RENDER, OptionValue::Render(render))
    }

    pub fn with_static_render_fns(self, fns: Vec<RenderFn>) -> Self {
        self.with(keys::STATIC_RENDER_FNS, OptionValue::StaticRenderFns(Rc::new(fns)))
    }

    pub fn with_mixin(mut self, mixin: Options) -> Self {
        match self.fields.get_mut(keys::MIXINS) {
            Some(OptionValue::Mixins(mixins)) => Rc::make_mut(mixins).push(mixin),
            _ => {
                self.insert(keys::MIXINS, OptionValue::Mixins(Rc::new(vec![mixin])));
            }
        }
        self
    }

    pub fn with_extends(self, base: Options) -> Self {
        self.with(keys::EXTENDS, OptionValue::Extends(Rc::new(base)))
    }
}

impl FromIterator<(String, OptionValue)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Typed read access to option fields.
///
/// Implemented by plain records and by layered instance configurations, so
/// every reader goes through the same lookups regardless of how the fields
/// were assembled.
pub trait OptionSource {
    fn option(&self, key: &str) -> Option<&OptionValue>;

    fn value(&self, key: &str) -> Option<&Value> {
        match self.option(key) {
            Some(OptionValue::Value(value)) => Some(value),
            _ => None,
        }
    }

    fn name(&self) -> Option<&str> {
        self.value(keys::NAME).and_then(Value::as_str)
    }

    /// Mount target.
    fn el(&self) -> Option<&str> {
        self.value(keys::EL).and_then(Value::as_str)
    }

    /// Abstract components (keep-alive style wrappers) are skipped when an
    /// instance looks for its parent.
    fn is_abstract(&self) -> bool {
        self.value(keys::ABSTRACT).map_or(false, Value::is_truthy)
    }

    fn hooks(&self, hook: LifecycleHook) -> &[Hook] {
        match self.option(hook.as_str()) {
            Some(OptionValue::Hooks(handlers)) => handlers.as_slice(),
            _ => &[],
        }
    }

    fn assets(&self, kind: &str) -> Option<&AssetMap> {
        match self.option(kind) {
            Some(OptionValue::Assets(assets)) => Some(&**assets),
            _ => None,
        }
    }

    fn components(&self) -> Option<&AssetMap> {
        self.assets(keys::COMPONENTS)
    }

    fn props(&self) -> Option<&IndexMap<String, PropSpec>> {
        match self.option(keys::PROPS) {
            Some(OptionValue::Props(props)) => Some(&**props),
            _ => None,
        }
    }

    fn inject(&self) -> Option<&Injections> {
        match self.option(keys::INJECT) {
            Some(OptionValue::Inject(injections)) => Some(&**injections),
            _ => None,
        }
    }

    fn provide(&self) -> Option<&DataSource> {
        match self.option(keys::PROVIDE) {
            Some(OptionValue::Data(source)) => Some(source),
            _ => None,
        }
    }

    fn data(&self) -> Option<&DataSource> {
        match self.option(keys::DATA) {
            Some(OptionValue::Data(source)) => Some(source),
            _ => None,
        }
    }

    fn computed(&self) -> Option<&IndexMap<String, ValueFn>> {
        match self.option(keys::COMPUTED) {
            Some(OptionValue::Computed(computed)) => Some(&**computed),
            _ => None,
        }
    }

    fn methods(&self) -> Option<&IndexMap<String, MethodFn>> {
        match self.option(keys::METHODS) {
            Some(OptionValue::Methods(methods)) => Some(&**methods),
            _ => None,
        }
    }

    fn watch(&self) -> Option<&IndexMap<String, Vec<WatchFn>>> {
        match self.option(keys::WATCH) {
            Some(OptionValue::Watch(watch)) => Some(&**watch),
            _ => None,
        }
    }
}

impl OptionSource for Options {
    fn option(&self, key: &str) -> Option<&OptionValue> {
        self.get(key)
    }
}
