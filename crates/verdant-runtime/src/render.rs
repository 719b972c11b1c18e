//! Render context: slots, the render proxy and element creation.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;
use verdant_core::{
    keys, ComponentVNodeOptions, InstanceError, InstanceId, OptionSource, ScopedSlotFn, VNode,
    VNodeData, Value, ValueMap,
};
use verdant_options::{resolve_asset, resolve_constructor_options};

use crate::instance::MutationGuard;
use crate::runtime::Runtime;

pub const DEFAULT_SLOT: &str = "default";

/// Slot name to the nodes distributed into it.
pub type Slots = IndexMap<String, Vec<VNode>>;

/// Render-time state derived from the parent render.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Placeholder node in the parent's tree.
    pub parent_vnode: Option<Rc<VNode>>,
    pub slots: Slots,
    pub scoped_slots: IndexMap<String, ScopedSlotFn>,
    /// Tree produced by the last render.
    pub vnode: Option<VNode>,
}

/// How render-time property reads are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMode {
    /// Reads of undefined properties produce a diagnostic.
    Instrumented,
    /// Plain reads.
    Bare,
}

impl ProxyMode {
    /// Instrumented in debug builds, bare otherwise.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            ProxyMode::Instrumented
        } else {
            ProxyMode::Bare
        }
    }
}

/// Read access to an instance as seen from its render function.
pub struct RenderProxy<'a> {
    runtime: &'a Runtime,
    id: InstanceId,
    mode: ProxyMode,
}

impl<'a> RenderProxy<'a> {
    pub fn mode(&self) -> ProxyMode {
        self.mode
    }

    /// Whether `key` names a property or method of the instance.
    pub fn has(&self, key: &str) -> bool {
        self.runtime.instance(self.id).is_ok_and(|instance| {
            instance.properties.contains_key(key) || instance.methods.contains_key(key)
        })
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        let value = self.runtime.get(self.id, key);
        if value.is_none()
            && self.mode == ProxyMode::Instrumented
            && !key.starts_with('_')
            && !self.has(key)
        {
            self.runtime.warn(
                Some(self.id),
                format!(
                    "Property or method \"{key}\" is not defined on the instance but referenced during render. Make sure that this property is reactive, either in the data option, or by declaring it as a prop."
                ),
            );
        }
        value
    }
}

/// Distribute render children into slots. Nodes naming a slot go to that
/// slot (a `template` node contributes its children), the rest go to
/// `default`. Slots holding only whitespace text are dropped.
pub fn resolve_slots(children: &[VNode]) -> Slots {
    let mut slots = Slots::new();
    for child in children {
        match child.data.slot.as_deref() {
            Some(name) => {
                let slot = slots.entry(name.to_string()).or_default();
                if child.tag.as_deref() == Some("template") {
                    slot.extend(child.children.iter().cloned());
                } else {
                    slot.push(child.clone());
                }
            }
            None => slots
                .entry(DEFAULT_SLOT.to_string())
                .or_default()
                .push(child.clone()),
        }
    }
    slots.retain(|_, nodes| !nodes.iter().all(VNode::is_whitespace));
    slots
}

/// `myProp` -> `my-prop`.
pub fn hyphenate(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

impl Runtime {
    /// Resolve slots and scoped slots, and install `$attrs`.
    pub(crate) fn init_render(&mut self, id: InstanceId) -> Result<(), InstanceError> {
        let reactivity = self.reactivity_handle();
        let instance = self.instance_mut(id)?;
        let parent_vnode = instance.config.parent_vnode.clone();
        let slots = instance
            .config
            .render_children
            .as_deref()
            .map(|children| resolve_slots(children))
            .unwrap_or_default();
        let scoped_slots = parent_vnode
            .as_ref()
            .map(|vnode| vnode.data.scoped_slots.clone())
            .unwrap_or_default();
        let attrs = parent_vnode
            .as_ref()
            .map(|vnode| vnode.data.attrs.clone())
            .unwrap_or_default();

        instance.render = RenderContext {
            parent_vnode,
            slots,
            scoped_slots,
            vnode: None,
        };
        reactivity.define_reactive(
            &mut instance.properties,
            "$attrs",
            Value::Map(attrs),
            Some(MutationGuard::Attrs),
        );
        Ok(())
    }

    pub fn render_proxy(&self, id: InstanceId) -> Result<RenderProxy<'_>, InstanceError> {
        let mode = self.instance(id)?.proxy_mode;
        Ok(RenderProxy {
            runtime: self,
            id,
            mode,
        })
    }

    /// Create a render node on behalf of `id`.
    ///
    /// Tags registered as components in the instance's registry produce a
    /// component placeholder node: attributes matching the component's
    /// declared props move into its props data and listeners move into its
    /// component options. Any other tag produces a plain element.
    pub fn create_element(
        &self,
        id: InstanceId,
        tag: &str,
        mut data: VNodeData,
        children: Vec<VNode>,
    ) -> Result<VNode, InstanceError> {
        let instance = self.instance(id)?;
        let definition = resolve_asset(&instance.config, keys::COMPONENTS, tag, false)
            .and_then(|asset| asset.as_component());
        let Some(definition) = definition else {
            return Ok(VNode {
                tag: Some(tag.to_string()),
                data,
                children,
                ..VNode::default()
            });
        };

        let options = resolve_constructor_options(&definition, &self.config().strategies);
        let mut props_data = ValueMap::new();
        if let Some(props) = options.props() {
            for key in props.keys() {
                let value = data
                    .attrs
                    .shift_remove(key)
                    .or_else(|| data.attrs.shift_remove(&hyphenate(key)));
                if let Some(value) = value {
                    props_data.insert(key.clone(), value);
                }
            }
        }
        let listeners = std::mem::take(&mut data.on);
        let name = options.name().unwrap_or(tag);
        trace!(instance = %id, tag, cid = %definition.cid(), "component node");

        let component = ComponentVNodeOptions::new(Rc::clone(&definition))
            .props_data(props_data)
            .listeners(listeners)
            .children(children)
            .tag(tag);
        Ok(VNode {
            tag: Some(format!("verdant-component-{}-{}", definition.cid(), name)),
            data,
            component_options: Some(component),
            ..VNode::default()
        })
    }
}
