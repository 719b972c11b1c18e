//! Render nodes as seen by the instantiation engine.
//!
//! Only the fields instantiation consumes are modelled: slot assignment,
//! attributes, listeners, scoped slots, and the component options a parent
//! render attaches to a component placeholder node.

use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::callback::{Listener, ScopedSlotFn};
use crate::definition::Definition;
use crate::value::{Value, ValueMap};

/// Event name to handlers, in attachment order.
pub type Listeners = IndexMap<String, SmallVec<[Listener; 1]>>;

/// Per-node data consumed during instantiation.
#[derive(Debug, Clone, Default)]
pub struct VNodeData {
    /// Named slot this node is distributed into.
    pub slot: Option<String>,
    pub attrs: ValueMap,
    pub on: Listeners,
    pub scoped_slots: IndexMap<String, ScopedSlotFn>,
}

/// What a parent render attaches to a component placeholder node.
#[derive(Debug, Clone)]
pub struct ComponentVNodeOptions {
    pub definition: Rc<Definition>,
    pub props_data: Rc<ValueMap>,
    pub listeners: Rc<Listeners>,
    pub children: Rc<Vec<VNode>>,
    pub tag: Option<String>,
}

impl ComponentVNodeOptions {
    pub fn new(definition: Rc<Definition>) -> Self {
        Self {
            definition,
            props_data: Rc::default(),
            listeners: Rc::default(),
            children: Rc::default(),
            tag: None,
        }
    }

    pub fn props_data(mut self, props_data: ValueMap) -> Self {
        self.props_data = Rc::new(props_data);
        self
    }

    pub fn listeners(mut self, listeners: Listeners) -> Self {
        self.listeners = Rc::new(listeners);
        self
    }

    pub fn children(mut self, children: Vec<VNode>) -> Self {
        self.children = Rc::new(children);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// A render node.
#[derive(Debug, Clone, Default)]
pub struct VNode {
    pub tag: Option<String>,
    pub text: Option<String>,
    pub data: VNodeData,
    pub children: Vec<VNode>,
    pub component_options: Option<ComponentVNodeOptions>,
}

impl VNode {
    pub fn element(tag: impl Into<String>, children: Vec<VNode>) -> Self {
        Self {
            tag: Some(tag.into()),
            children,
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A component placeholder node carrying the options a child instance is
    /// built from.
    pub fn component(tag: impl Into<String>, options: ComponentVNodeOptions) -> Self {
        Self {
            tag: Some(tag.into()),
            component_options: Some(options),
            ..Self::default()
        }
    }

    pub fn with_slot(mut self, name: impl Into<String>) -> Self {
        self.data.slot = Some(name.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.attrs.insert(name.into(), value.into());
        self
    }

    pub fn is_component(&self) -> bool {
        self.component_options.is_some()
    }

    /// Text nodes holding nothing but whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.tag.is_none()
            && self
                .text
                .as_deref()
                .is_some_and(|t| t.chars().all(char::is_whitespace))
    }

    /// Tag for diagnostics, `anonymous` for text nodes.
    pub fn display_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or("anonymous")
    }
}
