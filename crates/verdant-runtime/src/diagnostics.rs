//! Development diagnostics.
//!
//! Warnings never alter control flow. They are produced only in debug
//! builds, and only when the runtime is not configured as silent.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;
use verdant_core::{Cid, InstanceId, OptionSource, Uid};

use crate::runtime::Runtime;

/// One emitted warning.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub uid: Option<Uid>,
    /// Formatted component name, e.g. `<TodoItem>`.
    pub component: Option<String>,
    /// Ancestor trace of the instance the warning is about.
    pub trace: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            uid: None,
            component: None,
            trace: String::new(),
        }
    }
}

/// Receiver of development warnings.
pub trait DiagnosticSink {
    fn warn(&self, diagnostic: &Diagnostic);
}

/// Forwards warnings to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, diagnostic: &Diagnostic) {
        warn!(
            uid = diagnostic.uid.map(|uid| uid.0),
            component = diagnostic.component.as_deref().unwrap_or("<Root>"),
            "{}{}",
            diagnostic.message,
            diagnostic.trace
        );
    }
}

/// Keeps warnings in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    entries: Rc<RefCell<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|d| d.message.clone()).collect()
    }

    /// Whether any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.borrow().iter().any(|d| d.message.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, diagnostic: &Diagnostic) {
        self.entries.borrow_mut().push(diagnostic.clone());
    }
}

/// `todo-item` / `todo_item` -> `TodoItem`.
pub fn classify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if c == '-' || c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl Runtime {
    /// `<Root>` for a root instance, `<Name>` for a named component,
    /// `<Anonymous>` otherwise.
    pub fn format_component_name(&self, id: InstanceId) -> String {
        let Ok(instance) = self.instance(id) else {
            return "<Anonymous>".to_string();
        };
        if instance.root == id {
            return "<Root>".to_string();
        }
        let name = instance
            .config
            .name()
            .map(str::to_string)
            .or_else(|| instance.config.component_tag.clone());
        match name {
            Some(name) => format!("<{}>", classify(&name)),
            None => "<Anonymous>".to_string(),
        }
    }

    /// The chain of components from `id` up to its root, with runs of
    /// recursive self-nesting collapsed.
    pub fn component_trace(&self, id: InstanceId) -> String {
        let Ok(instance) = self.instance(id) else {
            return String::new();
        };
        if instance.parent.is_none() {
            return format!("\n\n(found in {})", self.format_component_name(id));
        }

        let mut tree: Vec<(InstanceId, Cid, usize)> = Vec::new();
        let mut current = Some(id);
        while let Some(cursor) = current {
            let Ok(node) = self.instance(cursor) else {
                break;
            };
            let cid = node.definition.cid();
            match tree.last_mut() {
                Some((_, last, recursion)) if *last == cid => *recursion += 1,
                _ => tree.push((cursor, cid, 0)),
            }
            current = node.parent;
        }

        let lines: Vec<String> = tree
            .iter()
            .enumerate()
            .map(|(depth, (node, _, recursion))| {
                let indent = if depth == 0 {
                    "---> ".to_string()
                } else {
                    " ".repeat(5 + depth * 2)
                };
                let name = self.format_component_name(*node);
                if *recursion > 0 {
                    format!("{indent}{name}... ({recursion} recursive calls)")
                } else {
                    format!("{indent}{name}")
                }
            })
            .collect();
        format!("\n\nfound in\n\n{}", lines.join("\n"))
    }

    /// Report a development warning about `id` (or about no instance).
    pub fn warn(&self, id: Option<InstanceId>, message: impl Into<String>) {
        if !cfg!(debug_assertions) || self.config().silent {
            return;
        }
        let mut diagnostic = Diagnostic::new(message);
        if let Some(instance) = id.and_then(|id| self.instance(id).ok()) {
            diagnostic.uid = Some(instance.uid);
            diagnostic.component = Some(self.format_component_name(instance.id));
            diagnostic.trace = self.component_trace(instance.id);
        }
        self.diagnostics().warn(&diagnostic);
    }
}
