//! Tree wiring and lifecycle hook dispatch.

use tracing::trace;
use verdant_core::{Hook, InstanceError, InstanceId, LifecycleHook, OptionSource};

use crate::runtime::{InstanceScope, Runtime};

/// Lifecycle flags of an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleState {
    pub is_mounted: bool,
    pub is_destroyed: bool,
    pub is_being_destroyed: bool,
    pub inactive: Option<bool>,
    pub direct_inactive: bool,
    /// Target the instance was mounted on.
    pub mounted_on: Option<String>,
}

impl Runtime {
    /// Attach `id` under its nearest non-abstract ancestor and reset its
    /// tree bookkeeping. Abstract instances are not registered as children.
    pub(crate) fn init_lifecycle(&mut self, id: InstanceId) -> Result<(), InstanceError> {
        let instance = self.instance(id)?;
        let is_abstract = instance.config.is_abstract();
        let mut parent = instance.config.parent;

        if let Some(requested) = parent {
            self.instance(requested)?;
        }
        if !is_abstract {
            while let Some(candidate) = parent {
                let candidate = self.instance(candidate)?;
                match (candidate.config.is_abstract(), candidate.parent) {
                    (true, Some(next)) => parent = Some(next),
                    _ => break,
                }
            }
            if let Some(parent) = parent {
                self.instance_mut(parent)?.children.push(id);
            }
        }

        let root = match parent {
            Some(parent) => self.instance(parent)?.root,
            None => id,
        };
        let instance = self.instance_mut(id)?;
        instance.parent = parent;
        instance.root = root;
        instance.children.clear();
        instance.refs.clear();
        instance.lifecycle = LifecycleState::default();
        Ok(())
    }

    /// Run every handler of `hook` in declared order, then emit
    /// `hook:<name>` when something subscribed to it.
    pub fn call_hook(&mut self, id: InstanceId, hook: LifecycleHook) -> Result<(), InstanceError> {
        let handlers: Vec<Hook> = self.instance(id)?.config.hooks(hook).to_vec();
        trace!(instance = %id, hook = hook.as_str(), handlers = handlers.len(), "call hook");
        for handler in &handlers {
            let mut scope = InstanceScope::new(self, id);
            handler(&mut scope).map_err(InstanceError::callback)?;
        }
        if self.instance(id)?.events.has_hook_event() {
            self.emit(id, &format!("hook:{}", hook.as_str()), &[])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::init::RootOptions;
    use crate::testing::{recording_runtime, Failure};
    use verdant_core::{Definition, Options};

    #[test]
    fn test_abstract_parents_are_skipped() {
        let (mut runtime, _sink) = recording_runtime();
        let base = Definition::root(Options::new());
        let wrapper = Definition::root(Options::new().with_abstract(true));

        let root = runtime.instantiate(&base, Options::new()).unwrap();
        let keep_alive = runtime
            .instantiate(&wrapper, RootOptions::new(Options::new()).with_parent(root))
            .unwrap();
        let child = runtime
            .instantiate(&base, RootOptions::new(Options::new()).with_parent(keep_alive))
            .unwrap();

        assert_eq!(runtime.instance(child).unwrap().parent, Some(root));
        assert_eq!(runtime.instance(root).unwrap().children, vec![child]);
        assert!(runtime.instance(keep_alive).unwrap().children.is_empty());
        assert_eq!(runtime.instance(child).unwrap().root, root);
        assert_eq!(runtime.instance(keep_alive).unwrap().parent, Some(root));
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let (mut runtime, _sink) = recording_runtime();
        let base = Definition::root(Options::new());
        let err = runtime
            .instantiate(&base, RootOptions::new(Options::new()).with_parent(InstanceId(42)))
            .unwrap_err();
        assert!(matches!(err, InstanceError::UnknownInstance(InstanceId(42))));
    }

    #[test]
    fn test_hooks_run_in_declared_order() {
        let (mut runtime, _sink) = recording_runtime();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&calls);
        let second = Rc::clone(&calls);
        let base = Definition::root(
            Options::new()
                .on(LifecycleHook::Created, move |_| {
                    first.borrow_mut().push(1);
                    Ok(())
                })
                .on(LifecycleHook::Created, move |_| {
                    second.borrow_mut().push(2);
                    Ok(())
                }),
        );
        runtime.instantiate(&base, Options::new()).unwrap();
        assert_eq!(*calls.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_hook_failure_propagates_unchanged() {
        let (mut runtime, _sink) = recording_runtime();
        let base = Definition::root(
            Options::new().on(LifecycleHook::BeforeCreate, |_| Err(Box::new(Failure("boom")))),
        );
        let err = runtime.instantiate(&base, Options::new()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(err.as_callback().unwrap().downcast_ref::<Failure>().is_some());
    }
}
