//! Shared, identity-comparable callbacks stored in option records.
//!
//! Every user function that can appear in an option record is wrapped in a
//! [`Callback`]: cloning shares the allocation, and [`Callback::ptr_eq`] is the
//! identity test used when hook lists are deduplicated and when the resolver
//! looks for fields modified after a definition was sealed.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::errors::BoxError;
use crate::scope::Scope;
use crate::value::{Value, ValueMap};
use crate::vnode::VNode;

/// A reference-counted callback compared by identity.
pub struct Callback<F: ?Sized>(Rc<F>);

impl<F: ?Sized> Callback<F> {
    /// Wrap an already shared function.
    pub fn from_rc(f: Rc<F>) -> Self {
        Callback(f)
    }

    /// Whether both handles point at the same function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Callback(Rc::clone(&self.0))
    }
}

impl<F: ?Sized> Deref for Callback<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.0
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0))
    }
}

/// Lifecycle hook handler.
pub type Hook = Callback<dyn Fn(&mut dyn Scope) -> Result<(), BoxError>>;

/// Factory producing a map of values (`data`, `provide`).
pub type DataFn = Callback<dyn Fn(&dyn Scope) -> Result<ValueMap, BoxError>>;

/// Producer of a single value (computed getters, injection defaults).
pub type ValueFn = Callback<dyn Fn(&dyn Scope) -> Result<Value, BoxError>>;

/// Instance method.
pub type MethodFn = Callback<dyn Fn(&mut dyn Scope, &[Value]) -> Result<Value, BoxError>>;

/// Watcher invoked with `(new, old)` after a property changes.
pub type WatchFn = Callback<dyn Fn(&Value, &Value)>;

/// Event listener.
pub type Listener = Callback<dyn Fn(&[Value])>;

/// Registered filter.
pub type FilterFn = Callback<dyn Fn(&[Value]) -> Value>;

/// Render function producing the instance's node tree.
pub type RenderFn = Callback<dyn Fn(&dyn Scope) -> VNode>;

/// Scoped slot accessor.
pub type ScopedSlotFn = Callback<dyn Fn(&ValueMap) -> Vec<VNode>>;

impl Hook {
    pub fn new(f: impl Fn(&mut dyn Scope) -> Result<(), BoxError> + 'static) -> Self {
        Callback(Rc::new(f))
    }
}

impl DataFn {
    pub fn new(f: impl Fn(&dyn Scope) -> Result<ValueMap, BoxError> + 'static) -> Self {
        Callback(Rc::new(f))
    }
}

impl ValueFn {
    pub fn new(f: impl Fn(&dyn Scope) -> Result<Value, BoxError> + 'static) -> Self {
        Callback(Rc::new(f))
    }
}

impl MethodFn {
    pub fn new(f: impl Fn(&mut dyn Scope, &[Value]) -> Result<Value, BoxError> + 'static) -> Self {
        Callback(Rc::new(f))
    }
}

impl WatchFn {
    pub fn new(f: impl Fn(&Value, &Value) + 'static) -> Self {
        Callback(Rc::new(f))
    }
}

impl Listener {
    pub fn new(f: impl Fn(&[Value]) + 'static) -> Self {
        Callback(Rc::new(f))
    }
}

impl FilterFn {
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Callback(Rc::new(f))
    }
}

impl RenderFn {
    pub fn new(f: impl Fn(&dyn Scope) -> VNode + 'static) -> Self {
        Callback(Rc::new(f))
    }
}

impl ScopedSlotFn {
    pub fn new(f: impl Fn(&ValueMap) -> Vec<VNode> + 'static) -> Self {
        Callback(Rc::new(f))
    }
}
