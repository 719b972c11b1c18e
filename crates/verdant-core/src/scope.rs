//! The view of an instance that user callbacks receive.

use crate::errors::BoxError;
use crate::types::{InstanceId, Uid};
use crate::value::Value;

/// Access to the instance a hook, factory or method runs against.
///
/// Reads go through the instance's reactive properties (props, data,
/// computed values, injections); writes go through the same setter path as
/// any other mutation, diagnostics included.
pub trait Scope {
    fn uid(&self) -> Uid;

    fn id(&self) -> InstanceId;

    /// Registered component name, if any.
    fn name(&self) -> Option<&str>;

    fn get(&self, key: &str) -> Option<&Value>;

    fn set(&mut self, key: &str, value: Value);

    /// Invoke a method declared in the `methods` option.
    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, BoxError>;

    /// Emit an event to the listeners attached by the parent.
    fn emit(&mut self, event: &str, args: &[Value]);
}
