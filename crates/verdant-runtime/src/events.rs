//! Per-instance event channel.

use smallvec::SmallVec;
use tracing::trace;
use verdant_core::{InstanceError, InstanceId, Listener, Listeners, Value};

use crate::runtime::Runtime;

const HOOK_EVENT_PREFIX: &str = "hook:";

/// Listeners attached to one instance.
#[derive(Debug, Clone, Default)]
pub struct EventChannel {
    listeners: Listeners,
    has_hook_event: bool,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `event`. Subscribing to a `hook:` event makes lifecycle
    /// dispatch emit it.
    pub fn on(&mut self, event: &str, listener: Listener) {
        if event.starts_with(HOOK_EVENT_PREFIX) {
            self.has_hook_event = true;
        }
        self.listeners.entry(event.to_string()).or_default().push(listener);
    }

    /// Remove one listener, or every listener of `event` when `listener` is `None`.
    pub fn off(&mut self, event: &str, listener: Option<&Listener>) {
        match listener {
            None => {
                self.listeners.shift_remove(event);
            }
            Some(target) => {
                if let Some(handlers) = self.listeners.get_mut(event) {
                    handlers.retain(|handler| !handler.ptr_eq(target));
                }
            }
        }
    }

    /// Snapshot of the handlers of `event`, so they can run while the
    /// channel is borrowed elsewhere.
    pub fn listeners(&self, event: &str) -> SmallVec<[Listener; 1]> {
        self.listeners.get(event).cloned().unwrap_or_default()
    }

    pub fn has_hook_event(&self) -> bool {
        self.has_hook_event
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.values().all(SmallVec::is_empty)
    }
}

impl Runtime {
    /// Install the listeners the parent attached as initial subscriptions.
    pub(crate) fn init_events(&mut self, id: InstanceId) -> Result<(), InstanceError> {
        let instance = self.instance_mut(id)?;
        let mut events = EventChannel::new();
        if let Some(listeners) = &instance.config.listeners {
            for (event, handlers) in listeners.iter() {
                for handler in handlers {
                    events.on(event, handler.clone());
                }
            }
        }
        instance.events = events;
        Ok(())
    }

    pub fn on(&mut self, id: InstanceId, event: &str, listener: Listener) -> Result<(), InstanceError> {
        self.instance_mut(id)?.events.on(event, listener);
        Ok(())
    }

    pub fn emit(&mut self, id: InstanceId, event: &str, args: &[Value]) -> Result<(), InstanceError> {
        let events = &self.instance(id)?.events;
        let handlers = events.listeners(event);
        if handlers.is_empty() {
            let lowered = event.to_lowercase();
            if lowered != event && !events.listeners(&lowered).is_empty() {
                self.warn(
                    Some(id),
                    format!(
                        "Event \"{lowered}\" is emitted in component {} but the handler is registered for \"{event}\". Event names are case sensitive.",
                        self.format_component_name(id)
                    ),
                );
            }
            return Ok(());
        }
        trace!(instance = %id, event, handlers = handlers.len(), "emit");
        for handler in &handlers {
            handler(args);
        }
        Ok(())
    }
}
