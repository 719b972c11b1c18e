//! Mount entry point.

use tracing::debug;
use verdant_core::{keys, InstanceError, InstanceId, LifecycleHook, OptionSource, OptionValue};

use crate::runtime::{InstanceScope, Runtime};

/// Attaches an instance to a target.
pub trait Mounter {
    fn mount(&self, runtime: &mut Runtime, id: InstanceId, target: &str) -> Result<(), InstanceError>;
}

/// Runs the mount lifecycle without a platform: `before_mount`, one render
/// into the instance's render context, then `mounted`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleMounter;

impl Mounter for LifecycleMounter {
    fn mount(&self, runtime: &mut Runtime, id: InstanceId, target: &str) -> Result<(), InstanceError> {
        let instance = runtime.instance(id)?;
        if instance.lifecycle.is_mounted {
            return Err(InstanceError::Mount {
                instance: id,
                target: target.to_string(),
                reason: "instance is already mounted".to_string(),
            });
        }
        if matches!(target, "html" | "body") {
            return Err(InstanceError::Mount {
                instance: id,
                target: target.to_string(),
                reason: "mount to a normal element instead of <html> or <body>".to_string(),
            });
        }
        let render = match instance.config.option(keys::RENDER) {
            Some(OptionValue::Render(render)) => Some(render.clone()),
            _ => None,
        };
        if render.is_none() {
            runtime.warn(Some(id), "Failed to mount component: template or render function not defined.");
        }

        runtime.call_hook(id, LifecycleHook::BeforeMount)?;
        if let Some(render) = render {
            let scope = InstanceScope::new(runtime, id);
            let tree = render(&scope);
            runtime.instance_mut(id)?.render.vnode = Some(tree);
        }
        let instance = runtime.instance_mut(id)?;
        instance.lifecycle.is_mounted = true;
        instance.lifecycle.mounted_on = Some(target.to_string());
        debug!(instance = %id, target, "mounted");
        runtime.call_hook(id, LifecycleHook::Mounted)
    }
}

impl Runtime {
    /// Mount `id` on `target` through the configured [`Mounter`].
    pub fn mount(&mut self, id: InstanceId, target: &str) -> Result<(), InstanceError> {
        let mounter = self.mounter_handle();
        mounter.mount(self, id, target)
    }
}
