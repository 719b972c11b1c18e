//! Error types for the Verdant runtime.

use crate::types::InstanceId;
use thiserror::Error;

/// Error type returned by user callbacks (hooks, data factories, producers).
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Top-level error type for the Verdant runtime.
#[derive(Debug, Error)]
pub enum VerdantError {
    #[error(transparent)]
    Instance(#[from] InstanceError),
}

/// Errors during instance construction and mounting.
#[derive(Debug, Error)]
pub enum InstanceError {
    /// A user-supplied hook, initializer, default or provide producer failed.
    #[error(transparent)]
    Callback(BoxError),

    #[error("Unknown instance {0}")]
    UnknownInstance(InstanceId),

    #[error("Instance {instance} has no method \"{method}\"")]
    UnknownMethod { instance: InstanceId, method: String },

    #[error("Render node <{tag}> carries no component options")]
    NotAComponentNode { tag: String },

    #[error("Cannot mount instance {instance} on '{target}': {reason}")]
    Mount {
        instance: InstanceId,
        target: String,
        reason: String,
    },
}

impl InstanceError {
    /// Wrap a callback failure without altering it.
    pub fn callback(err: BoxError) -> Self {
        InstanceError::Callback(err)
    }

    /// The user error, when this failure came out of a callback.
    pub fn as_callback(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstanceError::Callback(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Convert back into the error type callbacks return. Callback failures
    /// are unwrapped so user errors cross nested calls unchanged.
    pub fn into_boxed(self) -> BoxError {
        match self {
            InstanceError::Callback(err) => err,
            other => Box::new(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("hook exploded")]
    struct Exploded;

    #[test]
    fn test_callback_error_is_transparent() {
        let err = InstanceError::callback(Box::new(Exploded));
        assert_eq!(err.to_string(), "hook exploded");
        assert!(err.as_callback().unwrap().downcast_ref::<Exploded>().is_some());
    }

    #[test]
    fn test_into_boxed_unwraps_callback_errors() {
        let boxed = InstanceError::callback(Box::new(Exploded)).into_boxed();
        assert!(boxed.downcast_ref::<Exploded>().is_some());

        let boxed = InstanceError::UnknownInstance(InstanceId(1)).into_boxed();
        assert!(boxed.downcast_ref::<InstanceError>().is_some());
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: VerdantError = InstanceError::UnknownInstance(InstanceId(7)).into();
        assert_eq!(err.to_string(), "Unknown instance #7");
    }
}
