//! Core types for the Verdant component runtime.
//!
//! This crate provides the foundational types used across the other verdant crates:
//! - Dynamic values and option records with identity-aware field comparison
//! - Component definitions and their resolved-options cache
//! - Render nodes consumed during instantiation
//! - The callback and scope types user code is written against
//! - Error types

pub mod callback;
pub mod definition;
pub mod errors;
pub mod options;
pub mod scope;
pub mod types;
pub mod value;
pub mod vnode;

pub use callback::*;
pub use definition::*;
pub use errors::*;
pub use options::*;
pub use scope::*;
pub use types::*;
pub use value::*;
pub use vnode::*;
