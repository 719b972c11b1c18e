//! Option merging and constructor-option resolution for Verdant components.
//!
//! - [`merge_options`] combines two option records field by field using a
//!   configurable [`MergeStrategies`] table
//! - [`resolve_constructor_options`] keeps a definition's merged options in
//!   sync with its ancestors, memoized by ancestor identity
//! - [`extend`], [`mixin`] and [`register_asset`] build and modify definitions
//! - [`resolve_asset`] looks up registry entries by tag

pub mod assets;
pub mod extend;
pub mod merge;
pub mod resolve;
pub mod strategies;

pub use assets::{camelize, capitalize, resolve_asset};
pub use extend::{extend, mixin, register_asset, validate_component_name};
pub use merge::merge_options;
pub use resolve::{resolve_constructor_options, resolve_modified_options};
pub use strategies::{CustomStrategy, MergeStrategies, Strategy};
