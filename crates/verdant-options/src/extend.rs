//! Definition-building API: extension, global mixins, asset registration.

use std::rc::Rc;

use tracing::{debug, warn};
use verdant_core::{keys, Asset, AssetMap, Definition, OptionSource, OptionValue, Options, OptionsCache};

use crate::merge::merge_options;
use crate::resolve::{register_self, resolve_constructor_options};
use crate::strategies::MergeStrategies;

/// Tags a component may not be registered under.
const RESERVED_TAGS: [&str; 2] = ["slot", "component"];

/// Create a definition extending `base` with `extend_options`.
///
/// The new definition is sealed immediately and, when it carries a name,
/// registered in its own `components` registry.
pub fn extend(base: &Rc<Definition>, extend_options: Options, strategies: &MergeStrategies) -> Rc<Definition> {
    let super_options = resolve_constructor_options(base, strategies);
    if let Some(name) = extend_options.name().or_else(|| super_options.name()) {
        validate_component_name(name);
    }

    let definition = Rc::new_cyclic(|this| {
        let mut options = merge_options(&super_options, &extend_options, strategies, None);
        register_self(&mut options, this.clone());
        Definition::from_parts(
            Some(Rc::clone(base)),
            OptionsCache::sealed(Rc::new(options), Some(super_options), extend_options),
        )
    });
    debug!(cid = %definition.cid(), parent = %base.cid(), "extended definition");
    definition
}

/// Merge `mixin` into the definition's options. The options get a new
/// identity, which invalidates every descendant's cached resolution.
pub fn mixin(definition: &Rc<Definition>, mixin: Options, strategies: &MergeStrategies) {
    let mut cache = definition.cache_mut();
    let merged = merge_options(&cache.options, &mixin, strategies, None);
    cache.options = Rc::new(merged);
    debug!(cid = %definition.cid(), "applied global mixin");
}

/// Register an asset on the definition's `kind` registry in place.
pub fn register_asset(definition: &Rc<Definition>, kind: &str, id: impl Into<String>, asset: Asset) {
    let id = id.into();
    if kind == keys::COMPONENTS {
        validate_component_name(&id);
    }
    let mut cache = definition.cache_mut();
    let options = Rc::make_mut(&mut cache.options);
    match options.get_mut(kind) {
        Some(OptionValue::Assets(assets)) => {
            Rc::make_mut(assets).insert(id, asset);
        }
        _ => {
            let mut assets = AssetMap::new();
            assets.insert(id, asset);
            options.insert(kind, OptionValue::Assets(Rc::new(assets)));
        }
    }
}

/// Warn about component names that cannot be used as tags. Returns whether
/// the name is acceptable.
pub fn validate_component_name(name: &str) -> bool {
    let mut chars = name.chars();
    let well_formed = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    if !well_formed {
        if cfg!(debug_assertions) {
            warn!(
                component = name,
                "Invalid component name: \"{name}\". Component names should start with a letter and contain only letters, digits, '-' and '_'."
            );
        }
        return false;
    }
    if RESERVED_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name)) {
        if cfg!(debug_assertions) {
            warn!(component = name, "Do not use reserved tag \"{name}\" as component id");
        }
        return false;
    }
    true
}
