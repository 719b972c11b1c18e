//! Constructor-option resolution across a definition chain.

use std::rc::{Rc, Weak};

use tracing::debug;
use verdant_core::{
    keys, Asset, AssetMap, ComponentRef, Definition, OptionSource, OptionValue, Options,
    OptionsCache,
};

use crate::merge::merge_options;
use crate::strategies::MergeStrategies;

/// The definition's options, re-merged if any ancestor's options changed
/// since this definition was last resolved.
///
/// Repeated calls with no ancestor change return the same `Rc`. Fields
/// attached to the definition after it was sealed survive re-resolution.
pub fn resolve_constructor_options(
    definition: &Rc<Definition>,
    strategies: &MergeStrategies,
) -> Rc<Options> {
    let Some(parent) = definition.parent() else {
        return definition.options();
    };
    let super_options = resolve_constructor_options(parent, strategies);

    let mut cache = definition.cache_mut();
    let unchanged = cache
        .super_options
        .as_ref()
        .is_some_and(|cached| Rc::ptr_eq(cached, &super_options));
    if unchanged {
        return Rc::clone(&cache.options);
    }

    debug!(cid = %definition.cid(), "ancestor options changed, re-resolving");
    let mut extend_options = std::mem::take(&mut cache.extend_options);
    if let Some(modified) = resolve_modified_options(&cache) {
        debug!(cid = %definition.cid(), fields = modified.len(), "folding late-modified fields");
        extend_options.extend_from(&modified);
    }

    let mut options = merge_options(&super_options, &extend_options, strategies, None);
    register_self(&mut options, Rc::downgrade(definition));
    let options = Rc::new(options);
    *cache = OptionsCache::sealed(Rc::clone(&options), Some(super_options), extend_options);
    options
}

/// Fields of the cached options that differ from the sealed snapshot.
pub fn resolve_modified_options(cache: &OptionsCache) -> Option<Options> {
    let modified: Options = cache
        .options
        .iter()
        .filter(|(key, value)| {
            cache
                .sealed_options
                .get(key)
                .map_or(true, |sealed| !sealed.same(value))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    (!modified.is_empty()).then_some(modified)
}

/// Register the definition in its own `components` registry under its
/// name, so a component can render itself recursively.
pub(crate) fn register_self(options: &mut Options, definition: Weak<Definition>) {
    let Some(name) = options.name().map(str::to_string) else {
        return;
    };
    let asset = Asset::Component(ComponentRef::Recursive(definition));
    match options.get_mut(keys::COMPONENTS) {
        Some(OptionValue::Assets(assets)) => {
            Rc::make_mut(assets).insert(name, asset);
        }
        _ => {
            let mut assets = AssetMap::new();
            assets.insert(name, asset);
            options.insert(keys::COMPONENTS, OptionValue::Assets(Rc::new(assets)));
        }
    }
}
