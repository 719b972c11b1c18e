//! Registry lookups.

use tracing::warn;
use verdant_core::{Asset, OptionSource};

/// `my-component` -> `myComponent`.
pub fn camelize(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut upper = false;
    for c in id.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// `myComponent` -> `MyComponent`.
pub fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Look up `id` in the `kind` registry: exact id first, then its camelized
/// and capitalized forms.
pub fn resolve_asset<'a, S>(source: &'a S, kind: &str, id: &str, warn_missing: bool) -> Option<&'a Asset>
where
    S: OptionSource + ?Sized,
{
    let assets = source.assets(kind)?;
    if let Some(asset) = assets.get(id) {
        return Some(asset);
    }
    let camelized = camelize(id);
    if let Some(asset) = assets.get(camelized.as_str()) {
        return Some(asset);
    }
    let found = assets.get(capitalize(&camelized).as_str());
    if found.is_none() && warn_missing && cfg!(debug_assertions) {
        let kind_name = kind.strip_suffix('s').unwrap_or(kind);
        warn!(kind = kind_name, id, "Failed to resolve {kind_name}: {id}");
    }
    found
}
