//! Component definitions and their resolved-options cache.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::options::{OptionSource, OptionValue, Options};
use crate::types::Cid;

/// Cached option snapshots owned by a [`Definition`].
///
/// Only the constructor-option resolver and the definition-building API
/// write to this cache.
#[derive(Debug, Clone)]
pub struct OptionsCache {
    /// Last resolved merge.
    pub options: Rc<Options>,
    /// The parent's resolved options at the time of the last merge. Held
    /// strongly so the pointer identity it is compared by is never reused.
    pub super_options: Option<Rc<Options>>,
    /// Shallow snapshot of `options` taken when the definition was sealed.
    pub sealed_options: Options,
    /// Raw fields the definition declared itself.
    pub extend_options: Options,
}

impl OptionsCache {
    /// A freshly sealed cache: `sealed_options` mirrors `options`.
    pub fn sealed(options: Rc<Options>, super_options: Option<Rc<Options>>, extend_options: Options) -> Self {
        let sealed_options = options.as_ref().clone();
        Self {
            options,
            super_options,
            sealed_options,
            extend_options,
        }
    }
}

/// A component "class": base options plus an optional parent it extends.
pub struct Definition {
    cid: Cid,
    parent: Option<Rc<Definition>>,
    cache: RefCell<OptionsCache>,
}

impl Definition {
    /// A definition with no parent, such as the runtime's base definition.
    pub fn root(options: Options) -> Rc<Self> {
        let options = Rc::new(options);
        Rc::new(Self {
            cid: Cid::next(),
            parent: None,
            cache: RefCell::new(OptionsCache::sealed(options, None, Options::new())),
        })
    }

    /// Assemble a definition from an already built cache.
    pub fn from_parts(parent: Option<Rc<Definition>>, cache: OptionsCache) -> Self {
        Self {
            cid: Cid::next(),
            parent,
            cache: RefCell::new(cache),
        }
    }

    pub fn cid(&self) -> Cid {
        self.cid
    }

    /// The definition this one extends.
    pub fn parent(&self) -> Option<&Rc<Definition>> {
        self.parent.as_ref()
    }

    /// Cached options, without checking ancestors for changes.
    pub fn options(&self) -> Rc<Options> {
        Rc::clone(&self.cache.borrow().options)
    }

    pub fn name(&self) -> Option<String> {
        self.cache.borrow().options.name().map(str::to_string)
    }

    pub fn cache(&self) -> Ref<'_, OptionsCache> {
        self.cache.borrow()
    }

    pub fn cache_mut(&self) -> RefMut<'_, OptionsCache> {
        self.cache.borrow_mut()
    }

    /// Attach a field directly to the cached options, after sealing.
    ///
    /// The record is updated in place when nothing else holds it; otherwise
    /// it is copied and the definition's options get a new identity.
    pub fn attach_option(&self, key: impl Into<String>, value: impl Into<OptionValue>) {
        let mut cache = self.cache.borrow_mut();
        Rc::make_mut(&mut cache.options).insert(key, value);
    }

    /// Number of definitions in the chain up to and including the root.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.parent.as_ref();
        while let Some(def) = current {
            depth += 1;
            current = def.parent.as_ref();
        }
        depth
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("cid", &self.cid)
            .field("name", &self.name())
            .field("parent", &self.parent.as_ref().map(|p| p.cid))
            .finish()
    }
}
