use std::fmt;
use std::hash::Hash;

use smol_str::SmolStr;

/// Opaque identifier for a class, field, method or local variable.
///
/// Entities are minted by the mapping/resolution layer; the index only stores,
/// compares and hashes them.
pub trait Entity: Clone + Eq + Ord + Hash + fmt::Debug {}

impl<T> Entity for T where T: Clone + Eq + Ord + Hash + fmt::Debug {}

/// One occurrence of an entity in source.
///
/// `context` is the entity whose body contains a use site and is `None` at the
/// declaration site. `name` is the text observed at the site, which can differ
/// from the entity's canonical name in decompiled output. Two references are
/// equal only if all three parts are.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryReference<E> {
    pub entry: E,
    pub context: Option<E>,
    pub name: SmolStr,
}

impl<E> EntryReference<E> {
    pub fn declaration(entry: E, name: impl Into<SmolStr>) -> Self {
        Self {
            entry,
            context: None,
            name: name.into(),
        }
    }

    pub fn new(entry: E, context: E, name: impl Into<SmolStr>) -> Self {
        Self {
            entry,
            context: Some(context),
            name: name.into(),
        }
    }

    #[inline]
    pub fn is_declaration(&self) -> bool {
        self.context.is_none()
    }
}

impl<E: fmt::Display> fmt::Display for EntryReference<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} ({:?}) in {}", self.entry, self.name.as_str(), context),
            None => write!(f, "{} ({:?})", self.entry, self.name.as_str()),
        }
    }
}
