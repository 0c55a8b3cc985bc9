use std::collections::HashMap;

use log::warn;

use crate::{
    component::Mask,
    error::{Error, Result},
};

/// Default maximum number of distinct component types a registry accepts.
pub const DEFAULT_CAPACITY: usize = 64;

/// Identifier of a registered component type.
///
/// The wrapped value is the type's stable bit position inside a [`Mask`].
/// Positions are assigned on first registration, grow monotonically, and are
/// never reused, so an id stays valid for the life of its registry. The
/// ordering of positions carries no meaning beyond uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    #[inline]
    pub(crate) const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The bit position backing this id.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Metadata kept for a registered component type.
#[derive(Debug, Clone)]
pub struct Info {
    id: Id,
    name: String,
}

impl Info {
    /// The id assigned to this type.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// The name the type was registered under.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Registry mapping component-type names to stable bit indices.
///
/// The registry is an owned value injected into the APIs that need name
/// resolution. Worlds that must not share component ids simply own separate
/// registries; nothing here is process-global.
///
/// Capacity is fixed at construction so every [`Mask`] cut from this
/// registry spans the same number of machine words. Registration past the
/// capacity fails loudly with [`Error::CapacityExceeded`] rather than
/// growing masks behind the caller's back.
pub struct Registry {
    /// Map from registered name to its component id.
    by_name: HashMap<String, Id>,

    /// Info entries in id order. The dense index doubles as the id value.
    infos: Vec<Info>,

    /// Maximum number of distinct types, also the width of issued masks.
    capacity: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry with the default type capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a registry accepting at most `capacity` distinct types.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "registry capacity must be non-zero");
        Self {
            by_name: HashMap::new(),
            infos: Vec::new(),
            capacity,
        }
    }

    /// Register a component type name and get its bit index.
    ///
    /// Idempotent: registering a name that already exists returns the id it
    /// was first assigned. Registering a new name once the registry is full
    /// fails with [`Error::CapacityExceeded`].
    pub fn register(&mut self, name: &str) -> Result<Id> {
        if let Some(id) = self.by_name.get(name) {
            return Ok(*id);
        }

        if self.infos.len() >= self.capacity {
            warn!(
                "component registry full ({} types), rejecting `{name}`",
                self.capacity
            );
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let id = Id::new(self.infos.len() as u32);
        self.infos.push(Info {
            id,
            name: name.to_owned(),
        });
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Look up the id for a registered name.
    pub fn index_of(&self, name: &str) -> Result<Id> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownComponentType(name.to_owned()))
    }

    /// Reverse lookup from an id to its registered name, if any.
    #[inline]
    pub fn name_of(&self, id: Id) -> Option<&str> {
        self.infos.get(id.index()).map(Info::name)
    }

    /// Get the info entry for an id, if registered.
    #[inline]
    pub fn info(&self, id: Id) -> Option<&Info> {
        self.infos.get(id.index())
    }

    /// Number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether no types have been registered yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// The fixed type capacity, which is also the width of issued masks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create an empty mask sized to this registry.
    #[inline]
    pub fn empty_mask(&self) -> Mask {
        Mask::with_width(self.capacity)
    }

    /// Build a mask with the bits of the given registered names set.
    pub fn mask_of(&self, names: &[&str]) -> Result<Mask> {
        let mut mask = self.empty_mask();
        for name in names {
            mask.insert(self.index_of(name)?);
        }
        Ok(mask)
    }

    /// Resolve every set bit of a mask back to its registered name.
    ///
    /// Linear in registry size, which is small and stabilizes early; this is
    /// a diagnostics path, not a per-frame one.
    pub fn mask_to_names(&self, mask: &Mask) -> Vec<&str> {
        mask.ids().filter_map(|id| self.name_of(id)).collect()
    }
}
