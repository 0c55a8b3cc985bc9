//! Entity lifecycle, the archetype table and graph, and the superset-query
//! engine.
//!
//! # Architecture
//!
//! The manager owns four cooperating structures:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Manager                                                │
//! │                                                         │
//! │  Allocator          recycling free-list id source       │
//! │  locations          entity → current archetype mask     │
//! │  archetypes         mask → Archetype (members + edges)  │
//! │  cache              query mask → matched entity ids     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every live entity sits in exactly one archetype, the one whose mask
//! equals the union of its attached component bits. Component add/remove
//! changes the mask, which migrates the entity between archetype member
//! lists and keeps the single-bit neighbor edges wired on both sides.
//!
//! # Queries
//!
//! `query(mask)` answers "every entity whose mask is a superset of this
//! one". When an archetype with exactly the queried mask exists, a
//! stack-based walk follows addition edges outward from it; every edge adds
//! one bit, so each visited vertex stays a superset of the query and its
//! members are collected without a mask test. Archetypes the single-bit
//! graph cannot reach from the query vertex (their intermediate shapes were
//! never created, or were pruned after emptying) are picked up by a
//! superset scan over the unvisited remainder, so results are exact
//! regardless of graph connectivity. With no exact vertex at all, the scan
//! is the whole answer and a diagnostic is logged.
//!
//! Results are cached per mask. Structural mutations do not clear the
//! cache immediately; [`Manager::lazy_cleanup`] clears it once per frame
//! when anything changed, trading a brief stale-but-harmless window for
//! not paying an invalidation sweep on every mutation.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{
    archetype::Archetype,
    component::{self, Mask},
    entity::{Allocator, Entity},
    error::{Error, Result},
};

/// Entity lifecycle, archetype table, archetype graph, and query cache for
/// one world of entities.
pub struct Manager {
    /// Sole id source; destroyed ids are recycled from here.
    allocator: Allocator,

    /// Current archetype mask for every live entity.
    locations: HashMap<Entity, Mask>,

    /// All archetype vertices, keyed by their exact mask. Includes
    /// tombstoned vertices until the next cleanup pass.
    archetypes: HashMap<Mask, Archetype>,

    /// Query-result snapshots, cleared by `lazy_cleanup` when dirty.
    cache: HashMap<Mask, Vec<Entity>>,

    /// Masks tombstoned since the last cleanup pass.
    tombstones: Vec<Mask>,

    /// Set by any structural mutation since the last cleanup pass.
    dirty: bool,

    /// Mask width shared by every mask passing through this manager.
    width: usize,
}

impl Manager {
    /// Create a manager sized to the given registry's mask width.
    pub fn new(registry: &component::Registry) -> Self {
        Self {
            allocator: Allocator::new(),
            locations: HashMap::new(),
            archetypes: HashMap::new(),
            cache: HashMap::new(),
            tombstones: Vec::new(),
            dirty: false,
            width: registry.capacity(),
        }
    }

    /// Create an entity with an empty component mask.
    ///
    /// The empty archetype is created (and wired into the graph) on first
    /// use, then reused.
    pub fn create(&mut self) -> Entity {
        let entity = self.allocator.alloc();
        let mask = self.empty_mask();
        self.ensure_archetype(&mask);
        if let Some(archetype) = self.archetypes.get_mut(&mask) {
            archetype.insert(entity);
        }
        self.locations.insert(entity, mask);
        self.dirty = true;
        entity
    }

    /// Destroy an entity, recycling its id.
    ///
    /// Fails with [`Error::UnknownEntity`] on a dead or foreign id; a
    /// use-after-destroy is a caller bug this surfaces instead of hiding.
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        let mask = self
            .locations
            .remove(&entity)
            .ok_or(Error::UnknownEntity(entity))?;
        self.leave_archetype(entity, &mask);
        self.allocator.free(entity);
        self.dirty = true;
        Ok(())
    }

    /// Move an entity to a new archetype mask.
    ///
    /// Invoked whenever a component add or remove changes the entity's
    /// shape. The target archetype is created and wired if needed; the
    /// source is tombstoned if the entity was its last member.
    pub fn update(&mut self, entity: Entity, mask: Mask) -> Result<()> {
        debug_assert_eq!(
            mask.width(),
            self.width,
            "mask width does not match this manager's registry"
        );
        let Some(current) = self.locations.get(&entity) else {
            return Err(Error::UnknownEntity(entity));
        };
        if *current == mask {
            return Ok(());
        }

        let old = current.clone();
        self.leave_archetype(entity, &old);
        self.ensure_archetype(&mask);
        if let Some(archetype) = self.archetypes.get_mut(&mask) {
            archetype.insert(entity);
        }
        self.locations.insert(entity, mask);
        self.dirty = true;
        Ok(())
    }

    /// Set one component bit on an entity's mask and migrate it.
    pub fn attach(&mut self, entity: Entity, component: component::Id) -> Result<()> {
        let mask = self
            .locations
            .get(&entity)
            .ok_or(Error::UnknownEntity(entity))?
            .with(component);
        self.update(entity, mask)
    }

    /// Clear one component bit on an entity's mask and migrate it.
    pub fn detach(&mut self, entity: Entity, component: component::Id) -> Result<()> {
        let mask = self
            .locations
            .get(&entity)
            .ok_or(Error::UnknownEntity(entity))?
            .without(component);
        self.update(entity, mask)
    }

    /// All entities whose mask is a superset of the given mask.
    ///
    /// The returned slice is a cached snapshot; callers must treat it as
    /// read-only. Snapshots taken before a structural mutation remain
    /// served until the next [`Manager::lazy_cleanup`].
    pub fn query(&mut self, mask: &Mask) -> &[Entity] {
        if !self.cache.contains_key(mask) {
            let matched = self.collect(mask);
            self.cache.insert(mask.clone(), matched);
        }
        &self.cache[mask]
    }

    /// End-of-frame maintenance: prune tombstoned graph vertices and clear
    /// the query cache if any structural mutation happened since the last
    /// call.
    pub fn lazy_cleanup(&mut self) {
        if !self.tombstones.is_empty() {
            let tombstones = std::mem::take(&mut self.tombstones);
            let mut pruned = 0usize;
            for mask in tombstones {
                let prune = self
                    .archetypes
                    .get(&mask)
                    .is_some_and(|a| a.is_removed() && a.is_empty());
                if prune {
                    self.prune_archetype(&mask);
                    pruned += 1;
                }
            }
            if pruned > 0 {
                debug!("pruned {pruned} empty archetypes");
            }
        }

        if self.dirty {
            self.cache.clear();
            self.dirty = false;
        }
    }

    /// The current archetype mask of a live entity.
    #[inline]
    pub fn mask_of(&self, entity: Entity) -> Option<&Mask> {
        self.locations.get(&entity)
    }

    /// Whether the entity is alive in this manager.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.locations.contains_key(&entity)
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether no entities are alive.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of archetype vertices, tombstones included until pruning.
    #[inline]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Iterate every live entity with its current mask.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &Mask)> + '_ {
        self.locations.iter().map(|(entity, mask)| (*entity, mask))
    }

    /// An empty mask of this manager's width, for building query masks.
    #[inline]
    pub fn empty_mask(&self) -> Mask {
        Mask::with_width(self.width)
    }

    /// Remove an entity from the archetype its location points at,
    /// tombstoning the vertex if it empties.
    fn leave_archetype(&mut self, entity: Entity, mask: &Mask) {
        let Some(archetype) = self.archetypes.get_mut(mask) else {
            debug_assert!(false, "location points at a missing archetype");
            return;
        };
        let removed = archetype.remove(entity);
        debug_assert!(removed, "entity {entity:?} missing from its archetype");
        if archetype.is_empty() {
            archetype.mark_removed();
            self.tombstones.push(mask.clone());
        }
    }

    /// Create the archetype for a mask if absent, wiring graph edges to
    /// every present single-bit neighbor in both directions.
    ///
    /// The neighbor rescan is O(mask width) per new archetype; fine while
    /// registries stay small.
    fn ensure_archetype(&mut self, mask: &Mask) {
        if self.archetypes.contains_key(mask) {
            return;
        }

        let mut add_edges = Vec::new();
        let mut remove_edges = Vec::new();
        for bit in 0..self.width {
            let id = component::Id::new(bit as u32);
            if mask.contains(id) {
                let below = mask.without(id);
                if self.archetypes.contains_key(&below) {
                    remove_edges.push((bit, below));
                }
            } else {
                let above = mask.with(id);
                if self.archetypes.contains_key(&above) {
                    add_edges.push((bit, above));
                }
            }
        }

        let mut archetype = Archetype::new(mask.clone());
        for (bit, neighbor) in &add_edges {
            archetype.link_add(*bit, neighbor.clone());
        }
        for (bit, neighbor) in &remove_edges {
            archetype.link_remove(*bit, neighbor.clone());
        }
        self.archetypes.insert(mask.clone(), archetype);

        // Mirror every edge on its neighbor.
        for (bit, neighbor) in add_edges {
            if let Some(above) = self.archetypes.get_mut(&neighbor) {
                above.link_remove(bit, mask.clone());
            }
        }
        for (bit, neighbor) in remove_edges {
            if let Some(below) = self.archetypes.get_mut(&neighbor) {
                below.link_add(bit, mask.clone());
            }
        }
    }

    /// Delete a pruned vertex and unlink the mirrored edges its neighbors
    /// hold.
    fn prune_archetype(&mut self, mask: &Mask) {
        let Some(archetype) = self.archetypes.remove(mask) else {
            return;
        };
        for (bit, neighbor) in archetype.adds() {
            if let Some(above) = self.archetypes.get_mut(neighbor) {
                above.unlink_remove(*bit);
            }
        }
        for (bit, neighbor) in archetype.removes() {
            if let Some(below) = self.archetypes.get_mut(neighbor) {
                below.unlink_add(*bit);
            }
        }
    }

    /// Collect every entity whose mask is a superset of the query mask.
    fn collect(&self, mask: &Mask) -> Vec<Entity> {
        let mut matched = Vec::new();
        let mut visited: HashSet<Mask> = HashSet::new();

        if self.archetypes.contains_key(mask) {
            // Fast path: walk addition edges outward from the exact vertex.
            // Each edge adds one bit, so every visited vertex is a superset
            // of the query without needing a mask test.
            let mut stack = vec![mask.clone()];
            while let Some(current) = stack.pop() {
                if !visited.insert(current.clone()) {
                    continue;
                }
                let Some(archetype) = self.archetypes.get(&current) else {
                    debug_assert!(false, "graph edge points at a missing vertex");
                    continue;
                };
                matched.extend_from_slice(archetype.entities());
                for neighbor in archetype.adds().values() {
                    if !visited.contains(neighbor) {
                        stack.push(neighbor.clone());
                    }
                }
            }
        } else {
            debug!(
                "query mask has no exact archetype; scanning {} archetypes",
                self.archetypes.len()
            );
        }

        // Superset archetypes the single-bit walk cannot reach from the
        // query vertex (their intermediate shapes never existed, or were
        // pruned after emptying). Keeps results exact regardless of graph
        // connectivity.
        for (vertex, archetype) in &self.archetypes {
            if !visited.contains(vertex) && archetype.mask().contains_all(mask) {
                matched.extend_from_slice(archetype.entities());
            }
        }

        matched
    }
}
