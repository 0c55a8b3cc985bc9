//! Layer storage: entity lifecycle, per-type component maps, and the
//! scene hierarchy behind one façade.
//!
//! This is the flexible storage path. It has no archetype acceleration;
//! batch queries intersect per-component entity sets directly, which is
//! plenty for layers holding UI and scene structure rather than thousands
//! of hot entities. Each layer owns its own `Storage`, its own id space,
//! and its own hierarchy tree; the component registry is shared and passed
//! in where names need resolving.

mod tree;

use std::any::Any;
use std::collections::HashSet;

pub use tree::Tree;

use crate::{
    component,
    entity::{Allocator, Entity},
    error::{Error, Result},
};

/// Entity lifecycle + component maps + hierarchy for one layer.
pub struct Storage {
    allocator: Allocator,
    live: HashSet<Entity>,
    components: component::Store,
    tree: Tree,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    /// Create an empty layer store.
    pub fn new() -> Self {
        Self {
            allocator: Allocator::new(),
            live: HashSet::new(),
            components: component::Store::new(),
            tree: Tree::new(),
        }
    }

    /// Create an entity with no components, parented to the root.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.alloc();
        self.live.insert(entity);
        self.tree.insert(entity);
        entity
    }

    /// Destroy an entity.
    ///
    /// Cascades: strips the entity from every component map and removes
    /// its tree node, re-parenting any children to the root. The id goes
    /// back to the free list for reuse.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<()> {
        if !self.live.contains(&entity) {
            return Err(Error::UnknownEntity(entity));
        }
        // The tree check runs first so a table/tree desync aborts before
        // any partial mutation lands.
        self.tree.remove(entity)?;
        self.live.remove(&entity);
        self.components.purge(entity);
        self.allocator.free(entity);
        Ok(())
    }

    /// Attach a component value to a live entity.
    pub fn add_component<T: Any>(
        &mut self,
        entity: Entity,
        component: component::Id,
        value: T,
    ) -> Result<()> {
        if !self.live.contains(&entity) {
            return Err(Error::UnknownEntity(entity));
        }
        self.components.insert(entity, component, value)
    }

    /// Detach a component, returning its boxed value if the entity had it.
    ///
    /// Best-effort: absent component (or dead entity) is a no-op `None`.
    pub fn remove_component(
        &mut self,
        entity: Entity,
        component: component::Id,
    ) -> Option<Box<dyn Any>> {
        self.components.remove(entity, component)
    }

    /// Typed read of an entity's component.
    pub fn get<T: Any>(&self, entity: Entity, component: component::Id) -> Option<&T> {
        self.components.get(entity, component)
    }

    /// Typed mutable read of an entity's component.
    pub fn get_mut<T: Any>(&mut self, entity: Entity, component: component::Id) -> Option<&mut T> {
        self.components.get_mut(entity, component)
    }

    /// Whether a live entity has the component.
    pub fn has(&self, entity: Entity, component: component::Id) -> bool {
        self.components.contains(entity, component)
    }

    /// Whether the entity is alive in this layer.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live.contains(&entity)
    }

    /// Number of live entities in this layer.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether the layer is empty.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// All entities holding every named component and none of the excluded
    /// ones.
    ///
    /// Intersects the per-component entity sets starting from the smallest
    /// to minimize membership tests, then filters out entities owning any
    /// excluded component. An empty `names` list yields an empty batch.
    pub fn entity_batch(
        &self,
        names: &[&str],
        exclude: &[&str],
        registry: &component::Registry,
    ) -> Result<Vec<Entity>> {
        let mut include = Vec::with_capacity(names.len());
        for name in names {
            include.push(registry.index_of(name)?);
        }
        let mut excluded = Vec::with_capacity(exclude.len());
        for name in exclude {
            excluded.push(registry.index_of(name)?);
        }
        // Smallest set first: every candidate has to pass a membership
        // test against each remaining set anyway.
        include.sort_by_key(|id| self.components.count(*id));
        let Some((first, rest)) = include.split_first() else {
            return Ok(Vec::new());
        };

        let matched = self
            .components
            .entities(*first)
            .filter(|entity| rest.iter().all(|id| self.components.contains(*entity, *id)))
            .filter(|entity| {
                !excluded
                    .iter()
                    .any(|id| self.components.contains(*entity, *id))
            })
            .collect();
        Ok(matched)
    }

    /// Re-parent `child` under `parent` in this layer's hierarchy.
    pub fn link_entity(&mut self, child: Entity, parent: Entity) -> Result<()> {
        if !self.live.contains(&child) {
            return Err(Error::UnknownEntity(child));
        }
        if parent != Entity::ROOT && !self.live.contains(&parent) {
            return Err(Error::UnknownEntity(parent));
        }
        self.tree.link(child, parent)
    }

    /// Return `child` to the root of this layer's hierarchy.
    pub fn unlink_entity(&mut self, child: Entity) -> Result<()> {
        if !self.live.contains(&child) {
            return Err(Error::UnknownEntity(child));
        }
        self.tree.unlink(child)
    }

    /// The parent of an entity; `None` for the root.
    pub fn parent_of(&self, entity: Entity) -> Option<Entity> {
        self.tree.parent(entity)
    }

    /// The direct children of an entity (or of [`Entity::ROOT`]).
    pub fn children_of(&self, entity: Entity) -> &[Entity] {
        self.tree.children(entity)
    }
}
