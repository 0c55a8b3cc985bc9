use std::any::Any;
use std::collections::HashMap;

use crate::{
    component,
    entity::Entity,
    error::{Error, Result},
};

/// Map-based component storage: one entity-keyed map per registered type.
///
/// This is the flexible, non-archetypal storage path. Values are boxed and
/// type-erased; readers downcast through the typed accessors. Component ids
/// are dense bit indices, so the outer table is a plain `Vec` indexed by
/// id, grown on demand.
///
/// Absent components on read paths are represented as `None`, never as an
/// error. The only insertion failure is re-adding a component the entity
/// already has in this store.
#[derive(Default)]
pub struct Store {
    maps: Vec<HashMap<Entity, Box<dyn Any>>>,
}

impl Store {
    /// Create an empty store.
    #[inline]
    pub fn new() -> Self {
        Self { maps: Vec::new() }
    }

    fn map(&self, component: component::Id) -> Option<&HashMap<Entity, Box<dyn Any>>> {
        self.maps.get(component.index())
    }

    fn map_mut(&mut self, component: component::Id) -> &mut HashMap<Entity, Box<dyn Any>> {
        let index = component.index();
        if index >= self.maps.len() {
            self.maps.resize_with(index + 1, HashMap::new);
        }
        &mut self.maps[index]
    }

    /// Insert a component value for an entity.
    ///
    /// Fails with [`Error::DuplicateEntity`] if the entity already has this
    /// component here; replacing a value is an explicit remove-then-insert.
    pub fn insert<T: Any>(
        &mut self,
        entity: Entity,
        component: component::Id,
        value: T,
    ) -> Result<()> {
        let map = self.map_mut(component);
        if map.contains_key(&entity) {
            return Err(Error::DuplicateEntity(entity));
        }
        map.insert(entity, Box::new(value));
        Ok(())
    }

    /// Remove an entity's component, returning the boxed value if present.
    ///
    /// Best-effort: removing a component the entity does not have is a
    /// no-op yielding `None`.
    pub fn remove(&mut self, entity: Entity, component: component::Id) -> Option<Box<dyn Any>> {
        self.maps.get_mut(component.index())?.remove(&entity)
    }

    /// Typed read of an entity's component.
    pub fn get<T: Any>(&self, entity: Entity, component: component::Id) -> Option<&T> {
        self.map(component)?.get(&entity)?.downcast_ref::<T>()
    }

    /// Typed mutable read of an entity's component.
    pub fn get_mut<T: Any>(&mut self, entity: Entity, component: component::Id) -> Option<&mut T> {
        self.maps
            .get_mut(component.index())?
            .get_mut(&entity)?
            .downcast_mut::<T>()
    }

    /// Whether the entity has this component in the store.
    pub fn contains(&self, entity: Entity, component: component::Id) -> bool {
        self.map(component)
            .is_some_and(|map| map.contains_key(&entity))
    }

    /// Iterate the entities currently holding a component.
    pub fn entities(&self, component: component::Id) -> impl Iterator<Item = Entity> + '_ {
        self.map(component)
            .into_iter()
            .flat_map(|map| map.keys().copied())
    }

    /// Number of entities holding a component.
    pub fn count(&self, component: component::Id) -> usize {
        self.map(component).map_or(0, HashMap::len)
    }

    /// Strip every component the entity owns, across all types.
    ///
    /// Used by cascading entity destruction.
    pub fn purge(&mut self, entity: Entity) {
        for map in &mut self.maps {
            map.remove(&entity);
        }
    }
}
