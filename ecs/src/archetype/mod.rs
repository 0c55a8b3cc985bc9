//! Archetype records: the live set of entities sharing one component mask,
//! plus the single-bit neighbor edges forming the archetype graph.

use std::collections::HashMap;

use crate::{component, entity::Entity};

/// A group of entities sharing the exact same component mask.
///
/// Membership uses swap-remove backed by an entity → slot map, so insert
/// and remove are O(1) and the entity list stays gap-free. Order within the
/// list is unstable across removals.
///
/// Each archetype carries its outgoing graph edges: for a bit `c`, an
/// addition edge points at the live archetype whose mask is this one with
/// `c` set, and a removal edge at the one with `c` cleared. Edges exist
/// only between live vertices; the [`Manager`](crate::entity::Manager)
/// wires them when an archetype is created and unwires them when a pruned
/// neighbor goes away.
pub struct Archetype {
    mask: component::Mask,

    /// Live members, gap-free.
    entities: Vec<Entity>,

    /// Member → position in `entities`.
    slots: HashMap<Entity, usize>,

    /// Addition edges: bit index → neighbor mask with that bit set.
    adds: HashMap<usize, component::Mask>,

    /// Removal edges: bit index → neighbor mask with that bit cleared.
    removes: HashMap<usize, component::Mask>,

    /// Tombstone flag, set when the archetype empties. A tombstoned vertex
    /// stays traversable until the next cleanup pass prunes it, and is
    /// revived in place if the mask comes back before then.
    removed: bool,
}

impl Archetype {
    pub(crate) fn new(mask: component::Mask) -> Self {
        Self {
            mask,
            entities: Vec::new(),
            slots: HashMap::new(),
            adds: HashMap::new(),
            removes: HashMap::new(),
            removed: false,
        }
    }

    /// The exact component mask shared by every member.
    #[inline]
    pub fn mask(&self) -> &component::Mask {
        &self.mask
    }

    /// The live members. Gap-free; order is unstable across removals.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of live members.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the archetype has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether the entity is a member.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.slots.contains_key(&entity)
    }

    pub(crate) fn insert(&mut self, entity: Entity) {
        debug_assert!(
            !self.contains(entity),
            "entity {entity:?} inserted into its archetype twice"
        );
        self.slots.insert(entity, self.entities.len());
        self.entities.push(entity);
        self.removed = false;
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slots.remove(&entity) else {
            return false;
        };
        self.entities.swap_remove(slot);
        if let Some(moved) = self.entities.get(slot) {
            self.slots.insert(*moved, slot);
        }
        true
    }

    pub(crate) fn adds(&self) -> &HashMap<usize, component::Mask> {
        &self.adds
    }

    pub(crate) fn removes(&self) -> &HashMap<usize, component::Mask> {
        &self.removes
    }

    pub(crate) fn link_add(&mut self, bit: usize, neighbor: component::Mask) {
        self.adds.insert(bit, neighbor);
    }

    pub(crate) fn link_remove(&mut self, bit: usize, neighbor: component::Mask) {
        self.removes.insert(bit, neighbor);
    }

    pub(crate) fn unlink_add(&mut self, bit: usize) {
        self.adds.remove(&bit);
    }

    pub(crate) fn unlink_remove(&mut self, bit: usize) {
        self.removes.remove(&bit);
    }

    pub(crate) fn mark_removed(&mut self) {
        self.removed = true;
    }

    pub(crate) fn is_removed(&self) -> bool {
        self.removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Mask;

    fn entity(value: u32) -> Entity {
        Entity::new(value)
    }

    #[test]
    fn membership_survives_swap_remove() {
        // Given
        let mut archetype = Archetype::new(Mask::with_width(8));
        archetype.insert(entity(1));
        archetype.insert(entity(2));
        archetype.insert(entity(3));

        // When - Removing from the middle swaps the tail in
        let removed = archetype.remove(entity(1));

        // Then
        assert!(removed);
        assert_eq!(archetype.len(), 2);
        assert!(!archetype.contains(entity(1)));
        assert!(archetype.contains(entity(2)));
        assert!(archetype.contains(entity(3)));

        // And - The moved member is still removable through its new slot
        assert!(archetype.remove(entity(3)));
        assert_eq!(archetype.entities(), &[entity(2)]);
    }

    #[test]
    fn remove_of_non_member_is_false() {
        // Given
        let mut archetype = Archetype::new(Mask::with_width(8));
        archetype.insert(entity(1));

        // When / Then
        assert!(!archetype.remove(entity(9)));
        assert_eq!(archetype.len(), 1);
    }

    #[test]
    fn insert_revives_a_tombstone() {
        // Given
        let mut archetype = Archetype::new(Mask::with_width(8));
        archetype.insert(entity(1));
        archetype.remove(entity(1));
        archetype.mark_removed();

        // When
        archetype.insert(entity(2));

        // Then
        assert!(!archetype.is_removed());
    }
}
