use std::hash::{Hash, Hasher};

use fixedbitset::FixedBitSet;

use crate::component;

/// Fixed-width set of component-type bits.
///
/// A mask's width is fixed at construction, normally to the owning
/// registry's capacity, so set operations touch a constant number of
/// machine words regardless of how many types end up registered. The value
/// held before the most recent mutation is retained, letting callers diff
/// an entity's shape across a change without bookkeeping of their own.
///
/// Equality and hashing consider only the current bits; two masks with the
/// same bits are the same archetype key no matter their mutation history.
#[derive(Debug, Clone)]
pub struct Mask {
    bits: FixedBitSet,
    previous: FixedBitSet,
}

impl Mask {
    /// Create an empty mask spanning `width` bits.
    pub fn with_width(width: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(width),
            previous: FixedBitSet::with_capacity(width),
        }
    }

    /// Set the bit for a component type.
    pub fn insert(&mut self, id: component::Id) {
        self.previous.clone_from(&self.bits);
        self.bits.insert(id.index());
    }

    /// Clear the bit for a component type.
    pub fn remove(&mut self, id: component::Id) {
        self.previous.clone_from(&self.bits);
        self.bits.set(id.index(), false);
    }

    /// Merge another mask's bits into this one.
    pub fn union_with(&mut self, other: &Mask) {
        self.previous.clone_from(&self.bits);
        self.bits.union_with(&other.bits);
    }

    /// Whether the bit for a component type is set.
    #[inline]
    pub fn contains(&self, id: component::Id) -> bool {
        self.bits.contains(id.index())
    }

    /// Whether every bit of `other` is also set here (`other ⊆ self`).
    #[inline]
    pub fn contains_all(&self, other: &Mask) -> bool {
        other.bits.is_subset(&self.bits)
    }

    /// Copy of this mask with one extra bit set. Does not count as a
    /// mutation of `self`.
    pub fn with(&self, id: component::Id) -> Mask {
        let mut next = self.clone();
        next.insert(id);
        next
    }

    /// Copy of this mask with one bit cleared. Does not count as a
    /// mutation of `self`.
    pub fn without(&self, id: component::Id) -> Mask {
        let mut next = self.clone();
        next.remove(id);
        next
    }

    /// The mask value before the most recent mutation.
    pub fn previous(&self) -> Mask {
        Mask {
            bits: self.previous.clone(),
            previous: self.previous.clone(),
        }
    }

    /// Iterate the ids of all set bits.
    pub fn ids(&self) -> impl Iterator<Item = component::Id> + '_ {
        self.bits.ones().map(|bit| component::Id::new(bit as u32))
    }

    /// Number of set bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Whether no bits are set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    /// The fixed width in bits.
    #[inline]
    pub fn width(&self) -> usize {
        self.bits.len()
    }
}

impl PartialEq for Mask {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for Mask {}

impl Hash for Mask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Id;

    #[test]
    fn insert_remove_round_trip() {
        // Given
        let mut mask = Mask::with_width(8);
        let position = Id::new(0);
        let velocity = Id::new(3);
        mask.insert(position);
        let before = mask.clone();

        // When
        mask.insert(velocity);
        mask.remove(velocity);

        // Then - Back to the pre-add value
        assert_eq!(mask, before);
        assert!(mask.contains(position));
        assert!(!mask.contains(velocity));
    }

    #[test]
    fn previous_tracks_last_mutation() {
        // Given
        let mut mask = Mask::with_width(8);
        let a = Id::new(1);
        let b = Id::new(2);
        mask.insert(a);

        // When
        mask.insert(b);

        // Then
        assert!(mask.previous().contains(a));
        assert!(!mask.previous().contains(b));
        assert!(mask.contains(b));
    }

    #[test]
    fn contains_all_is_superset_test() {
        // Given
        let mut query = Mask::with_width(8);
        query.insert(Id::new(0));
        query.insert(Id::new(2));

        let mut shape = Mask::with_width(8);
        shape.insert(Id::new(0));
        shape.insert(Id::new(1));
        shape.insert(Id::new(2));

        // Then
        assert!(shape.contains_all(&query));
        assert!(!query.contains_all(&shape));
    }

    #[test]
    fn equality_ignores_history() {
        // Given - Same bits reached along different mutation paths
        let mut left = Mask::with_width(8);
        left.insert(Id::new(0));

        let mut right = Mask::with_width(8);
        right.insert(Id::new(1));
        right.insert(Id::new(0));
        right.remove(Id::new(1));

        // Then
        assert_eq!(left, right);

        use std::hash::{DefaultHasher, Hash, Hasher};
        let mut h1 = DefaultHasher::new();
        left.hash(&mut h1);
        let mut h2 = DefaultHasher::new();
        right.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn with_and_without_leave_original_untouched() {
        // Given
        let mut mask = Mask::with_width(8);
        mask.insert(Id::new(4));

        // When
        let grown = mask.with(Id::new(5));
        let shrunk = mask.without(Id::new(4));

        // Then
        assert!(mask.contains(Id::new(4)));
        assert!(!mask.contains(Id::new(5)));
        assert!(grown.contains(Id::new(5)));
        assert!(shrunk.is_empty());
    }

    #[test]
    fn union_merges_bits_and_counts_as_a_mutation() {
        // Given
        let mut left = Mask::with_width(8);
        left.insert(Id::new(0));
        let mut right = Mask::with_width(8);
        right.insert(Id::new(2));

        // When
        left.union_with(&right);

        // Then
        assert!(left.contains(Id::new(0)));
        assert!(left.contains(Id::new(2)));
        assert!(!left.previous().contains(Id::new(2)));
    }

    #[test]
    fn ids_yields_set_bits() {
        // Given
        let mut mask = Mask::with_width(16);
        mask.insert(Id::new(3));
        mask.insert(Id::new(11));

        // When
        let ids: Vec<_> = mask.ids().map(|id| id.index()).collect();

        // Then
        assert_eq!(ids, vec![3, 11]);
        assert_eq!(mask.len(), 2);
    }
}
