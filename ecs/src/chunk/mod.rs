//! Chunked structure-of-arrays storage for hot-path numeric components.
//!
//! Fixed-shape records (transforms, tints, and similar per-frame data) are
//! stored as parallel `f32` lanes partitioned into fixed-capacity chunks:
//!
//! ```text
//! Chunk 0                         Chunk 1
//! ┌──────────────────────────┐    ┌──────────────────────────┐
//! │ x:   [x0, x1, x2, ...]   │    │ x:   [...]               │
//! │ y:   [y0, y1, y2, ...]   │    │ y:   [...]               │
//! │ rot: [r0, r1, r2, ...]   │    │ rot: [...]               │
//! │ ids: [e0, e1, e2, ...]   │    │ ids: [...]               │
//! │ len: 3                   │    │ len: ...                 │
//! └──────────────────────────┘    └──────────────────────────┘
//! ```
//!
//! Systems iterate lanes directly via [`Store::for_each_chunk`] with no
//! per-entity indirection, which is the entire point of the layout. Slots
//! `[0, len)` are always valid and gap-free: removal swaps the last active
//! slot into the freed one across every lane and fixes the moved entity's
//! recorded location, so iteration order is unstable across mutations.
//!
//! Records that must stay slot-aligned compose as tuples: a
//! `Store<(Transform, Tint)>` keeps both in one slot group, so a single
//! swap-pop moves every co-resident field atomically and nothing has to
//! replicate someone else's swap bookkeeping.

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::{
    entity::Entity,
    error::{Error, Result},
};

/// Number of slots per chunk unless overridden.
pub const DEFAULT_CHUNK_CAPACITY: usize = 256;

/// A fixed-shape numeric record stored as parallel `f32` lanes.
///
/// Implementations write and read their scalar fields at a slot across a
/// lane slice of exactly [`Record::LANES`] lanes. Tuples of records
/// concatenate their lanes, giving co-located records one shared slot
/// group.
pub trait Record: Copy {
    /// Number of `f32` lanes this record occupies.
    const LANES: usize;

    /// Write this record's fields into `lanes[..Self::LANES]` at `slot`.
    fn write(&self, lanes: &mut [Box<[f32]>], slot: usize);

    /// Read a record back from `lanes[..Self::LANES]` at `slot`.
    fn read(lanes: &[Box<[f32]>], slot: usize) -> Self;
}

impl<A: Record, B: Record> Record for (A, B) {
    const LANES: usize = A::LANES + B::LANES;

    fn write(&self, lanes: &mut [Box<[f32]>], slot: usize) {
        let (a, b) = lanes.split_at_mut(A::LANES);
        self.0.write(a, slot);
        self.1.write(b, slot);
    }

    fn read(lanes: &[Box<[f32]>], slot: usize) -> Self {
        let (a, b) = lanes.split_at(A::LANES);
        (A::read(a, slot), B::read(b, slot))
    }
}

impl<A: Record, B: Record, C: Record> Record for (A, B, C) {
    const LANES: usize = A::LANES + B::LANES + C::LANES;

    fn write(&self, lanes: &mut [Box<[f32]>], slot: usize) {
        let (a, rest) = lanes.split_at_mut(A::LANES);
        let (b, c) = rest.split_at_mut(B::LANES);
        self.0.write(a, slot);
        self.1.write(b, slot);
        self.2.write(c, slot);
    }

    fn read(lanes: &[Box<[f32]>], slot: usize) -> Self {
        let (a, rest) = lanes.split_at(A::LANES);
        let (b, c) = rest.split_at(B::LANES);
        (A::read(a, slot), B::read(b, slot), C::read(c, slot))
    }
}

/// An entity's slot assignment inside a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    chunk: usize,
    slot: usize,
}

impl Location {
    /// Index of the chunk holding the entity.
    #[inline]
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Slot within the chunk.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// One fixed-capacity block of parallel lanes.
pub struct Chunk {
    lanes: Vec<Box<[f32]>>,

    /// Previous-value lanes for interpolation; empty unless the owning
    /// store was built with interpolation.
    shadow: Vec<Box<[f32]>>,

    /// Entity id per active slot. Its length is the chunk's active length.
    entities: Vec<Entity>,

    capacity: usize,
}

impl Chunk {
    fn new(lane_count: usize, shadowed: bool, capacity: usize) -> Self {
        let make_lanes = |count: usize| {
            (0..count)
                .map(|_| vec![0.0f32; capacity].into_boxed_slice())
                .collect()
        };
        Self {
            lanes: make_lanes(lane_count),
            shadow: if shadowed {
                make_lanes(lane_count)
            } else {
                Vec::new()
            },
            entities: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Raw lane slices. Only `[0, len)` of each lane is meaningful.
    #[inline]
    pub fn lanes(&self) -> &[Box<[f32]>] {
        &self.lanes
    }

    /// Previous-value lane slices; empty when interpolation is off.
    #[inline]
    pub fn shadow_lanes(&self) -> &[Box<[f32]>] {
        &self.shadow
    }

    /// Entity ids for the active slots, parallel to the lanes.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of active slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the chunk has no active slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The fixed slot capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn push(&mut self, entity: Entity) -> usize {
        debug_assert!(self.entities.len() < self.capacity, "chunk overfilled");
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Swap the last active slot into `slot` across every lane (shadow
    /// included) and shrink. Returns the entity now living at `slot`, or
    /// `None` if `slot` was the last one.
    fn swap_pop(&mut self, slot: usize) -> Option<Entity> {
        let last = self.entities.len() - 1;
        if slot < last {
            for lane in &mut self.lanes {
                lane[slot] = lane[last];
            }
            for lane in &mut self.shadow {
                lane[slot] = lane[last];
            }
        }
        self.entities.swap_remove(slot);
        self.entities.get(slot).copied()
    }
}

/// Chunked SoA store for one record type (or one tuple slot group).
///
/// Adds find the first chunk with spare capacity, allocating a fresh chunk
/// when none has room; growth is never an error. Removal is O(1) swap-pop.
/// Trailing chunks that empty out are released; interior chunks are kept
/// and refilled by later adds.
pub struct Store<R: Record> {
    chunks: Vec<Chunk>,
    locations: HashMap<Entity, Location>,
    chunk_capacity: usize,
    shadowed: bool,
    _marker: PhantomData<R>,
}

impl<R: Record> Default for Store<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Store<R> {
    /// Create a store with the default chunk capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_chunk_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// Create a store with a custom chunk capacity.
    pub fn with_chunk_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "chunk capacity must be non-zero");
        Self {
            chunks: Vec::new(),
            locations: HashMap::new(),
            chunk_capacity: capacity,
            shadowed: false,
            _marker: PhantomData,
        }
    }

    /// Enable previous-value shadow lanes for interpolation.
    ///
    /// Must be called before the first add.
    pub fn with_interpolation(mut self) -> Self {
        assert!(
            self.chunks.is_empty(),
            "interpolation must be enabled before the first add"
        );
        self.shadowed = true;
        self
    }

    /// Insert a record for an entity, allocating a chunk if none has room.
    pub fn add(&mut self, entity: Entity, value: R) -> Result<()> {
        if self.locations.contains_key(&entity) {
            return Err(Error::DuplicateEntity(entity));
        }

        let chunk_index = match self
            .chunks
            .iter()
            .position(|chunk| chunk.len() < self.chunk_capacity)
        {
            Some(index) => index,
            None => {
                self.chunks
                    .push(Chunk::new(R::LANES, self.shadowed, self.chunk_capacity));
                self.chunks.len() - 1
            }
        };

        let chunk = &mut self.chunks[chunk_index];
        let slot = chunk.push(entity);
        value.write(&mut chunk.lanes, slot);
        if self.shadowed {
            // Seed the shadow with the initial value so the first frame
            // interpolates from somewhere sane.
            value.write(&mut chunk.shadow, slot);
        }
        self.locations.insert(
            entity,
            Location {
                chunk: chunk_index,
                slot,
            },
        );
        Ok(())
    }

    /// Remove an entity's record, returning it.
    ///
    /// The freed slot is backfilled by the chunk's last active slot across
    /// every lane, and the moved entity's location is updated. `None` if
    /// the entity has no slot here.
    pub fn remove(&mut self, entity: Entity) -> Option<R> {
        let location = self.locations.remove(&entity)?;
        let chunk = &mut self.chunks[location.chunk];
        let value = R::read(&chunk.lanes, location.slot);
        if let Some(moved) = chunk.swap_pop(location.slot) {
            self.locations.insert(moved, location);
        }

        while self.chunks.last().is_some_and(Chunk::is_empty) {
            self.chunks.pop();
        }
        Some(value)
    }

    /// Overwrite an entity's record in place.
    pub fn update(&mut self, entity: Entity, value: R) -> Result<()> {
        let location = *self
            .locations
            .get(&entity)
            .ok_or(Error::UnknownEntity(entity))?;
        let chunk = &mut self.chunks[location.chunk];
        value.write(&mut chunk.lanes, location.slot);
        Ok(())
    }

    /// Read an entity's current record.
    pub fn get(&self, entity: Entity) -> Option<R> {
        let location = self.locations.get(&entity)?;
        Some(R::read(&self.chunks[location.chunk].lanes, location.slot))
    }

    /// Read an entity's previous-value record.
    ///
    /// `None` if the entity has no slot or interpolation is off.
    pub fn previous(&self, entity: Entity) -> Option<R> {
        if !self.shadowed {
            return None;
        }
        let location = self.locations.get(&entity)?;
        Some(R::read(&self.chunks[location.chunk].shadow, location.slot))
    }

    /// Copy every active slot's current lanes into the shadow lanes.
    ///
    /// Called once per frame before systems overwrite current values, so
    /// renderers can interpolate between the two.
    pub fn snapshot(&mut self) {
        if !self.shadowed {
            return;
        }
        for chunk in &mut self.chunks {
            let len = chunk.entities.len();
            for (lane, shadow) in chunk.lanes.iter().zip(chunk.shadow.iter_mut()) {
                shadow[..len].copy_from_slice(&lane[..len]);
            }
        }
    }

    /// Visit every non-empty chunk for bulk lane iteration.
    pub fn for_each_chunk(&self, mut f: impl FnMut(&Chunk)) {
        for chunk in &self.chunks {
            if !chunk.is_empty() {
                f(chunk);
            }
        }
    }

    /// The entity's slot assignment, if present.
    #[inline]
    pub fn location(&self, entity: Entity) -> Option<Location> {
        self.locations.get(&entity).copied()
    }

    /// Whether the entity has a slot here.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.locations.contains_key(&entity)
    }

    /// Total number of stored records.
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the store holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of allocated chunks, including interior empties.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Transform {
        x: f32,
        y: f32,
        rotation: f32,
    }

    impl Record for Transform {
        const LANES: usize = 3;

        fn write(&self, lanes: &mut [Box<[f32]>], slot: usize) {
            lanes[0][slot] = self.x;
            lanes[1][slot] = self.y;
            lanes[2][slot] = self.rotation;
        }

        fn read(lanes: &[Box<[f32]>], slot: usize) -> Self {
            Self {
                x: lanes[0][slot],
                y: lanes[1][slot],
                rotation: lanes[2][slot],
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Tint {
        r: f32,
        g: f32,
        b: f32,
        a: f32,
    }

    impl Record for Tint {
        const LANES: usize = 4;

        fn write(&self, lanes: &mut [Box<[f32]>], slot: usize) {
            lanes[0][slot] = self.r;
            lanes[1][slot] = self.g;
            lanes[2][slot] = self.b;
            lanes[3][slot] = self.a;
        }

        fn read(lanes: &[Box<[f32]>], slot: usize) -> Self {
            Self {
                r: lanes[0][slot],
                g: lanes[1][slot],
                b: lanes[2][slot],
                a: lanes[3][slot],
            }
        }
    }

    fn entity(value: u32) -> Entity {
        Entity::new(value)
    }

    fn transform(seed: f32) -> Transform {
        Transform {
            x: seed,
            y: seed * 2.0,
            rotation: seed * 0.5,
        }
    }

    #[test]
    fn third_add_allocates_a_second_chunk() {
        // Given - Chunks of capacity 2
        let mut store: Store<Transform> = Store::with_chunk_capacity(2);
        store.add(entity(1), transform(1.0)).unwrap();
        store.add(entity(2), transform(2.0)).unwrap();

        // When - The third add overflows into a fresh chunk, no error
        store.add(entity(3), transform(3.0)).unwrap();

        // Then
        assert_eq!(store.chunk_count(), 2);
        let mut lengths = Vec::new();
        store.for_each_chunk(|chunk| lengths.push(chunk.len()));
        assert_eq!(lengths, vec![2, 1]);
    }

    #[test]
    fn duplicate_add_is_rejected() {
        // Given
        let mut store: Store<Transform> = Store::new();
        store.add(entity(1), transform(1.0)).unwrap();

        // When
        let result = store.add(entity(1), transform(9.0));

        // Then - Original value untouched
        assert_eq!(result, Err(Error::DuplicateEntity(entity(1))));
        assert_eq!(store.get(entity(1)), Some(transform(1.0)));
    }

    #[test]
    fn remove_backfills_with_the_last_slot() {
        // Given
        let mut store: Store<Transform> = Store::with_chunk_capacity(4);
        store.add(entity(1), transform(1.0)).unwrap();
        store.add(entity(2), transform(2.0)).unwrap();
        store.add(entity(3), transform(3.0)).unwrap();

        // When - Removing from the middle
        let removed = store.remove(entity(1));

        // Then - Value returned, tail swapped in, locations consistent
        assert_eq!(removed, Some(transform(1.0)));
        assert_eq!(store.len(), 2);
        let moved = store.location(entity(3)).unwrap();
        assert_eq!(moved.slot(), 0);
        assert_eq!(store.get(entity(3)), Some(transform(3.0)));
        assert_eq!(store.get(entity(2)), Some(transform(2.0)));
        assert!(store.get(entity(1)).is_none());
    }

    #[test]
    fn update_overwrites_in_place() {
        // Given
        let mut store: Store<Transform> = Store::new();
        store.add(entity(1), transform(1.0)).unwrap();
        let slot_before = store.location(entity(1)).unwrap();

        // When
        store.update(entity(1), transform(7.0)).unwrap();

        // Then
        assert_eq!(store.get(entity(1)), Some(transform(7.0)));
        assert_eq!(store.location(entity(1)), Some(slot_before));

        // And - Updating an absent entity fails
        assert_eq!(
            store.update(entity(9), transform(0.0)),
            Err(Error::UnknownEntity(entity(9)))
        );
    }

    #[test]
    fn tuple_records_share_one_slot_group() {
        // Given - Transform and tint co-resident in one store
        let mut store: Store<(Transform, Tint)> = Store::with_chunk_capacity(4);
        let red = Tint {
            r: 1.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        };
        let blue = Tint {
            r: 0.0,
            g: 0.0,
            b: 1.0,
            a: 1.0,
        };
        store.add(entity(1), (transform(1.0), red)).unwrap();
        store.add(entity(2), (transform(2.0), blue)).unwrap();

        // When - One removal must move both halves of the survivor
        store.remove(entity(1));

        // Then
        let (moved_transform, moved_tint) = store.get(entity(2)).unwrap();
        assert_eq!(moved_transform, transform(2.0));
        assert_eq!(moved_tint, blue);
        assert_eq!(store.location(entity(2)).unwrap().slot(), 0);
    }

    #[test]
    fn shadow_lanes_follow_the_swap() {
        // Given - An interpolated store with a snapshot taken
        let mut store: Store<Transform> =
            Store::with_chunk_capacity(4).with_interpolation();
        store.add(entity(1), transform(1.0)).unwrap();
        store.add(entity(2), transform(2.0)).unwrap();
        store.add(entity(3), transform(3.0)).unwrap();
        store.snapshot();
        store.update(entity(3), transform(30.0)).unwrap();

        // When - Entity 3 is swapped into entity 1's freed slot
        store.remove(entity(1));

        // Then - Current and previous values both traveled with it
        assert_eq!(store.get(entity(3)), Some(transform(30.0)));
        assert_eq!(store.previous(entity(3)), Some(transform(3.0)));
    }

    #[test]
    fn previous_is_empty_without_interpolation() {
        // Given
        let mut store: Store<Transform> = Store::new();
        store.add(entity(1), transform(1.0)).unwrap();

        // When / Then
        assert!(store.previous(entity(1)).is_none());
    }

    #[test]
    fn trailing_empty_chunks_are_released() {
        // Given - Three entities across two chunks
        let mut store: Store<Transform> = Store::with_chunk_capacity(2);
        store.add(entity(1), transform(1.0)).unwrap();
        store.add(entity(2), transform(2.0)).unwrap();
        store.add(entity(3), transform(3.0)).unwrap();

        // When
        store.remove(entity(3));
        store.remove(entity(1));
        store.remove(entity(2));

        // Then
        assert_eq!(store.chunk_count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn interior_gaps_are_refilled_by_later_adds() {
        // Given - Chunk 0 has a free slot, chunk 1 is occupied
        let mut store: Store<Transform> = Store::with_chunk_capacity(2);
        store.add(entity(1), transform(1.0)).unwrap();
        store.add(entity(2), transform(2.0)).unwrap();
        store.add(entity(3), transform(3.0)).unwrap();
        store.remove(entity(1));

        // When
        store.add(entity(4), transform(4.0)).unwrap();

        // Then - The gap in chunk 0 is reused before any new allocation
        assert_eq!(store.chunk_count(), 2);
        assert_eq!(store.location(entity(4)).unwrap().chunk(), 0);
    }

    #[test]
    fn random_churn_keeps_slots_dense_and_mapped() {
        // Given
        let mut store: Store<Transform> = Store::with_chunk_capacity(8);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut live: Vec<Entity> = Vec::new();
        let mut next_id = 1u32;

        // When - Interleaved adds and removes
        for _ in 0..500 {
            if live.is_empty() || rng.gen_bool(0.6) {
                let e = entity(next_id);
                next_id += 1;
                store.add(e, transform(next_id as f32)).unwrap();
                live.push(e);
            } else {
                let e = live.swap_remove(rng.gen_range(0..live.len()));
                assert!(store.remove(e).is_some());
            }

            // Then - Every chunk is dense and within capacity, and every
            // active slot round-trips through the location map
            let mut seen = 0usize;
            store.for_each_chunk(|chunk| {
                assert!(chunk.len() <= chunk.capacity());
                seen += chunk.len();
                for entity in chunk.entities() {
                    assert!(live.contains(entity), "stale id {entity:?} in a slot");
                }
            });
            assert_eq!(seen, live.len());
            assert_eq!(store.len(), live.len());
            for e in &live {
                let location = store.location(*e).expect("live entity must have a slot");
                assert!(location.slot() < store.chunk_capacity);
            }
        }
    }
}
