//! World builders producing populated stores for the benches.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use strata_ecs::{ChunkedStore, Entity, EntityManager, Registry};

use crate::records::Transform;

/// The component names every scenario registers, in bit order.
pub const COMPONENT_NAMES: [&str; 6] = [
    "Transform", "Velocity", "Sprite", "Health", "Collider", "Input",
];

/// A registry with the scenario component set registered.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    for name in COMPONENT_NAMES {
        registry.register(name).expect("registry capacity");
    }
    registry
}

/// A manager populated with `count` entities spread across a handful of
/// realistic shapes: everything has a transform, most things draw, some
/// move, a few take input.
pub fn populated_manager(registry: &Registry, count: usize) -> (EntityManager, Vec<Entity>) {
    let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);
    let ids: Vec<_> = COMPONENT_NAMES
        .iter()
        .map(|name| registry.index_of(name).expect("registered"))
        .collect();

    let mut manager = EntityManager::new(registry);
    let mut entities = Vec::with_capacity(count);
    for _ in 0..count {
        let entity = manager.create();
        manager.attach(entity, ids[0]).expect("alive");
        if rng.gen_bool(0.8) {
            manager.attach(entity, ids[2]).expect("alive");
        }
        if rng.gen_bool(0.5) {
            manager.attach(entity, ids[1]).expect("alive");
        }
        if rng.gen_bool(0.3) {
            manager.attach(entity, ids[3]).expect("alive");
            manager.attach(entity, ids[4]).expect("alive");
        }
        if rng.gen_bool(0.05) {
            manager.attach(entity, ids[5]).expect("alive");
        }
        entities.push(entity);
    }
    manager.lazy_cleanup();
    (manager, entities)
}

/// A chunked transform store filled through a fresh manager's ids.
pub fn populated_chunks(count: usize) -> ChunkedStore<Transform> {
    let registry = registry();
    let mut manager = EntityManager::new(&registry);
    let mut store = ChunkedStore::new();
    for i in 0..count {
        let entity = manager.create();
        store
            .add(
                entity,
                Transform {
                    x: i as f32,
                    y: (i * 2) as f32,
                    rotation: 0.0,
                },
            )
            .expect("fresh entity");
    }
    store
}
