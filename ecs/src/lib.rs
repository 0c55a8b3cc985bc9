//! Archetype-indexed ECS data store.
//!
//! This crate is the data core of a layered 2D engine: entity identity
//! allocation, a bit-indexed component-type registry, archetype grouping
//! linked by a single-bit neighbor graph, and chunked structure-of-arrays
//! storage for hot numeric loops. Rendering, input, and gameplay systems
//! live elsewhere and only consume the read/iteration surfaces exposed
//! here.
//!
//! Three storage paths coexist, each with a different trade-off:
//!
//! - [`entity::Manager`] groups entities by their exact component mask and
//!   answers superset queries through the archetype graph, with a result
//!   cache that is invalidated once per frame.
//! - [`storage::Storage`] is the flexible path: per-type entity maps plus a
//!   parent/child hierarchy, queried by intersecting component sets.
//! - [`chunk::Store`] packs fixed-shape numeric records into parallel lanes
//!   for tight per-frame iteration.
//!
//! The store is single-threaded by design; one frame tick mutates state
//! synchronously and nothing here takes a lock.

pub mod archetype;
pub mod chunk;
pub mod component;
pub mod entity;
pub mod error;
pub mod storage;

pub use archetype::Archetype;
pub use chunk::{Record, Store as ChunkedStore};
pub use component::{Mask, Registry};
pub use entity::{Entity, Manager as EntityManager};
pub use error::{Error, Result};
pub use storage::Storage;
