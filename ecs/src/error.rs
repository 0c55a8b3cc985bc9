//! Error kinds surfaced by the data store.
//!
//! The split follows one policy throughout the crate: misconfiguration and
//! entity-level mistakes fail fast with an [`Error`], missing components on
//! read paths return empty, and structural desyncs between internal tables
//! are `debug_assert!`-gated rather than represented as values.

use thiserror::Error;

use crate::entity::Entity;

/// Errors produced by registry, entity, storage, and chunk operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A component-type name was used before being registered.
    #[error("unknown component type `{0}`")]
    UnknownComponentType(String),

    /// An operation referenced an entity that is not alive in this store.
    #[error("unknown entity {0:?}")]
    UnknownEntity(Entity),

    /// The registry's fixed component-type capacity is exhausted.
    #[error("component registry is full ({capacity} types)")]
    CapacityExceeded {
        /// The configured maximum number of component types.
        capacity: usize,
    },

    /// The entity is already present in the target store.
    #[error("entity {0:?} is already present in this store")]
    DuplicateEntity(Entity),

    /// Re-parenting would make an entity its own ancestor.
    #[error("linking {child:?} under {parent:?} would create a cycle")]
    HierarchyCycle {
        /// The entity being re-parented.
        child: Entity,
        /// The requested parent.
        parent: Entity,
    },
}

/// Convenience alias for fallible store operations.
pub type Result<T> = std::result::Result<T, Error>;
