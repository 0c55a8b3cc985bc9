//! Component-type identity, masks, and map-based component values.

mod mask;
mod registry;
mod store;

pub use mask::Mask;
pub use registry::{DEFAULT_CAPACITY, Id, Info, Registry};
pub use store::Store;
