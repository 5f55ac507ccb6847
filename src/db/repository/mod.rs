//! Repository layer: entity-scoped database operations.
//!
//! Split by entity. All public functions are re-exported here.

mod allocator;
mod association;
mod consultation;
mod patient;
mod professional;

pub use allocator::*;
pub use association::*;
pub use consultation::*;
pub use patient::*;
pub use professional::*;
