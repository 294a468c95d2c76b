//! Entity component store
//!
//! Entities are bare ids. Components are arbitrary owned values stored per
//! entity behind a type-erased box, with a per-type validity index backing
//! the group/query/task/transform retrieval operations.

pub mod component;
pub mod contract;
pub mod entity;
pub mod error;
pub mod registry;
pub mod set;
pub mod value_box;

pub use component::{Component, ComponentTypeId};
pub use entity::{EntityAllocator, EntityId};
pub use error::RegistryError;
pub use registry::Registry;
pub use set::ComponentSet;
pub use value_box::ValueBox;
