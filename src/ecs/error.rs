//! Registry error types

use thiserror::Error;

use super::{ComponentTypeId, EntityId};

/// Precondition failures reported by the `try_*` registry operations.
///
/// The plain operations treat the same conditions as contract violations
/// and panic instead; see [`crate::ecs::contract`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid entity {0}: never allocated or already destroyed")]
    InvalidEntity(EntityId),

    #[error("{entity} has no live `{component}` component")]
    MissingComponent {
        entity: EntityId,
        component: ComponentTypeId,
    },

    #[error("component set names `{0}` more than once")]
    DuplicateComponent(ComponentTypeId),

    #[error("failed to start transform worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
