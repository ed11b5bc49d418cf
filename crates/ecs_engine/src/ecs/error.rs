//! ECS error types

use thiserror::Error;

use super::{ComponentKind, Entity};

/// Contract violations reported by the registry
///
/// None of these leave the registry in a modified state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The handle is stale or was never issued
    #[error("entity {0} is not alive")]
    EntityNotAlive(Entity),

    /// Adding a component the entity already owns
    #[error("entity {entity} already has a {kind:?} component")]
    DuplicateComponent {
        /// Target entity
        entity: Entity,
        /// Kind that was already present
        kind: ComponentKind,
    },

    /// Removing or requiring a component the entity does not own
    #[error("entity {entity} has no {kind:?} component")]
    MissingComponent {
        /// Target entity
        entity: Entity,
        /// Kind that was absent
        kind: ComponentKind,
    },
}
