//! AI component

use crate::ecs::component::impl_component;
use crate::ecs::ComponentKind;
use crate::foundation::math::Vec3;

/// Behaviour state of an AI-driven entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiState {
    /// Standing still
    #[default]
    Idle,
    /// Walking the waypoint list
    Patrol,
    /// Engaging a target
    Attack,
    /// Moving away from a threat
    Flee,
}

/// Current AI state plus its patrol path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ai {
    /// Current behaviour state
    pub state: AiState,
    /// Path for patrolling, in world space
    pub waypoints: Vec<Vec3>,
}

impl_component!(Ai, ComponentKind::Ai, ais);
