//! Physics component for moving entities

use crate::ecs::component::impl_component;
use crate::ecs::ComponentKind;
use crate::foundation::math::Vec3;

/// Linear motion state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Physics {
    /// Units per second
    pub velocity: Vec3,
    /// Units per second squared; gravity accumulates into `y`
    pub acceleration: Vec3,
    /// Mass in kilograms
    pub mass: f32,
    /// Static entities are never integrated
    pub is_static: bool,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            mass: 1.0,
            is_static: false,
        }
    }
}

impl Physics {
    /// Dynamic body with an initial velocity
    pub fn with_velocity(velocity: Vec3) -> Self {
        Self { velocity, ..Self::default() }
    }

    /// Immovable body
    pub fn fixed() -> Self {
        Self { is_static: true, ..Self::default() }
    }
}

impl_component!(Physics, ComponentKind::Physics, physics);
