//! Transform component for the ECS system

use crate::ecs::component::impl_component;
use crate::ecs::ComponentKind;
use crate::foundation::math::{world_matrix, Mat4, Quat, Vec3};

/// World-space placement of an entity
///
/// Doubles as the collision proxy: physics treats every transform as a
/// unit box spanning `position .. position + (1, 1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World space position (Y-up right-handed)
    pub position: Vec3,

    /// World space rotation quaternion
    pub rotation: Quat,

    /// World space scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from position, rotation and scale
    pub fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a world matrix (`T * S * R`)
    pub fn to_matrix(&self) -> Mat4 {
        world_matrix(&self.position, &self.rotation, &self.scale)
    }

    /// Builder pattern: Set rotation from Euler angles (radians)
    pub fn with_rotation_euler(mut self, roll: f32, pitch: f32, yaw: f32) -> Self {
        self.rotation = Quat::from_euler_angles(roll, pitch, yaw);
        self
    }

    /// Builder pattern: Set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

impl_component!(Transform, ComponentKind::Transform, transforms);
