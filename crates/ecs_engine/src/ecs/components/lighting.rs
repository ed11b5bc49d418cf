//! Lighting component for ECS
//!
//! Pure data component. The light's position comes from the entity's
//! [`Transform`](super::Transform).

use crate::ecs::component::impl_component;
use crate::ecs::ComponentKind;
use crate::foundation::math::Vec3;

/// Point light with distance attenuation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    /// RGB color values for the light (0.0 to 1.0 range)
    pub color: Vec3,
    /// Light intensity multiplier
    pub intensity: f32,
    /// Constant attenuation term
    pub constant: f32,
    /// Linear attenuation term
    pub linear: f32,
    /// Quadratic attenuation term
    pub quadratic: f32,
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }
}

impl LightSource {
    /// Light with the usual medium-range falloff
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            linear: 0.09,
            quadratic: 0.032,
            ..Self::default()
        }
    }

    /// Builder pattern: Set attenuation terms
    pub fn with_attenuation(mut self, constant: f32, linear: f32, quadratic: f32) -> Self {
        self.constant = constant;
        self.linear = linear;
        self.quadratic = quadratic;
        self
    }
}

impl_component!(LightSource, ComponentKind::LightSource, lights);
