//! Engine configuration sections

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::physics::ParallelAxisPolicy;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Collision and integration tuning
    pub physics: PhysicsConfig,
    /// Batching limits, shaders and scene lighting
    pub render: RenderConfig,
    /// Camera fly controls
    pub input: InputConfig,
    /// Initial camera placement and projection
    pub camera: CameraConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Check every section, returning the first invalid value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.render.validate()?;
        self.camera.validate()
    }
}

/// Physics system tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration added to the vertical acceleration each free step
    pub gravity: f32,
    /// Fraction of speed kept after a bounce; clamped to `[0.1, 0.9]` at use
    pub bounce_factor: f32,
    /// Speed under which a bounced entity settles and becomes static
    pub rest_speed: f32,
    /// Offset along the contact normal applied after snapping to a hit
    pub contact_epsilon: f32,
    /// Direction magnitude under which a slab axis counts as parallel
    pub slab_epsilon: f32,
    /// Behaviour of the slab test on axis-parallel motion
    pub parallel_axis_policy: ParallelAxisPolicy,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.816,
            bounce_factor: 0.5,
            rest_speed: 0.05,
            contact_epsilon: 1e-3,
            slab_epsilon: 1e-6,
            parallel_axis_policy: ParallelAxisPolicy::RejectOutside,
        }
    }
}

impl Config for PhysicsConfig {}

impl PhysicsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.contact_epsilon <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "physics.contact_epsilon",
                reason: format!("must be positive, got {}", self.contact_epsilon),
            });
        }
        if self.slab_epsilon <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "physics.slab_epsilon",
                reason: format!("must be positive, got {}", self.slab_epsilon),
            });
        }
        if self.rest_speed < 0.0 {
            return Err(ConfigError::Invalid {
                field: "physics.rest_speed",
                reason: format!("must not be negative, got {}", self.rest_speed),
            });
        }
        Ok(())
    }
}

/// Render system limits and scene-wide shading inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Number of nearest lights passed to the shading stage
    pub max_lights: usize,
    /// Texture-array slots available to one instanced draw
    pub max_texture_slots: usize,
    /// Instances submitted by one instanced draw
    pub max_instances_per_batch: usize,
    /// Shader identifier for one-instance batches
    pub single_shader: String,
    /// Shader identifier for texture-array instanced batches
    pub instanced_shader: String,
    /// Ambient light color (RGB)
    pub ambient_color: [f32; 3],
    /// Ambient light intensity
    pub ambient_intensity: f32,
    /// Framebuffer clear color (RGBA)
    pub clear_color: [f32; 4],
    /// Frames a cached resource may go unused before it is released
    pub resource_idle_frames: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_lights: 8,
            max_texture_slots: 16,
            max_instances_per_batch: 1024,
            single_shader: "shaders/single.glsl".to_string(),
            instanced_shader: "shaders/texture_array.glsl".to_string(),
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.1,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            resource_idle_frames: 300,
        }
    }
}

impl Config for RenderConfig {}

impl RenderConfig {
    /// Check that every per-frame limit admits at least one item
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("render.max_lights", self.max_lights),
            ("render.max_texture_slots", self.max_texture_slots),
            ("render.max_instances_per_batch", self.max_instances_per_batch),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Fly-camera controls driven by the input system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Camera speed in units per second
    pub move_speed: f32,
    /// Speed multiplier while the sprint key is held
    pub sprint_multiplier: f32,
    /// Radians of rotation per unit of mouse motion
    pub mouse_sensitivity: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            sprint_multiplier: 2.0,
            mouse_sensitivity: 0.02,
        }
    }
}

impl Config for InputConfig {}

/// Initial camera placement and projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// World-space position
    pub position: [f32; 3],
    /// Yaw in radians
    pub yaw: f32,
    /// Pitch in radians
    pub pitch: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Viewport width / height
    pub aspect_ratio: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            yaw: -crate::foundation::math::constants::HALF_PI,
            pitch: 0.0,
            fov_degrees: 60.0,
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Config for CameraConfig {}

impl CameraConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.near <= 0.0 || self.far <= self.near {
            return Err(ConfigError::Invalid {
                field: "camera.near",
                reason: format!("expected 0 < near < far, got near={} far={}", self.near, self.far),
            });
        }
        Ok(())
    }
}
