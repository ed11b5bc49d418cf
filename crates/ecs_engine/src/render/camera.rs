//! # Fly camera
//!
//! Yaw/pitch camera in a right-handed Y-up world. Yaw 0 looks down +X and
//! yaw -PI/2 looks down -Z. The orientation vectors are recomputed whenever
//! yaw or pitch change, so `front`, `right` and `up` are always orthonormal.

use crate::config::CameraConfig;
use crate::foundation::math::{constants, utils, Mat4, Point3, Vec3};

/// Pitch limit, just short of straight up or down
pub const MAX_PITCH: f32 = constants::PI / 2.01;

/// Movement directions for keyboard-driven flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    /// Along `front`
    Forward,
    /// Against `front`
    Backward,
    /// Against `right`
    Left,
    /// Along `right`
    Right,
    /// World +Y
    Up,
    /// World -Y
    Down,
}

/// Perspective camera with yaw/pitch orientation
#[derive(Debug, Clone)]
pub struct Camera {
    /// World-space position
    pub position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Viewport width / height
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Camera {
    /// Create a camera at `position` with the given orientation and projection
    pub fn new(position: Vec3, yaw: f32, pitch: f32, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::y(),
            right: Vec3::x(),
            world_up: Vec3::y(),
            yaw,
            pitch: utils::clamp(pitch, -MAX_PITCH, MAX_PITCH),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        };
        camera.update_vectors();
        camera
    }

    /// Create a camera from its configuration section
    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(
            Vec3::from(config.position),
            config.yaw,
            config.pitch,
            config.fov_degrees,
            config.aspect_ratio,
            config.near,
            config.far,
        )
    }

    /// Unit view direction
    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// Unit camera-space right
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Unit camera-space up
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Yaw in radians
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in radians, within `±MAX_PITCH`
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Mat4 {
        let eye = Point3::from(self.position);
        let target = Point3::from(self.position + self.front);
        Mat4::look_at_rh(&eye, &target, &self.up)
    }

    /// Camera-to-clip transform
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Projection times view, the `matCamera` uniform
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Move `speed * delta_time` units in `direction`
    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32, speed: f32) {
        let distance = speed * delta_time;
        match direction {
            CameraMovement::Forward => self.position += self.front * distance,
            CameraMovement::Backward => self.position -= self.front * distance,
            CameraMovement::Left => self.position -= self.right * distance,
            CameraMovement::Right => self.position += self.right * distance,
            CameraMovement::Up => self.position.y += distance,
            CameraMovement::Down => self.position.y -= distance,
        }
    }

    /// Rotate by a mouse delta; positive `dy` (screen down) pitches down
    pub fn process_mouse(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw += dx * sensitivity;
        self.pitch = utils::clamp(self.pitch - dy * sensitivity, -MAX_PITCH, MAX_PITCH);
        self.update_vectors();
        log::trace!("Camera yaw {:.3} pitch {:.3}", self.yaw, self.pitch);
    }

    fn update_vectors(&mut self) {
        let front = Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        );
        self.front = front.normalize();
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}
