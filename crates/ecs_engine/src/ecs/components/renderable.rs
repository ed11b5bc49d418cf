//! Renderable component for entities that can be rendered
//!
//! Holds cache keys rather than GPU objects; the render system resolves
//! them through the resource cache each frame.

use crate::ecs::component::impl_component;
use crate::ecs::ComponentKind;
use crate::render::resources::{MeshKey, TextureKey};

/// Mesh, texture and material scalars for one drawable entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    /// Geometry; entities sharing it share an instanced draw
    pub mesh: MeshKey,
    /// Texture; de-duplicated per batch by key identity
    pub texture: TextureKey,
    /// Mirror reflection strength (0.0 to 1.0)
    pub reflectivity: f32,
    /// Specular exponent
    pub shininess: u32,
}

impl Renderable {
    /// Create a new renderable with a matte material
    pub fn new(mesh: MeshKey, texture: TextureKey) -> Self {
        Self {
            mesh,
            texture,
            reflectivity: 0.0,
            shininess: 32,
        }
    }

    /// Builder pattern: Set material scalars
    pub fn with_material(mut self, reflectivity: f32, shininess: u32) -> Self {
        self.reflectivity = reflectivity;
        self.shininess = shininess;
        self
    }
}

impl_component!(Renderable, ComponentKind::Renderable, renderables);
