//! Graphics backend abstraction and the in-memory headless backend
//!
//! The render system talks to the GPU only through [`GraphicsBackend`].
//! [`HeadlessBackend`] records every call instead of drawing, which is what
//! the tests and the sandbox run against.

use std::collections::HashSet;

use bytemuck::{Pod, Zeroable};

use super::batching::InstanceData;
use super::resources::ResourceKind;
use super::RenderError;
use crate::foundation::math::{Mat4, Vec3};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Backend handle to uploaded geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuMesh(pub u64);

/// Backend handle to an uploaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuTexture(pub u64);

/// Backend handle to a compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuShader(pub u64);

/// Point light as laid out in the shader's light array
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightData {
    /// World position
    pub position: [f32; 3],
    /// Intensity multiplier
    pub intensity: f32,
    /// RGB color
    pub color: [f32; 3],
    /// Constant attenuation term
    pub constant: f32,
    /// Linear attenuation term
    pub linear: f32,
    /// Quadratic attenuation term
    pub quadratic: f32,
    /// Pads the struct to a 16-byte multiple
    pub _padding: [f32; 2],
}

/// Operations the render system needs from a graphics API
pub trait GraphicsBackend {
    /// Load and upload geometry by identifier
    fn load_mesh(&mut self, id: &str) -> BackendResult<GpuMesh>;

    /// Load and upload a texture by identifier
    fn load_texture(&mut self, id: &str) -> BackendResult<GpuTexture>;

    /// Load and compile a shader program by identifier
    fn load_shader(&mut self, id: &str) -> BackendResult<GpuShader>;

    /// Free geometry
    fn release_mesh(&mut self, mesh: GpuMesh);

    /// Free a texture
    fn release_texture(&mut self, texture: GpuTexture);

    /// Free a shader program
    fn release_shader(&mut self, shader: GpuShader);

    /// Start a frame and clear the framebuffer
    fn begin_frame(&mut self, clear_color: [f32; 4]) -> BackendResult<()>;

    /// Make `shader` current
    fn use_shader(&mut self, shader: GpuShader);

    /// Bind a mesh's vertex array
    fn bind_vao(&mut self, mesh: GpuMesh);

    /// Set a matrix uniform on the current shader
    fn bind_matrix(&mut self, name: &str, matrix: &Mat4);

    /// Bind one texture for the single-instance path
    fn bind_texture(&mut self, texture: GpuTexture);

    /// Upload and bind a texture array, slot `i` holding `textures[i]`
    fn bind_texture_array(&mut self, textures: &[GpuTexture]);

    /// Set a float uniform on the current shader
    fn bind_float(&mut self, name: &str, value: f32);

    /// Set a vec3 uniform on the current shader
    fn bind_vector(&mut self, name: &str, value: &Vec3);

    /// Set the light array uniform on the current shader
    fn bind_lights(&mut self, lights: &[LightData]);

    /// Draw the bound mesh once
    fn draw_single(&mut self, mesh: GpuMesh) -> BackendResult<()>;

    /// Draw the bound mesh once per instance record
    fn draw_instances(&mut self, mesh: GpuMesh, instances: &[InstanceData]) -> BackendResult<()>;

    /// Finish the frame
    fn present(&mut self) -> BackendResult<()>;
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// `load_mesh` succeeded
    LoadMesh(String),
    /// `load_texture` succeeded
    LoadTexture(String),
    /// `load_shader` succeeded
    LoadShader(String),
    /// `release_mesh`
    ReleaseMesh(GpuMesh),
    /// `release_texture`
    ReleaseTexture(GpuTexture),
    /// `release_shader`
    ReleaseShader(GpuShader),
    /// `begin_frame`
    BeginFrame,
    /// `use_shader`
    UseShader(GpuShader),
    /// `bind_vao`
    BindVao(GpuMesh),
    /// `bind_matrix` (uniform name only)
    BindMatrix(String),
    /// `bind_texture`
    BindTexture(GpuTexture),
    /// `bind_texture_array`
    BindTextureArray(Vec<GpuTexture>),
    /// `bind_float`
    BindFloat(String, f32),
    /// `bind_vector`
    BindVector(String, [f32; 3]),
    /// `bind_lights`
    BindLights(Vec<LightData>),
    /// `draw_single`
    DrawSingle(GpuMesh),
    /// `draw_instances`
    DrawInstances(GpuMesh, Vec<InstanceData>),
    /// `present`
    Present,
}

/// Backend that records calls instead of talking to a GPU
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    commands: Vec<RenderCommand>,
    failing: HashSet<String>,
    live: HashSet<u64>,
    next_handle: u64,
    frames_presented: u64,
}

impl HeadlessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later load of `id` fail
    pub fn fail_on(&mut self, id: impl Into<String>) {
        self.failing.insert(id.into());
    }

    /// Every call recorded so far
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Take the recorded calls, leaving the log empty
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of draw calls recorded
    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawSingle(_) | RenderCommand::DrawInstances(..)))
            .count()
    }

    /// Resources loaded and not yet released
    pub fn live_resources(&self) -> usize {
        self.live.len()
    }

    /// Frames finished with `present`
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn load(&mut self, kind: ResourceKind, id: &str) -> BackendResult<u64> {
        if self.failing.contains(id) {
            return Err(RenderError::ResourceLoad {
                kind,
                id: id.to_string(),
                reason: "headless backend configured to fail".to_string(),
            });
        }
        self.next_handle += 1;
        self.live.insert(self.next_handle);
        Ok(self.next_handle)
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn load_mesh(&mut self, id: &str) -> BackendResult<GpuMesh> {
        let handle = self.load(ResourceKind::Mesh, id)?;
        self.commands.push(RenderCommand::LoadMesh(id.to_string()));
        Ok(GpuMesh(handle))
    }

    fn load_texture(&mut self, id: &str) -> BackendResult<GpuTexture> {
        let handle = self.load(ResourceKind::Texture, id)?;
        self.commands.push(RenderCommand::LoadTexture(id.to_string()));
        Ok(GpuTexture(handle))
    }

    fn load_shader(&mut self, id: &str) -> BackendResult<GpuShader> {
        let handle = self.load(ResourceKind::Shader, id)?;
        self.commands.push(RenderCommand::LoadShader(id.to_string()));
        Ok(GpuShader(handle))
    }

    fn release_mesh(&mut self, mesh: GpuMesh) {
        self.live.remove(&mesh.0);
        self.commands.push(RenderCommand::ReleaseMesh(mesh));
    }

    fn release_texture(&mut self, texture: GpuTexture) {
        self.live.remove(&texture.0);
        self.commands.push(RenderCommand::ReleaseTexture(texture));
    }

    fn release_shader(&mut self, shader: GpuShader) {
        self.live.remove(&shader.0);
        self.commands.push(RenderCommand::ReleaseShader(shader));
    }

    fn begin_frame(&mut self, _clear_color: [f32; 4]) -> BackendResult<()> {
        self.commands.push(RenderCommand::BeginFrame);
        Ok(())
    }

    fn use_shader(&mut self, shader: GpuShader) {
        self.commands.push(RenderCommand::UseShader(shader));
    }

    fn bind_vao(&mut self, mesh: GpuMesh) {
        self.commands.push(RenderCommand::BindVao(mesh));
    }

    fn bind_matrix(&mut self, name: &str, _matrix: &Mat4) {
        self.commands.push(RenderCommand::BindMatrix(name.to_string()));
    }

    fn bind_texture(&mut self, texture: GpuTexture) {
        self.commands.push(RenderCommand::BindTexture(texture));
    }

    fn bind_texture_array(&mut self, textures: &[GpuTexture]) {
        self.commands.push(RenderCommand::BindTextureArray(textures.to_vec()));
    }

    fn bind_float(&mut self, name: &str, value: f32) {
        self.commands.push(RenderCommand::BindFloat(name.to_string(), value));
    }

    fn bind_vector(&mut self, name: &str, value: &Vec3) {
        self.commands.push(RenderCommand::BindVector(name.to_string(), [value.x, value.y, value.z]));
    }

    fn bind_lights(&mut self, lights: &[LightData]) {
        self.commands.push(RenderCommand::BindLights(lights.to_vec()));
    }

    fn draw_single(&mut self, mesh: GpuMesh) -> BackendResult<()> {
        self.commands.push(RenderCommand::DrawSingle(mesh));
        Ok(())
    }

    fn draw_instances(&mut self, mesh: GpuMesh, instances: &[InstanceData]) -> BackendResult<()> {
        self.commands.push(RenderCommand::DrawInstances(mesh, instances.to_vec()));
        Ok(())
    }

    fn present(&mut self) -> BackendResult<()> {
        self.commands.push(RenderCommand::Present);
        self.frames_presented += 1;
        Ok(())
    }
}
