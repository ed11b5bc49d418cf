//! Identifier-keyed GPU resource cache
//!
//! Meshes, textures and shaders are loaded through the backend on first
//! request and stored in slot maps. Callers hold the generational key, never
//! the backend handle. Resolving a key marks it used in the current frame,
//! and [`ResourceCache::sweep_unused`] hands resources that have sat idle for
//! too long back to the backend. The render system marks every key held by a
//! live `Renderable` each frame, so only unreferenced resources are swept.
//! A swept key resolves to `None`.

use std::collections::HashMap;
use std::fmt;

use slotmap::{new_key_type, Key, SlotMap};

use super::backend::{BackendResult, GpuMesh, GpuShader, GpuTexture, GraphicsBackend};
use super::RenderError;

new_key_type! {
    /// Cache key for a mesh
    pub struct MeshKey;
    /// Cache key for a texture
    pub struct TextureKey;
    /// Cache key for a shader program
    pub struct ShaderKey;
}

/// Resource category, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Geometry
    Mesh,
    /// Texture image
    Texture,
    /// Shader program
    Shader,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mesh => "mesh",
            Self::Texture => "texture",
            Self::Shader => "shader",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Entry<H> {
    id: String,
    handle: H,
    last_used: u64,
}

#[derive(Debug)]
struct Pool<K: Key, H> {
    kind: ResourceKind,
    entries: SlotMap<K, Entry<H>>,
    by_id: HashMap<String, K>,
}

impl<K: Key, H: Copy> Pool<K, H> {
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            entries: SlotMap::with_key(),
            by_id: HashMap::new(),
        }
    }

    fn get_or_load<F>(&mut self, id: &str, frame: u64, load: F) -> Result<K, RenderError>
    where
        F: FnOnce(&str) -> BackendResult<H>,
    {
        if let Some(&key) = self.by_id.get(id) {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.last_used = frame;
                return Ok(key);
            }
        }

        let handle = load(id).map_err(|e| {
            log::error!("Failed to load {} '{}': {}", self.kind, id, e);
            e
        })?;
        let key = self.entries.insert(Entry { id: id.to_string(), handle, last_used: frame });
        self.by_id.insert(id.to_string(), key);
        log::info!("Loaded {} '{}'", self.kind, id);
        Ok(key)
    }

    fn resolve(&mut self, key: K, frame: u64) -> Option<H> {
        let entry = self.entries.get_mut(key)?;
        entry.last_used = frame;
        Some(entry.handle)
    }

    fn sweep(&mut self, frame: u64, max_idle_frames: u64) -> Vec<H> {
        let idle: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| frame.saturating_sub(entry.last_used) > max_idle_frames)
            .map(|(key, _)| key)
            .collect();

        let mut released = Vec::with_capacity(idle.len());
        for key in idle {
            if let Some(entry) = self.entries.remove(key) {
                log::debug!("Releasing idle {} '{}'", self.kind, entry.id);
                self.by_id.remove(&entry.id);
                released.push(entry.handle);
            }
        }
        released
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Arena of loaded GPU resources keyed by identifier
#[derive(Debug)]
pub struct ResourceCache {
    meshes: Pool<MeshKey, GpuMesh>,
    textures: Pool<TextureKey, GpuTexture>,
    shaders: Pool<ShaderKey, GpuShader>,
    frame: u64,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCache {
    /// Create an empty cache at frame 0
    pub fn new() -> Self {
        Self {
            meshes: Pool::new(ResourceKind::Mesh),
            textures: Pool::new(ResourceKind::Texture),
            shaders: Pool::new(ResourceKind::Shader),
            frame: 0,
        }
    }

    /// Current frame counter
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance the frame counter used for idle tracking
    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    /// Key for mesh `id`, loading it on first use
    pub fn get_mesh(&mut self, backend: &mut dyn GraphicsBackend, id: &str) -> Result<MeshKey, RenderError> {
        self.meshes.get_or_load(id, self.frame, |id| backend.load_mesh(id))
    }

    /// Key for texture `id`, loading it on first use
    pub fn get_texture(&mut self, backend: &mut dyn GraphicsBackend, id: &str) -> Result<TextureKey, RenderError> {
        self.textures.get_or_load(id, self.frame, |id| backend.load_texture(id))
    }

    /// Key for shader `id`, loading it on first use
    pub fn get_shader(&mut self, backend: &mut dyn GraphicsBackend, id: &str) -> Result<ShaderKey, RenderError> {
        self.shaders.get_or_load(id, self.frame, |id| backend.load_shader(id))
    }

    /// Backend handle for a mesh key, marking it used
    pub fn resolve_mesh(&mut self, key: MeshKey) -> Option<GpuMesh> {
        self.meshes.resolve(key, self.frame)
    }

    /// Backend handle for a texture key, marking it used
    pub fn resolve_texture(&mut self, key: TextureKey) -> Option<GpuTexture> {
        self.textures.resolve(key, self.frame)
    }

    /// Backend handle for a shader key, marking it used
    pub fn resolve_shader(&mut self, key: ShaderKey) -> Option<GpuShader> {
        self.shaders.resolve(key, self.frame)
    }

    /// Count `mesh` and `texture` as used this frame without binding them
    pub fn mark_used(&mut self, mesh: MeshKey, texture: TextureKey) {
        self.meshes.resolve(mesh, self.frame);
        self.textures.resolve(texture, self.frame);
    }

    /// Release every resource unused for more than `max_idle_frames` frames
    ///
    /// Returns how many resources were released.
    pub fn sweep_unused(&mut self, backend: &mut dyn GraphicsBackend, max_idle_frames: u64) -> usize {
        let meshes = self.meshes.sweep(self.frame, max_idle_frames);
        let textures = self.textures.sweep(self.frame, max_idle_frames);
        let shaders = self.shaders.sweep(self.frame, max_idle_frames);
        let released = meshes.len() + textures.len() + shaders.len();

        for mesh in meshes {
            backend.release_mesh(mesh);
        }
        for texture in textures {
            backend.release_texture(texture);
        }
        for shader in shaders {
            backend.release_shader(shader);
        }

        if released > 0 {
            log::info!("Released {} idle resources at frame {}", released, self.frame);
        }
        released
    }

    /// Number of cached resources of each kind (meshes, textures, shaders)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.meshes.len(), self.textures.len(), self.shaders.len())
    }
}

/// Backend plus the cache of resources loaded through it
///
/// Shared as `Rc<RefCell<GraphicsContext<B>>>` between scene setup, which
/// loads resources, and the render system, which draws with them.
#[derive(Debug)]
pub struct GraphicsContext<B: GraphicsBackend> {
    /// Graphics API
    pub backend: B,
    /// Loaded resources
    pub resources: ResourceCache,
}

impl<B: GraphicsBackend> GraphicsContext<B> {
    /// Wrap a backend with an empty cache
    pub fn new(backend: B) -> Self {
        Self { backend, resources: ResourceCache::new() }
    }

    /// Key for mesh `id`, loading it on first use
    pub fn load_mesh(&mut self, id: &str) -> Result<MeshKey, RenderError> {
        self.resources.get_mesh(&mut self.backend, id)
    }

    /// Key for texture `id`, loading it on first use
    pub fn load_texture(&mut self, id: &str) -> Result<TextureKey, RenderError> {
        self.resources.get_texture(&mut self.backend, id)
    }

    /// Key for shader `id`, loading it on first use
    pub fn load_shader(&mut self, id: &str) -> Result<ShaderKey, RenderError> {
        self.resources.get_shader(&mut self.backend, id)
    }

    /// Release resources idle for more than `max_idle_frames` frames
    pub fn sweep_unused(&mut self, max_idle_frames: u64) -> usize {
        self.resources.sweep_unused(&mut self.backend, max_idle_frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::{HeadlessBackend, RenderCommand};

    #[test]
    fn test_same_identifier_loads_once() {
        let mut context = GraphicsContext::new(HeadlessBackend::new());
        let first = context.load_texture("crate.png").unwrap();
        let second = context.load_texture("crate.png").unwrap();
        let other = context.load_texture("grass.png").unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(context.backend.live_resources(), 2);
        assert_eq!(context.resources.counts(), (0, 2, 0));
    }

    #[test]
    fn test_failed_load_caches_nothing() {
        let mut backend = HeadlessBackend::new();
        backend.fail_on("broken.glsl");
        let mut context = GraphicsContext::new(backend);

        assert!(context.load_shader("broken.glsl").is_err());
        assert_eq!(context.resources.counts(), (0, 0, 0));
    }

    #[test]
    fn test_sweep_releases_only_idle_resources() {
        let mut context = GraphicsContext::new(HeadlessBackend::new());
        let busy = context.load_mesh("cube.obj").unwrap();
        let idle = context.load_mesh("sphere.obj").unwrap();

        for _ in 0..10 {
            context.resources.advance_frame();
            assert!(context.resources.resolve_mesh(busy).is_some());
        }

        assert_eq!(context.sweep_unused(5), 1);
        assert!(context.resources.resolve_mesh(idle).is_none());
        assert!(context.resources.resolve_mesh(busy).is_some());
        assert_eq!(context.backend.live_resources(), 1);
        assert!(matches!(context.backend.commands().last(), Some(RenderCommand::ReleaseMesh(_))));

        // Reloading a swept identifier issues a fresh key
        let reloaded = context.load_mesh("sphere.obj").unwrap();
        assert_ne!(reloaded, idle);
    }
}
