//! Rendering
//!
//! Backend-agnostic batching and light selection on top of a
//! [`GraphicsBackend`]. The engine never touches a graphics API directly.

pub mod backend;
pub mod batching;
pub mod camera;
pub mod lighting;
pub mod resources;
pub mod system;

pub use backend::{GpuMesh, GpuShader, GpuTexture, GraphicsBackend, HeadlessBackend, LightData, RenderCommand};
pub use batching::{build_batches, BatchLimits, InstanceData, RenderBatch};
pub use camera::{Camera, CameraMovement};
pub use lighting::{nearest_lights, SelectedLight};
pub use resources::{GraphicsContext, MeshKey, ResourceCache, ResourceKind, ShaderKey, TextureKey};
pub use system::{FrameStats, RenderSystem};

use thiserror::Error;

/// Rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The backend could not load a resource
    #[error("Failed to load {kind} '{id}': {reason}")]
    ResourceLoad {
        /// Resource category
        kind: ResourceKind,
        /// Identifier that was requested
        id: String,
        /// Backend's description of the failure
        reason: String,
    },

    /// A cache key no longer refers to a loaded resource
    #[error("Stale {0} key")]
    MissingResource(ResourceKind),

    /// The backend failed while recording or presenting a frame
    #[error("Backend error: {0}")]
    Backend(String),
}
