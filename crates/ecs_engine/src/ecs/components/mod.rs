//! ECS Components module
//!
//! Plain data only. Behaviour lives in the systems that query these.

pub mod ai;
pub mod lighting;
pub mod physics;
pub mod renderable;
pub mod transform;

pub use ai::{Ai, AiState};
pub use lighting::LightSource;
pub use physics::Physics;
pub use renderable::Renderable;
pub use transform::Transform;
