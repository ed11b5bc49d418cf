//! # ECS Engine
//!
//! Runtime core of a real-time 3D engine: an entity-component registry, a
//! priority-ordered system scheduler driven by game state and a FIFO event
//! queue, swept-AABB physics and batched instanced rendering behind a
//! graphics backend trait.
//!
//! ## Features
//!
//! - **ECS registry**: generational 32-bit entity handles, sparse-set
//!   component stores and bitmask queries
//! - **Scheduler**: per-state system sets, event fan-out, priority ordering
//! - **Physics**: swept slab test against unit boxes with bounce and rest
//! - **Rendering**: mesh batching, texture-array de-duplication and
//!   nearest-light selection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ecs_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let config = EngineConfig::default();
//!     let context = Rc::new(RefCell::new(GraphicsContext::new(HeadlessBackend::new())));
//!     let camera = Rc::new(RefCell::new(Camera::from_config(&config.camera)));
//!
//!     let mut world = World::new();
//!     let cube = context.borrow_mut().load_mesh("cube.obj")?;
//!     let crate_texture = context.borrow_mut().load_texture("crate.png")?;
//!     let entity = world.create_entity();
//!     world.add_component(entity, Transform::from_position(Vec3::new(0.0, 5.0, 0.0)))?;
//!     world.add_component(entity, Physics::default())?;
//!     world.add_component(entity, Renderable::new(cube, crate_texture))?;
//!
//!     let mut scheduler = SystemScheduler::new();
//!     scheduler.register_system(PhysicsSystem::new(config.physics.clone()))?;
//!     scheduler.register_system(RenderSystem::new(config.render.clone(), context, camera))?;
//!     scheduler.run_frame(&mut world, 1.0 / 60.0);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod input;
pub mod physics;
pub mod render;

use thiserror::Error;

/// Errors surfaced to applications embedding the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Registry contract violation
    #[error("ECS error: {0}")]
    Ecs(#[from] ecs::EcsError),

    /// System registration or state setup failed
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] ecs::SchedulerError),

    /// Resource loading or frame submission failed
    #[error("Render error: {0}")]
    Render(#[from] render::RenderError),
}

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig},
        ecs::{
            components::{Ai, AiState, LightSource, Physics, Renderable, Transform},
            ComponentMask, Entity, GameState, System, SystemScheduler, SystemSet, World,
        },
        events::{Event, EventQueue, EventType, KeyCode},
        foundation::math::{Mat4, Quat, Vec3},
        input::InputSystem,
        physics::PhysicsSystem,
        render::{Camera, GraphicsBackend, GraphicsContext, HeadlessBackend, RenderSystem},
        EngineError,
    };
}
