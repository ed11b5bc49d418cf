//! Entity-Component-System implementation
//!
//! Entities are generational handles, components live in per-type sparse
//! sets, and the [`World`] keeps both in step with each entity's presence
//! mask. Systems are driven by the [`SystemScheduler`].

pub mod component;
pub mod components;
pub mod entity;
pub mod error;
pub mod scheduler;
pub mod storage;
pub mod system;
pub mod world;

#[cfg(test)]
mod tests;

pub use component::{Component, ComponentKind, ComponentMask};
pub use entity::{Entity, EntityDirectory};
pub use error::EcsError;
pub use scheduler::{GameState, SchedulerError, StateBuilder, SystemScheduler, SystemSet};
pub use storage::ComponentStore;
pub use system::{System, INPUT_PRIORITY, PHYSICS_PRIORITY, RENDER_PRIORITY};
pub use world::World;
