//! Physics simulation
//!
//! Swept axis-aligned box collision against unit boxes, bounce response and
//! gravity integration.

pub mod aabb;
pub mod system;

pub use aabb::{Aabb, ParallelAxisPolicy, SweepHit};
pub use system::PhysicsSystem;
