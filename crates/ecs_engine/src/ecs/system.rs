//! System trait and execution priorities

use super::World;
use crate::events::{Event, EventQueue};

/// Input runs first so movement applies in the same frame
pub const INPUT_PRIORITY: i32 = 1;

/// Physics integrates after input
pub const PHYSICS_PRIORITY: i32 = 2;

/// Rendering reads the settled state last
pub const RENDER_PRIORITY: i32 = 3;

/// System trait for processing entities and components
///
/// Lower priorities run first. Systems hold no component data of their own,
/// only scratch buffers and whatever collaborators they were built with.
pub trait System {
    /// Name for diagnostics
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Execution order key
    fn priority(&self) -> i32;

    /// React to one event
    ///
    /// `events` is the live queue: anything published here is delivered later
    /// in the same drain.
    fn handle_event(&mut self, event: &Event, world: &mut World, events: &mut EventQueue, delta_time: f32) {
        let _ = (event, world, events, delta_time);
    }

    /// Run the per-frame update
    fn update(&mut self, world: &mut World, delta_time: f32);
}
