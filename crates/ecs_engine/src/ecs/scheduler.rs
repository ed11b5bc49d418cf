//! System scheduling and game-state management
//!
//! The scheduler owns the active systems for the current [`GameState`] and
//! the frame's event queue. Systems run strictly in ascending priority. A
//! state change tears the active set down and asks the installed state
//! builder to register the set for the new state.

use std::any::TypeId;

use thiserror::Error;

use super::{System, World};
use crate::events::{Event, EventQueue, EventType};

/// Top-level game state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Nothing installed yet
    #[default]
    None,
    /// Shutting down; the frame loop should stop
    Quit,
    /// Main menu
    MainMenu,
    /// Gameplay
    InGame,
    /// Gameplay paused behind a menu
    PauseMenu,
}

/// Scheduler errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A system of this concrete type is already active
    #[error("System already registered: {0}")]
    AlreadyRegistered(&'static str),

    /// No system of this concrete type is active
    #[error("System not registered: {0}")]
    NotRegistered(&'static str),

    /// The state builder could not assemble a state's systems
    #[error("Failed to build systems for {state:?}: {reason}")]
    StateSetup {
        /// State being entered
        state: GameState,
        /// Failure description
        reason: String,
    },
}

struct Registered {
    type_id: TypeId,
    system: Box<dyn System>,
}

/// Priority-ordered list of active systems
#[derive(Default)]
pub struct SystemSet {
    systems: Vec<Registered>,
}

impl SystemSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system, keeping ascending priority order
    ///
    /// Systems with equal priority keep their registration order.
    pub fn register_system<T: System + 'static>(&mut self, system: T) -> Result<(), SchedulerError> {
        let type_id = TypeId::of::<T>();
        if self.contains_type(type_id) {
            return Err(SchedulerError::AlreadyRegistered(std::any::type_name::<T>()));
        }

        log::debug!("Registering system {} (priority {})", system.name(), system.priority());
        self.systems.push(Registered { type_id, system: Box::new(system) });
        // Stable: equal priorities stay in insertion order
        self.systems.sort_by_key(|entry| entry.system.priority());
        Ok(())
    }

    /// Remove the system of concrete type `T`
    pub fn remove_system<T: System + 'static>(&mut self) -> Result<(), SchedulerError> {
        let type_id = TypeId::of::<T>();
        let position = self
            .systems
            .iter()
            .position(|entry| entry.type_id == type_id)
            .ok_or(SchedulerError::NotRegistered(std::any::type_name::<T>()))?;

        let removed = self.systems.remove(position);
        log::debug!("Removed system {}", removed.system.name());
        Ok(())
    }

    /// Whether a system of concrete type `T` is active
    pub fn contains<T: System + 'static>(&self) -> bool {
        self.contains_type(TypeId::of::<T>())
    }

    fn contains_type(&self, type_id: TypeId) -> bool {
        self.systems.iter().any(|entry| entry.type_id == type_id)
    }

    /// Names of the active systems in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|entry| entry.system.name()).collect()
    }

    /// Number of active systems
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no systems are active
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    fn clear(&mut self) {
        self.systems.clear();
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn System>> {
        self.systems.iter_mut().map(|entry| &mut entry.system)
    }
}

/// Builds the system set for a state
pub type StateBuilder = Box<dyn FnMut(GameState, &mut SystemSet) -> Result<(), SchedulerError>>;

/// Runs systems in priority order and drives game-state transitions
pub struct SystemScheduler {
    state: GameState,
    systems: SystemSet,
    events: EventQueue,
    builder: Option<StateBuilder>,
}

impl Default for SystemScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemScheduler {
    /// Create a scheduler in [`GameState::None`] with no systems
    pub fn new() -> Self {
        Self {
            state: GameState::None,
            systems: SystemSet::new(),
            events: EventQueue::new(),
            builder: None,
        }
    }

    /// Install the callback that registers each state's systems
    pub fn with_state_builder<F>(mut self, builder: F) -> Self
    where
        F: FnMut(GameState, &mut SystemSet) -> Result<(), SchedulerError> + 'static,
    {
        self.builder = Some(Box::new(builder));
        self
    }

    /// Current game state
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Tear down the active systems and build the set for `state`
    ///
    /// Entering [`GameState::Quit`] only tears down. If the builder fails the
    /// scheduler is left in `state` with whatever the builder registered.
    pub fn set_state(&mut self, state: GameState) -> Result<(), SchedulerError> {
        log::info!("Game state {:?} -> {:?}", self.state, state);
        self.systems.clear();
        self.state = state;

        if state == GameState::Quit {
            return Ok(());
        }
        let Some(builder) = self.builder.as_mut() else {
            log::warn!("No state builder installed; {:?} has no systems", state);
            return Ok(());
        };

        // A half-built set never stays active
        if let Err(e) = builder(state, &mut self.systems) {
            self.systems.clear();
            log::error!("Failed to enter {:?}: {}", state, e);
            return Err(SchedulerError::StateSetup {
                state,
                reason: e.to_string(),
            });
        }
        log::debug!("{:?} systems: {:?}", state, self.systems.names());
        Ok(())
    }

    /// Register a system into the active set
    pub fn register_system<T: System + 'static>(&mut self, system: T) -> Result<(), SchedulerError> {
        self.systems.register_system(system)
    }

    /// Remove the active system of concrete type `T`
    pub fn remove_system<T: System + 'static>(&mut self) -> Result<(), SchedulerError> {
        self.systems.remove_system::<T>()
    }

    /// The active system set
    pub fn systems(&self) -> &SystemSet {
        &self.systems
    }

    /// Queue an event for the next drain
    pub fn publish(&mut self, event: Event) {
        self.events.publish(event);
    }

    /// The pending event queue
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Drain the event queue through every active system
    ///
    /// A quit event flips the state to [`GameState::Quit`] but leaves the
    /// systems in place so the current frame still completes.
    pub fn process_events(&mut self, world: &mut World, delta_time: f32) {
        while let Some(event) = self.events.poll() {
            if event.event_type == EventType::Quit && self.state != GameState::Quit {
                log::info!("Quit requested");
                self.state = GameState::Quit;
            }
            for system in self.systems.iter_mut() {
                system.handle_event(&event, world, &mut self.events, delta_time);
            }
        }
    }

    /// Run every active system's update in priority order
    pub fn update(&mut self, world: &mut World, delta_time: f32) {
        for system in self.systems.iter_mut() {
            system.update(world, delta_time);
        }
    }

    /// Process events, then update
    pub fn run_frame(&mut self, world: &mut World, delta_time: f32) {
        self.process_events(world, delta_time);
        self.update(world, delta_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KeyCode;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder<const ID: u8> {
        priority: i32,
        log: Log,
    }

    impl<const ID: u8> System for Recorder<ID> {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn handle_event(&mut self, event: &Event, _world: &mut World, events: &mut EventQueue, _dt: f32) {
            self.log.borrow_mut().push(format!("event{}:{:?}", ID, event.event_type));
            // Escape on the first recorder re-publishes as a quit request
            if ID == 0 && event.get_key() == Some(KeyCode::Escape) {
                events.publish(Event::quit());
            }
        }

        fn update(&mut self, _world: &mut World, _dt: f32) {
            self.log.borrow_mut().push(format!("update{}", ID));
        }
    }

    fn recorder<const ID: u8>(priority: i32, log: &Log) -> Recorder<ID> {
        Recorder { priority, log: Rc::clone(log) }
    }

    #[test]
    fn test_update_runs_in_priority_order() {
        let log = Log::default();
        let mut scheduler = SystemScheduler::new();
        scheduler.register_system(recorder::<0>(3, &log)).unwrap();
        scheduler.register_system(recorder::<1>(1, &log)).unwrap();
        scheduler.register_system(recorder::<2>(2, &log)).unwrap();

        scheduler.update(&mut World::new(), 0.016);
        assert_eq!(*log.borrow(), vec!["update1", "update2", "update0"]);
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let log = Log::default();
        let mut scheduler = SystemScheduler::new();
        scheduler.register_system(recorder::<2>(5, &log)).unwrap();
        scheduler.register_system(recorder::<0>(5, &log)).unwrap();
        scheduler.register_system(recorder::<1>(1, &log)).unwrap();

        scheduler.update(&mut World::new(), 0.016);
        assert_eq!(*log.borrow(), vec!["update1", "update2", "update0"]);
    }

    #[test]
    fn test_duplicate_and_missing_registration() {
        let log = Log::default();
        let mut scheduler = SystemScheduler::new();
        scheduler.register_system(recorder::<0>(1, &log)).unwrap();

        assert!(matches!(
            scheduler.register_system(recorder::<0>(2, &log)),
            Err(SchedulerError::AlreadyRegistered(_))
        ));
        assert_eq!(scheduler.systems().len(), 1);

        scheduler.remove_system::<Recorder<0>>().unwrap();
        assert!(matches!(
            scheduler.remove_system::<Recorder<0>>(),
            Err(SchedulerError::NotRegistered(_))
        ));
        assert!(scheduler.systems().is_empty());
    }

    #[test]
    fn test_events_fan_out_and_republished_events_drain_same_pass() {
        let log = Log::default();
        let mut scheduler = SystemScheduler::new();
        scheduler.register_system(recorder::<0>(1, &log)).unwrap();
        scheduler.register_system(recorder::<1>(2, &log)).unwrap();

        scheduler.publish(Event::key_down(KeyCode::Escape));
        scheduler.run_frame(&mut World::new(), 0.016);

        assert_eq!(scheduler.state(), GameState::Quit);
        assert_eq!(
            *log.borrow(),
            vec![
                "event0:KeyDown",
                "event1:KeyDown",
                "event0:Quit",
                "event1:Quit",
                "update0",
                "update1",
            ]
        );
        assert!(scheduler.events_mut().is_empty());
    }

    #[test]
    fn test_state_builder_installs_sets_and_quit_tears_down() {
        let log = Log::default();
        let builder_log = Rc::clone(&log);
        let mut scheduler = SystemScheduler::new().with_state_builder(move |state, set| match state {
            GameState::InGame => {
                set.register_system(recorder::<0>(1, &builder_log))?;
                set.register_system(recorder::<1>(2, &builder_log))
            }
            GameState::PauseMenu => set.register_system(recorder::<2>(1, &builder_log)),
            _ => Ok(()),
        });
        assert_eq!(scheduler.state(), GameState::None);

        scheduler.set_state(GameState::InGame).unwrap();
        assert_eq!(scheduler.systems().len(), 2);
        assert!(scheduler.systems().contains::<Recorder<1>>());

        scheduler.set_state(GameState::PauseMenu).unwrap();
        assert_eq!(scheduler.systems().len(), 1);
        assert!(scheduler.systems().contains::<Recorder<2>>());
        assert!(!scheduler.systems().contains::<Recorder<0>>());

        scheduler.set_state(GameState::Quit).unwrap();
        assert!(scheduler.systems().is_empty());
        assert_eq!(scheduler.state(), GameState::Quit);
    }

    #[test]
    fn test_failed_state_build_leaves_no_systems() {
        let log = Log::default();
        let builder_log = Rc::clone(&log);
        let mut scheduler = SystemScheduler::new().with_state_builder(move |_, set| {
            set.register_system(recorder::<0>(1, &builder_log))?;
            set.register_system(recorder::<0>(2, &builder_log))
        });

        let result = scheduler.set_state(GameState::InGame);

        assert!(matches!(
            result,
            Err(SchedulerError::StateSetup { state: GameState::InGame, .. })
        ));
        assert_eq!(scheduler.state(), GameState::InGame);
        assert!(scheduler.systems().is_empty());
        assert!(scheduler.systems().names().is_empty());
    }
}
