//! Engine events and the FIFO event queue
//!
//! Events are produced by the platform layer (or by systems reacting to
//! other events) and drained once per frame by the scheduler, which hands
//! each one to every active system in priority order.

use std::collections::VecDeque;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Application close requested
    Quit,
    /// Key was pressed
    KeyDown,
    /// Key was released
    KeyUp,
    /// Relative mouse movement
    MouseMotion,
}

/// Keys the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Escape
    Escape,
    /// W
    W,
    /// A
    A,
    /// S
    S,
    /// D
    D,
    /// Space bar
    Space,
    /// Left shift
    LeftShift,
    /// Left control
    LeftCtrl,
    /// Any other key, by platform scancode
    Other(u32),
}

/// Data carried by an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventPayload {
    /// No data
    None,
    /// Key code for key events
    Key(KeyCode),
    /// Mouse delta in pixels
    MouseMotion {
        /// Horizontal delta
        dx: f32,
        /// Vertical delta, positive downwards
        dy: f32,
    },
}

/// Event with type and payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    /// Event data
    pub payload: EventPayload,
}

impl Event {
    /// Create a new event
    pub fn new(event_type: EventType, payload: EventPayload) -> Self {
        Self { event_type, payload }
    }

    /// Quit request
    pub fn quit() -> Self {
        Self::new(EventType::Quit, EventPayload::None)
    }

    /// Key press
    pub fn key_down(key: KeyCode) -> Self {
        Self::new(EventType::KeyDown, EventPayload::Key(key))
    }

    /// Key release
    pub fn key_up(key: KeyCode) -> Self {
        Self::new(EventType::KeyUp, EventPayload::Key(key))
    }

    /// Relative mouse movement
    pub fn mouse_motion(dx: f32, dy: f32) -> Self {
        Self::new(EventType::MouseMotion, EventPayload::MouseMotion { dx, dy })
    }

    /// Get key argument if present
    pub fn get_key(&self) -> Option<KeyCode> {
        if let EventPayload::Key(key) = self.payload {
            Some(key)
        } else {
            None
        }
    }

    /// Get mouse delta argument if present
    pub fn get_mouse_delta(&self) -> Option<(f32, f32)> {
        if let EventPayload::MouseMotion { dx, dy } = self.payload {
            Some((dx, dy))
        } else {
            None
        }
    }
}

/// First-in first-out event queue
#[derive(Debug, Default)]
pub struct EventQueue {
    queue: VecDeque<Event>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn publish(&mut self, event: Event) {
        log::trace!("Published {:?}", event);
        self.queue.push_back(event);
    }

    /// Take the oldest event
    pub fn poll(&mut self) -> Option<Event> {
        self.queue.pop_front()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no events are pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop all pending events
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
