//! Input handling
//!
//! Tracks which keys are held from key events and flies the shared camera.
//! Escape requests shutdown by publishing a quit event.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::config::InputConfig;
use crate::ecs::{System, World, INPUT_PRIORITY};
use crate::events::{Event, EventQueue, EventType, KeyCode};
use crate::render::{Camera, CameraMovement};

/// Key bindings for camera flight
const MOVEMENT_BINDINGS: [(KeyCode, CameraMovement); 6] = [
    (KeyCode::W, CameraMovement::Forward),
    (KeyCode::S, CameraMovement::Backward),
    (KeyCode::A, CameraMovement::Left),
    (KeyCode::D, CameraMovement::Right),
    (KeyCode::Space, CameraMovement::Up),
    (KeyCode::LeftShift, CameraMovement::Down),
];

/// Held while moving to multiply the flight speed
const SPRINT_KEY: KeyCode = KeyCode::LeftCtrl;

/// Turns key and mouse events into camera motion
pub struct InputSystem {
    config: InputConfig,
    camera: Rc<RefCell<Camera>>,
    pressed: HashSet<KeyCode>,
}

impl InputSystem {
    /// Create an input system steering `camera`
    pub fn new(config: InputConfig, camera: Rc<RefCell<Camera>>) -> Self {
        Self {
            config,
            camera,
            pressed: HashSet::new(),
        }
    }

    /// Whether `key` is currently held
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    fn current_speed(&self) -> f32 {
        if self.is_pressed(SPRINT_KEY) {
            self.config.move_speed * self.config.sprint_multiplier
        } else {
            self.config.move_speed
        }
    }
}

impl System for InputSystem {
    fn name(&self) -> &'static str {
        "InputSystem"
    }

    fn priority(&self) -> i32 {
        INPUT_PRIORITY
    }

    fn handle_event(&mut self, event: &Event, _world: &mut World, events: &mut EventQueue, _delta_time: f32) {
        match event.event_type {
            EventType::KeyDown => {
                if let Some(key) = event.get_key() {
                    self.pressed.insert(key);
                    if key == KeyCode::Escape {
                        log::info!("Escape pressed, requesting quit");
                        events.publish(Event::quit());
                    }
                }
            }
            EventType::KeyUp => {
                if let Some(key) = event.get_key() {
                    self.pressed.remove(&key);
                }
            }
            EventType::MouseMotion => {
                if let Some((dx, dy)) = event.get_mouse_delta() {
                    self.camera.borrow_mut().process_mouse(dx, dy, self.config.mouse_sensitivity);
                }
            }
            EventType::Quit => {}
        }
    }

    fn update(&mut self, _world: &mut World, delta_time: f32) {
        let speed = self.current_speed();
        let mut camera = self.camera.borrow_mut();
        for (key, direction) in MOVEMENT_BINDINGS {
            if self.pressed.contains(&key) {
                camera.process_keyboard(direction, delta_time, speed);
            }
        }
    }
}
