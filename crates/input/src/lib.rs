//! Keyboard and mouse state for the bridge main screen.

use glam::Vec2;
use std::collections::HashSet;

/// Per-frame input state. `begin_frame` clears edge-triggered sets so
/// "pressed" queries fire exactly once per key press.
#[derive(Debug, Default)]
pub struct InputState {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    mouse_held: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,

    mouse_position: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear edge-triggered state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
    }

    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_held.contains(&button) {
                    self.mouse_pressed.insert(button);
                }
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
            }
        }
    }

    pub fn process_cursor_position(&mut self, position: (f64, f64)) {
        self.mouse_position = Vec2::new(position.0 as f32, position.1 as f32);
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// Cursor position in window coordinates, for HUD hit-testing.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    // ── Helm ───────────────────────────────────────────────────────────

    /// Requested impulse throttle delta: W = ahead, S = astern.
    pub fn impulse_input(&self) -> f32 {
        let mut throttle = 0.0;
        if self.is_key_held(KeyCode::KeyW) {
            throttle += 1.0;
        }
        if self.is_key_held(KeyCode::KeyS) {
            throttle -= 1.0;
        }
        throttle
    }

    /// Rudder input: A = port, D = starboard.
    pub fn rudder_input(&self) -> f32 {
        let mut rudder = 0.0;
        if self.is_key_held(KeyCode::KeyA) {
            rudder += 1.0;
        }
        if self.is_key_held(KeyCode::KeyD) {
            rudder -= 1.0;
        }
        rudder
    }

    // ── Camera ─────────────────────────────────────────────────────────

    /// Camera look input from the arrow keys: x = yaw, y = pitch.
    pub fn look_input(&self) -> Vec2 {
        let mut look = Vec2::ZERO;
        if self.is_key_held(KeyCode::ArrowLeft) {
            look.x += 1.0;
        }
        if self.is_key_held(KeyCode::ArrowRight) {
            look.x -= 1.0;
        }
        if self.is_key_held(KeyCode::ArrowUp) {
            look.y += 1.0;
        }
        if self.is_key_held(KeyCode::ArrowDown) {
            look.y -= 1.0;
        }
        look
    }

    // ── Viewport toggles ───────────────────────────────────────────────

    /// Toggle callsign overlay (C).
    pub fn is_toggle_callsigns_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::KeyC)
    }

    /// Toggle heading ring (H).
    pub fn is_toggle_headings_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::KeyH)
    }

    /// Toggle space dust (G).
    pub fn is_toggle_spacedust_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::KeyG)
    }

    /// Cycle the weapons lock to the next hostile (T).
    pub fn is_cycle_target_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::KeyT)
    }

    /// Quit (Escape).
    pub fn is_quit_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::Escape)
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;
