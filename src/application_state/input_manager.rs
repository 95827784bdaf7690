//! # Input Manager
//!
//! This module handles input processing for the application, including:
//! - Keyboard input state tracking
//! - Mouse button and motion tracking
//! - Input event processing
//!
//! Only the keys the sandbox binds are tracked; everything else is ignored.

use std::collections::HashMap;

use winit::{
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::input_state::{MouseInput, ProcessedInputState, RawInputState};

const KEY_CODES: [KeyCode; 18] = [
    KeyCode::KeyW,
    KeyCode::KeyS,
    KeyCode::KeyA,
    KeyCode::KeyD,
    KeyCode::KeyR,
    KeyCode::Space,
    KeyCode::F1,
    KeyCode::F2,
    KeyCode::F3,
    KeyCode::Digit0,
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
];

const MOUSE_BUTTONS: [MouseButton; 2] = [MouseButton::Left, MouseButton::Right];

/// Manages the state of all input devices and processes input events.
///
/// This struct keeps the previous and current pressed state of every tracked
/// key so that each frame can tell presses from holds.
pub struct InputManager {
    /// Previous state of all tracked keyboard keys
    pub keyboard_inputs_old: HashMap<KeyCode, bool>,
    /// Current state of all tracked keyboard keys
    pub keyboard_inputs_new: HashMap<KeyCode, bool>,

    /// Current state of mouse inputs
    pub mouse_inputs: MouseInput,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    /// Creates a new InputManager with every tracked key released.
    pub fn new() -> Self {
        let keyboard_inputs_old: HashMap<_, _> = KEY_CODES.iter().map(|key| (*key, false)).collect();
        let keyboard_inputs_new = keyboard_inputs_old.clone();

        let mouse_button_inputs_old: HashMap<_, _> =
            MOUSE_BUTTONS.iter().map(|button| (*button, false)).collect();
        let mouse_button_inputs_new = mouse_button_inputs_old.clone();

        Self {
            keyboard_inputs_old,
            keyboard_inputs_new,
            mouse_inputs: MouseInput {
                mouse_button_inputs_old,
                mouse_button_inputs_new,
                mouse_delta: None,
            },
        }
    }

    /// Updates the old state with the current state to prepare for the next frame.
    pub fn move_old_states(&mut self) {
        for (key, new_state) in self.keyboard_inputs_new.iter() {
            if let Some(old_state) = self.keyboard_inputs_old.get_mut(key) {
                *old_state = *new_state;
            }
        }

        for (button, new_state) in self.mouse_inputs.mouse_button_inputs_new.iter() {
            if let Some(old_state) = self.mouse_inputs.mouse_button_inputs_old.get_mut(button) {
                *old_state = *new_state;
            }
        }
    }

    /// Processes a window event and updates internal input state.
    ///
    /// # Arguments
    /// * `event` - The window event to process
    pub fn intake_input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => {
                if let Some(key_state) = self.keyboard_inputs_new.get_mut(key) {
                    *key_state = *state == ElementState::Pressed;
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(button_state) =
                    self.mouse_inputs.mouse_button_inputs_new.get_mut(button)
                {
                    *button_state = *state == ElementState::Pressed;
                }
            }
            _ => {}
        }
    }

    /// Adds raw mouse motion to this frame's delta.
    ///
    /// Several motion events usually arrive between two frames.
    ///
    /// # Arguments
    /// * `delta` - The (x, y) delta of mouse movement since the last event
    pub fn intake_mouse_motion(&mut self, delta: (f64, f64)) {
        let (x, y) = self.mouse_inputs.mouse_delta.unwrap_or((0.0, 0.0));
        self.mouse_inputs.mouse_delta = Some((x + delta.0, y + delta.1));
    }

    /// Translates the raw boolean states into pressed/held/released states.
    pub fn create_processed_input_state(&self) -> ProcessedInputState {
        let keyboard_states = self
            .keyboard_inputs_new
            .iter()
            .map(|(key, &new_state)| {
                let old_state = self.keyboard_inputs_old.get(key).copied().unwrap_or(false);
                (*key, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        let mouse_inputs = &self.mouse_inputs;
        let mouse_button_states = mouse_inputs
            .mouse_button_inputs_new
            .iter()
            .map(|(button, &new_state)| {
                let old_state = mouse_inputs
                    .mouse_button_inputs_old
                    .get(button)
                    .copied()
                    .unwrap_or(false);
                (*button, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        ProcessedInputState {
            keyboard_states,
            mouse_button_states,
            mouse_delta: mouse_inputs.mouse_delta,
        }
    }

    /// Returns this frame's processed input state and advances to the next frame.
    pub fn get_and_reset_processed_input(&mut self) -> ProcessedInputState {
        let processed_input = self.create_processed_input_state();
        self.reset_inputs();
        processed_input
    }

    /// Advances the frame: current states become old, motion is cleared.
    pub fn reset_inputs(&mut self) {
        self.move_old_states();
        self.mouse_inputs.mouse_delta = None;
    }

    /// Releases every key and button.
    ///
    /// Called when the window loses focus, since the release events will
    /// never arrive.
    pub fn release_all(&mut self) {
        self.keyboard_inputs_new.values_mut().for_each(|state| *state = false);
        self.mouse_inputs
            .mouse_button_inputs_new
            .values_mut()
            .for_each(|state| *state = false);
        self.mouse_inputs.mouse_delta = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(manager: &mut InputManager, key: KeyCode, pressed: bool) {
        manager.keyboard_inputs_new.insert(key, pressed);
    }

    #[test]
    fn a_key_is_pressed_then_held_then_released() {
        let mut manager = InputManager::new();

        press(&mut manager, KeyCode::KeyW, true);
        let first = manager.get_and_reset_processed_input();
        assert_eq!(first.get_key_state(KeyCode::KeyW), RawInputState::Pressed);

        let second = manager.get_and_reset_processed_input();
        assert_eq!(second.get_key_state(KeyCode::KeyW), RawInputState::Held);

        press(&mut manager, KeyCode::KeyW, false);
        let third = manager.get_and_reset_processed_input();
        assert_eq!(third.get_key_state(KeyCode::KeyW), RawInputState::Released);
    }

    #[test]
    fn untracked_keys_read_as_not_pressed() {
        let manager = InputManager::new();
        let state = manager.create_processed_input_state();

        assert_eq!(state.get_key_state(KeyCode::KeyQ), RawInputState::NotPressed);
    }

    #[test]
    fn mouse_motion_accumulates_until_the_frame_ends() {
        let mut manager = InputManager::new();
        manager.intake_mouse_motion((3.0, 1.0));
        manager.intake_mouse_motion((-1.0, 2.0));

        let state = manager.get_and_reset_processed_input();
        assert_eq!(state.get_mouse_delta(), Some((2.0, 3.0)));
        assert_eq!(manager.create_processed_input_state().get_mouse_delta(), None);
    }

    #[test]
    fn losing_focus_releases_held_keys() {
        let mut manager = InputManager::new();
        press(&mut manager, KeyCode::Space, true);
        manager.reset_inputs();

        manager.release_all();
        let state = manager.get_and_reset_processed_input();
        assert_eq!(state.get_key_state(KeyCode::Space), RawInputState::Released);
    }
}
