//! # Engine State Module
//!
//! The core engine module that owns the simulation and drives it once per frame.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `voxels` - Voxel data, chunks, world streaming and editing
//! * `player` / `physics` - The first-person player and its fixed-rate collision
//! * `persistence` - Saving and loading the player's edits
//! * `buffer_state` / `camera_state` / `rendering` - The GPU mirror of the world
//! * `task_management` - Frame-budgeted deferred work
//!
//! ## Frame Order
//!
//! 1. Translate input into a [`PlayerAction`] and apply it to the player
//! 2. Step physics against the current world
//! 3. Stream chunks around the player and run queued generation within budget
//! 4. Apply the world's render commands to the GPU buffers
//! 5. Move the camera to the player's eye and draw

use std::time::Duration;

use camera_state::{camera, CameraState};
use log::{error, info, warn};
use persistence::KeyValueStorage;
use physics::Physics;
use player::{MovementKeys, Player};
use rendering::{InstanceRendererManager, PipelineError};
use voxels::{params::GenerationParams, world::World};
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::{event::MouseButton, keyboard::KeyCode};

use crate::{application_state::input_state::ProcessedInputState, core::StResource};

pub mod buffer_state;
pub mod camera_state;
pub mod persistence;
pub mod physics;
pub mod player;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Time per frame spent generating deferred chunks.
pub const GENERATION_BUDGET: Duration = Duration::from_millis(8);

/// Number keys in toolbar order; the index is the selected digit.
const DIGIT_KEYS: [KeyCode; 9] = [
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

/// The main state container for the engine
///
/// This struct owns the world and the player and coordinates their
/// interaction with input, physics, persistence and rendering.
pub struct EngineState {
    pub world: World,
    pub player: Player,
    pub physics: Physics,
    /// Current player actions derived from input
    pub player_actions: PlayerAction,
    /// Save slot; `None` if the platform has no usable storage
    storage: Option<Box<dyn KeyValueStorage>>,
    /// Buffer state for managing GPU buffers
    pub buffer_state: StResource<buffer_state::BufferState>,
    /// Camera uniform kept in step with the player
    pub camera_state: CameraState,
    /// Manager for rendering operations
    pub render_manager: InstanceRendererManager,
    /// Whether mouse motion currently steers the view
    cursor_locked: bool,
}

impl EngineState {
    /// Creates a new engine state with all subsystems initialized
    ///
    /// # Arguments
    ///
    /// * `surface` - The rendering surface
    /// * `surface_config` - Configuration for the rendering surface
    /// * `device` - The GPU device
    /// * `queue` - The GPU command queue
    ///
    /// # Returns
    ///
    /// A fully initialized `EngineState`, or the error that kept the render
    /// pipeline from being built
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: Device,
        queue: Queue,
    ) -> Result<Self, PipelineError> {
        let device = StResource::new(device);
        let queue = StResource::new(queue);

        let buffer_state = StResource::new(buffer_state::BufferState::new(
            device.clone(),
            queue.clone(),
        ));

        let camera_projection = camera::Projection::new(
            surface_config.width,
            surface_config.height,
            camera::FOVY,
            camera::ZNEAR,
            camera::ZFAR,
        );

        let player = Player::default();
        let camera_state = CameraState::new(buffer_state.clone(), &player, &camera_projection);

        let render_manager = InstanceRendererManager::new(
            surface,
            surface_config,
            device,
            queue,
            buffer_state.clone(),
            camera_projection,
        )?;

        let storage = match persistence::default_storage() {
            Ok(storage) => Some(storage),
            Err(err) => {
                warn!("Saving is disabled: {}", err);
                None
            }
        };

        let mut world = World::new(GenerationParams::default());
        world.update(player.position);

        Ok(Self {
            world,
            player,
            physics: Physics::new(),
            player_actions: PlayerAction::default(),
            storage,
            buffer_state,
            camera_state,
            render_manager,
            cursor_locked: false,
        })
    }

    /// Resizes the rendering surface when the window size changes
    ///
    /// # Arguments
    ///
    /// * `size` - The new physical size of the window
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        self.render_manager.resize_surface(size);
    }

    /// Renders the current frame
    pub fn render(&mut self) {
        self.camera_state
            .update(&self.player, &self.render_manager.camera_projection);
        self.render_manager.render();
    }

    /// Runs queued chunk generation within the frame budget and uploads
    /// whatever the world changed this frame.
    pub fn process_tasks(&mut self) {
        self.world.process_generation_tasks(GENERATION_BUDGET);

        let commands = self.world.drain_render_commands();
        self.buffer_state
            .get_mut()
            .apply_render_commands(commands, &self.world);
    }

    /// Applies the current actions and advances the simulation.
    ///
    /// # Arguments
    ///
    /// * `wait_duration` - The time elapsed since the last frame
    pub fn process_input(&mut self, wait_duration: web_time::Duration) {
        let actions = std::mem::take(&mut self.player_actions);

        self.player.set_movement(actions.movement);
        if let Some((delta_x, delta_y)) = actions.rotate_view {
            self.player.rotate(delta_x, delta_y);
        }
        if actions.jump {
            self.player.jump();
        }
        if actions.reset_player {
            self.player.reset();
        }
        if let Some(digit) = actions.select_digit {
            if self.player.select_digit(digit) {
                info!("Selected {}", self.player.selected_block);
            }
        }
        if actions.edit {
            self.apply_edit();
        }
        if actions.save {
            self.save();
        }
        if actions.load {
            self.load();
        }

        self.physics
            .update(wait_duration.as_secs_f32(), &mut self.player, &self.world);
        self.world.update(self.player.position);

        // Movement keys are levels, not edges: keep them for the next frame.
        self.player_actions.movement = actions.movement;
    }

    /// Removes the targeted voxel, or places the selected block in front of it.
    fn apply_edit(&mut self) {
        let Some(hit) = self.player.target(&self.world) else {
            return;
        };

        let block = self.player.selected_block;
        if block.is_empty() {
            let p = hit.block;
            self.world.remove_block(p.x, p.y, p.z);
        } else {
            let p = hit.adjacent();
            self.world.add_block(p.x, p.y, p.z, block);
        }
    }

    fn save(&mut self) {
        let Some(storage) = self.storage.as_deref_mut() else {
            warn!("No storage available, not saving");
            return;
        };
        if let Err(err) = persistence::save(&self.world, storage) {
            error!("Failed to save world: {}", err);
        }
    }

    fn load(&mut self) {
        let Some(storage) = self.storage.as_deref() else {
            warn!("No storage available, not loading");
            return;
        };
        if let Err(err) = persistence::load(&mut self.world, storage) {
            error!("Failed to load world: {}", err);
        }
    }

    /// Records whether the cursor is captured by the window.
    pub fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
    }

    /// Sets the input commands for the engine state.
    ///
    /// # Arguments
    /// * `input` - The processed input state to use for setting commands
    pub fn set_input_commands(&mut self, input: ProcessedInputState) {
        self.player_actions = translate_processed_input(&input, self.cursor_locked);

        if self.player_actions.log_buffer_data {
            let buffer_state = self.buffer_state.get();
            info!(
                "{} instances, {} bytes allocated, {} bytes used",
                buffer_state.instance_count(),
                buffer_state.get_total_allocated_memory(),
                buffer_state.get_total_used_memory()
            );
        }
    }

    /// Whether this frame's click asked to capture the cursor.
    pub fn wants_cursor_lock(&self) -> bool {
        self.player_actions.request_cursor_lock
    }
}

/// Translates the processed input state into player actions.
///
/// # Arguments
/// * `input` - The processed input state to translate
/// * `cursor_locked` - Mouse look and clicking only act on a captured cursor
pub fn translate_processed_input(input: &ProcessedInputState, cursor_locked: bool) -> PlayerAction {
    let mut player_action = PlayerAction {
        movement: MovementKeys {
            forward: input.get_key_state(KeyCode::KeyW).is_active(),
            backward: input.get_key_state(KeyCode::KeyS).is_active(),
            left: input.get_key_state(KeyCode::KeyA).is_active(),
            right: input.get_key_state(KeyCode::KeyD).is_active(),
        },
        jump: input.get_key_state(KeyCode::Space).is_active(),
        reset_player: input.get_key_state(KeyCode::KeyR).is_just_pressed(),
        save: input.get_key_state(KeyCode::F1).is_just_pressed(),
        load: input.get_key_state(KeyCode::F2).is_just_pressed(),
        log_buffer_data: input.get_key_state(KeyCode::F3).is_just_pressed(),
        ..PlayerAction::default()
    };

    player_action.select_digit = DIGIT_KEYS
        .iter()
        .position(|key| input.get_key_state(*key).is_just_pressed())
        .map(|digit| digit as u8);

    let clicked = input
        .get_mouse_button_state(MouseButton::Left)
        .is_just_pressed();
    if cursor_locked {
        player_action.rotate_view = input.get_mouse_delta();
        player_action.edit = clicked;
    } else {
        player_action.request_cursor_lock = clicked;
    }

    player_action
}

/// Represents player actions derived from input
///
/// Movement and jump follow the held keys; everything else only triggers on
/// the frame its key goes down.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlayerAction {
    pub movement: MovementKeys,
    pub jump: bool,
    pub reset_player: bool,
    /// View rotation - Some if the cursor is captured and the mouse moved
    pub rotate_view: Option<(f64, f64)>,
    pub select_digit: Option<u8>,
    /// Apply the selected tool to the targeted voxel
    pub edit: bool,
    pub save: bool,
    pub load: bool,
    pub log_buffer_data: bool,
    pub request_cursor_lock: bool,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::application_state::input_state::RawInputState;

    fn input(keys: &[(KeyCode, RawInputState)], left: RawInputState) -> ProcessedInputState {
        ProcessedInputState {
            keyboard_states: keys.iter().copied().collect(),
            mouse_button_states: HashMap::from([(MouseButton::Left, left)]),
            mouse_delta: Some((4.0, -2.0)),
        }
    }

    #[test]
    fn held_keys_move_and_pressed_keys_trigger_once() {
        let state = input(
            &[
                (KeyCode::KeyW, RawInputState::Held),
                (KeyCode::KeyA, RawInputState::Pressed),
                (KeyCode::KeyR, RawInputState::Held),
                (KeyCode::F1, RawInputState::Pressed),
                (KeyCode::Digit3, RawInputState::Pressed),
            ],
            RawInputState::NotPressed,
        );

        let action = translate_processed_input(&state, true);

        assert!(action.movement.forward && action.movement.left);
        assert!(!action.movement.backward && !action.movement.right);
        assert!(!action.reset_player);
        assert!(action.save && !action.load);
        assert_eq!(action.select_digit, Some(3));
    }

    #[test]
    fn the_first_click_captures_the_cursor_instead_of_editing() {
        let state = input(&[], RawInputState::Pressed);

        let unlocked = translate_processed_input(&state, false);
        assert!(unlocked.request_cursor_lock);
        assert!(!unlocked.edit);
        assert_eq!(unlocked.rotate_view, None);

        let locked = translate_processed_input(&state, true);
        assert!(!locked.request_cursor_lock);
        assert!(locked.edit);
        assert_eq!(locked.rotate_view, Some((4.0, -2.0)));
    }

    #[test]
    fn digit_zero_selects_the_remove_tool() {
        let state = input(&[(KeyCode::Digit0, RawInputState::Pressed)], RawInputState::NotPressed);

        assert_eq!(translate_processed_input(&state, true).select_digit, Some(0));
    }
}
