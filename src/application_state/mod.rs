//! # Application State Management
//!
//! This module handles the application's state management, including:
//! - Window and graphics initialization
//! - Input handling and cursor capture
//! - Application lifecycle events
//! - State transitions between initialization and running states

pub mod graphics_resources_builder;
pub mod input_manager;
pub mod input_state;

use std::sync::Arc;

use graphics_resources_builder::{Graphics, MaybeGraphics};
use input_manager::InputManager;
use log::{error, warn};

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::engine_state::EngineState;

/// The main application state container that manages the application's lifecycle.
///
/// Implements `ApplicationHandler` to route window and device events to the
/// engine once graphics are ready.
pub struct ApplicationState {
    /// The current graphics state, which may be initializing, ready, or moved
    pub graphics: MaybeGraphics,

    /// The initialized application state, if the application has started
    pub state: Option<InitializedApplicationState>,

    /// Cached window size for web platforms during initialization
    pub web_window_size: Option<PhysicalSize<u32>>,
}

/// Represents the fully initialized and running state of the application.
pub struct InitializedApplicationState {
    /// The world, the player and the renderer
    pub engine_state: EngineState,

    /// Handle to the application window
    pub window: Arc<Window>,

    /// Manages input state and event processing
    pub input_manager: InputManager,

    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: web_time::Instant,
}

impl ApplicationState {
    /// Creates the state for an application whose graphics are still being built.
    pub fn new(graphics: MaybeGraphics) -> Self {
        Self {
            graphics,
            state: None,
            web_window_size: None,
        }
    }

    /// Handles window resize events during the initialization phase.
    ///
    /// Configures the surface and starts the engine.
    ///
    /// # Arguments
    /// * `size` - The new size of the window in physical pixels
    fn resized(&mut self, event_loop: &ActiveEventLoop, size: PhysicalSize<u32>) {
        let MaybeGraphics::Graphics(gfx) = &mut self.graphics else {
            return;
        };
        let (Some(surface), Some(surface_config), Some(device)) =
            (&gfx.surface, &mut gfx.surface_config, &gfx.device)
        else {
            return;
        };

        surface_config.width = size.width.max(1);
        surface_config.height = size.height.max(1);
        surface.configure(device, surface_config);

        self.initialize_application_state(event_loop);
    }

    /// Moves the graphics resources into a new `EngineState`.
    ///
    /// Exits the event loop if the engine cannot be built.
    fn initialize_application_state(&mut self, event_loop: &ActiveEventLoop) {
        let MaybeGraphics::Graphics(gfx) = &mut self.graphics else {
            return;
        };

        let taken_gfx = std::mem::take(gfx);
        self.graphics = MaybeGraphics::Moved;

        let window = taken_gfx.window.expect("Window is missing");
        let engine_state = EngineState::new(
            taken_gfx.surface.expect("Surface is missing"),
            taken_gfx
                .surface_config
                .expect("Surface configuration is missing"),
            taken_gfx.device.expect("Device is missing"),
            taken_gfx.queue.expect("Queue is missing"),
        );

        match engine_state {
            Ok(engine_state) => {
                self.state = Some(InitializedApplicationState {
                    engine_state,
                    window,
                    input_manager: InputManager::new(),
                    last_wait_time: web_time::Instant::now(),
                });
            }
            Err(err) => {
                error!("Failed to start the engine: {}", err);
                event_loop.exit();
            }
        }
    }
}

impl InitializedApplicationState {
    /// Captures the cursor so mouse motion steers the view.
    fn lock_cursor(&mut self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));

        match grabbed {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                self.engine_state.set_cursor_locked(true);
            }
            Err(err) => warn!("Could not capture the cursor: {}", err),
        }
    }

    fn unlock_cursor(&mut self) {
        if let Err(err) = self.window.set_cursor_grab(CursorGrabMode::None) {
            warn!("Could not release the cursor: {}", err);
        }
        self.window.set_cursor_visible(true);
        self.engine_state.set_cursor_locked(false);
    }
}

fn is_exit_request(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    ..
                },
                ..
            }
    )
}

impl ApplicationHandler<Graphics> for ApplicationState {
    /// Handles window-related events such as resize, focus changes, and input events.
    ///
    /// # Arguments
    /// * `event_loop` - Reference to the active event loop
    /// * `_window_id` - ID of the window that generated the event
    /// * `event` - The window event to process
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if is_exit_request(&event) {
            event_loop.exit();
            return;
        }

        if let Some(state) = &mut self.state {
            state.input_manager.intake_input(&event);

            match event {
                WindowEvent::Resized(size) => {
                    state.engine_state.resize_surface(size);
                }
                WindowEvent::Focused(false) => {
                    state.input_manager.release_all();
                    state.unlock_cursor();
                }
                WindowEvent::RedrawRequested => {
                    state.engine_state.render();
                }
                _ => (),
            }
        } else if let WindowEvent::Resized(size) = event {
            self.web_window_size = Some(size);
            self.resized(event_loop, size);
        }
    }

    /// Handles raw mouse motion, which keeps arriving while the cursor is captured.
    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state {
            if let DeviceEvent::MouseMotion { delta } = event {
                state.input_manager.intake_mouse_motion(delta);
            }
        }
    }

    /// Starts building graphics the first time the application resumes.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let MaybeGraphics::Builder(builder) = &mut self.graphics {
            builder.build_and_send(event_loop);
        }
    }

    /// Receives the finished graphics and starts the engine if the surface is ready.
    ///
    /// On the web the surface waits for the first resize instead.
    fn user_event(&mut self, event_loop: &ActiveEventLoop, graphics: Graphics) {
        let is_surface_configured = graphics.is_surface_configured;

        self.graphics = MaybeGraphics::Graphics(graphics);

        if is_surface_configured {
            self.initialize_application_state(event_loop);
        } else if let Some(size) = self.web_window_size {
            self.resized(event_loop, size);
        }
    }

    /// Runs one simulation frame and requests the redraw that presents it.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            let now = web_time::Instant::now();
            let wait_dt = now - state.last_wait_time;

            let processed_input = state.input_manager.get_and_reset_processed_input();
            state.engine_state.set_input_commands(processed_input);
            if state.engine_state.wants_cursor_lock() {
                state.lock_cursor();
            }

            state.engine_state.process_input(wait_dt);
            state.last_wait_time = now;

            state.engine_state.process_tasks();
            state.window.request_redraw();
        }
    }
}
