#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Sandbox
//!
//! A small block-building sandbox rendered with WGPU: procedurally generated
//! terrain streamed in chunks around a first-person player who can walk,
//! jump, and remove or place blocks.
//!
//! ## Key Modules
//!
//! * `application_state` - Manages the application lifecycle, window and input
//! * `core` - Shared-ownership helpers used throughout the engine
//! * `engine_state` - The world, the player, physics, persistence and rendering
//!
//! ## Architecture
//!
//! The simulation is independent of the GPU: the voxel world reports what
//! changed as render commands, and the renderer mirrors those into one
//! instance buffer per chunk and block type. Everything runs on the main
//! thread; chunk generation is deferred into a frame-budgeted queue.
//!
//! ## Usage
//!
//! ```no_run
//! // Native application initialization
//! voxel_sandbox::run();
//! ```
//!
//! On the web, `run_web` is exported through `wasm_bindgen` and draws into
//! the canvas with id `wgpu-canvas`.

use application_state::{
    graphics_resources_builder::{GraphicsBuilder, MaybeGraphics},
    ApplicationState,
};
#[cfg(target_family = "wasm")]
use wasm_bindgen::prelude::wasm_bindgen;

use log::info;
use winit::event_loop::EventLoop;

mod application_state;
pub mod core;
pub mod engine_state;

#[cfg(target_family = "wasm")]
const CANVAS_ID: &str = "wgpu-canvas";

#[cfg(not(target_family = "wasm"))]
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");
    let event_loop = EventLoop::with_user_event()
        .build()
        .expect("Failed to create event loop");

    let mut state =
        ApplicationState::new(MaybeGraphics::Builder(GraphicsBuilder::new(event_loop.create_proxy())));

    if let Err(err) = event_loop.run_app(&mut state) {
        log::error!("Event loop terminated: {}", err);
    }
}

#[cfg(target_family = "wasm")]
#[wasm_bindgen]
pub fn run_web() {
    use winit::platform::web::EventLoopExtWebSys;

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    console_log::init_with_level(log::Level::Info).expect("Couldn't initialize logger");
    info!("Logger initialized");

    let event_loop = EventLoop::with_user_event()
        .build()
        .expect("Failed to create event loop");

    let state =
        ApplicationState::new(MaybeGraphics::Builder(GraphicsBuilder::new(event_loop.create_proxy())));

    event_loop.spawn_app(state);
}
