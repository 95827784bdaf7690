//! Rendering system for the voxel sandbox.
//!
//! This module owns the surface and draws the world as instanced cubes: one
//! instance per visible voxel, one draw per `(chunk, block)` batch, colored
//! from the block table, with a translucent water plane over each loaded
//! chunk. The instance buffers themselves live in the
//! [`BufferState`], which the voxel world keeps in sync through render
//! commands.

use log::{error, warn};
use pipeline_manager::PipelineManager;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration, SurfaceError};

use crate::core::StResource;

use super::{buffer_state::BufferState, camera_state::camera};

mod bind_group_state;
mod instance_renderer;
mod pipeline_manager;
mod texture;
mod vertex;
mod water_renderer;

pub use pipeline_manager::PipelineError;

/// WGSL source of the instanced cube pipeline.
pub const INSTANCED_CUBE_SHADER: &str = include_str!("shaders/instanced_cube.wgsl");
/// WGSL source of the water pipeline.
pub const WATER_SHADER: &str = include_str!("shaders/water.wgsl");

/// Manages the entire rendering pipeline.
///
/// This struct is the main entry point for all rendering operations.
/// It manages the WebGPU surface, device, queue, and rendering pipeline.
pub struct InstanceRendererManager {
    /// The WebGPU surface being rendered to
    pub surface: Surface<'static>,
    /// Configuration for the surface (size, format, etc.)
    pub surface_config: SurfaceConfiguration,
    pub device: StResource<Device>,
    pub queue: StResource<Queue>,
    pub pipeline_manager: PipelineManager,
    /// Camera projection settings
    pub camera_projection: camera::Projection,
}

impl InstanceRendererManager {
    /// Creates a new `InstanceRendererManager` instance.
    ///
    /// # Arguments
    /// * `surface` - The WebGPU surface to render to
    /// * `surface_config` - Configuration for the surface
    /// * `device` - The WebGPU device
    /// * `queue` - The WebGPU queue
    /// * `buffer_state` - Buffer state already holding the camera uniform
    /// * `camera_projection` - Initial camera projection settings
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: StResource<Device>,
        queue: StResource<Queue>,
        buffer_state: StResource<BufferState>,
        camera_projection: camera::Projection,
    ) -> Result<Self, PipelineError> {
        let pipeline_manager = PipelineManager::new(
            &device.get(),
            &surface_config,
            buffer_state,
            INSTANCED_CUBE_SHADER,
            WATER_SHADER,
        )?;

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline_manager,
            camera_projection,
        })
    }

    /// Handles window resize events.
    ///
    /// Updates the surface configuration, camera projection, and depth buffer
    /// to match the new window size. Zero sizes (minimized windows) are ignored.
    ///
    /// # Arguments
    /// * `size` - The new window size in physical pixels
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;

        self.reconfigure();

        self.camera_projection.resize(size.width, size.height);
        self.pipeline_manager
            .resize(&self.device.get(), &self.surface_config);
    }

    fn reconfigure(&mut self) {
        self.surface
            .configure(&self.device.get(), &self.surface_config);
    }

    /// Renders a new frame.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render(&mut self) {
        let result = self.pipeline_manager.render(
            &self.surface,
            &self.device.get(),
            &self.queue.get(),
        );

        match result {
            Ok(()) => {}
            Err(SurfaceError::Lost | SurfaceError::Outdated) => self.reconfigure(),
            Err(SurfaceError::Timeout) => warn!("Timed out acquiring a frame"),
            Err(err) => error!("Error getting current frame: {:?}", err),
        }
    }
}
