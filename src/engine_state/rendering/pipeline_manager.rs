//! Manages the render pass and the resources shared by it.
//!
//! # Architecture
//!
//! - `PipelineManager`: owns the depth buffer and bind groups and runs the pass
//! - `InstanceRenderer`: records the instanced cube draws into that pass
//! - `WaterRenderer`: blends the water planes over the cubes
//!
//! One frame is a single pass: clear to the sky color, draw every live
//! instance batch, blend the water on top, present.

use log::warn;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration, SurfaceError};

use crate::{
    core::StResource,
    engine_state::{buffer_state::BufferState, camera_state::CAMERA_BUFFER_NAME},
};

use super::{
    bind_group_state::BindGroupState, instance_renderer::InstanceRenderer, texture::DepthTexture,
    water_renderer::WaterRenderer,
};

/// Sky color, `0x80a0e0`, in linear space.
pub const SKY_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2158605,
    g: 0.3515326,
    b: 0.7454042,
    a: 1.0,
};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("camera buffer has not been created")]
    MissingCameraBuffer,
}

pub struct PipelineManager {
    /// Holds the camera bind group
    pub bind_group_state: BindGroupState,
    /// Shared state for buffer management
    pub buffer_state: StResource<BufferState>,
    /// Depth texture used for depth testing
    pub depth_texture: DepthTexture,
    pub instance_renderer: InstanceRenderer,
    pub water_renderer: WaterRenderer,
}

impl PipelineManager {
    /// Creates a new `PipelineManager` instance.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `config` - Surface configuration containing size and format
    /// * `buffer_state` - Shared state for buffer management; must already hold the camera buffer
    /// * `cube_shader` - The WGSL source of the instanced cube shader
    /// * `water_shader` - The WGSL source of the water shader
    pub fn new(
        device: &Device,
        config: &SurfaceConfiguration,
        buffer_state: StResource<BufferState>,
        cube_shader: &str,
        water_shader: &str,
    ) -> Result<Self, PipelineError> {
        let bind_group_state = {
            let buffers = buffer_state.get();
            let camera_buffer = buffers
                .get_buffer(CAMERA_BUFFER_NAME)
                .ok_or(PipelineError::MissingCameraBuffer)?;
            BindGroupState::new(device, camera_buffer)
        };

        let depth_texture = DepthTexture::new(device, config, "DEPTH TEXTURE");

        let instance_renderer = InstanceRenderer::new(
            device,
            buffer_state.clone(),
            cube_shader,
            config.format,
            &bind_group_state,
        );
        let water_renderer = WaterRenderer::new(
            device,
            buffer_state.clone(),
            water_shader,
            config.format,
            &bind_group_state,
        );

        Ok(Self {
            bind_group_state,
            buffer_state,
            depth_texture,
            instance_renderer,
            water_renderer,
        })
    }

    /// Renders a frame to the given surface.
    ///
    /// # Returns
    /// The surface error if no frame could be acquired; nothing was drawn.
    pub fn render(
        &mut self,
        surface: &Surface,
        device: &Device,
        queue: &Queue,
    ) -> Result<(), SurfaceError> {
        let frame = surface.get_current_texture()?;
        if frame.suboptimal {
            warn!("Surface is suboptimal");
        }

        let view = frame.texture.create_view(&Default::default());
        let mut encoder = device.create_command_encoder(&Default::default());
        {
            let depth_stencil_attachment = Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            });
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment,
                ..Default::default()
            });
            self.instance_renderer
                .render(&mut rpass, &self.bind_group_state);
            self.water_renderer
                .render(&mut rpass, &self.bind_group_state);
        }

        queue.submit([encoder.finish()]);
        frame.present();
        Ok(())
    }

    /// Handles window resize events by recreating the depth texture.
    pub fn resize(&mut self, device: &Device, config: &SurfaceConfiguration) {
        self.depth_texture = DepthTexture::new(device, config, "DEPTH TEXTURE");
    }
}
