//! Instanced cube renderer.
//!
//! Draws every live instance batch with one pipeline: the unit cube is the
//! vertex stream, the batch buffer is the instance stream, and the camera
//! uniform is bound at group 0.
//!
//! # Performance Considerations
//!
//! - One draw call per non-empty `(chunk, block)` batch
//! - Back-face culling and a depth test; no sorting

use wgpu::{Device, RenderPass, RenderPipeline, TextureFormat};

use crate::{
    core::StResource,
    engine_state::buffer_state::{BufferState, InstanceRaw},
};

use super::{
    bind_group_state::BindGroupState,
    texture::DepthTexture,
    vertex::{cube_indices, cube_vertices, CubeVertex},
};

/// Name of the cube vertex buffer
pub const CUBE_VERTEX_BUFFER_NAME: &str = "cube_vertex_buffer";
/// Name of the cube index buffer
pub const CUBE_INDEX_BUFFER_NAME: &str = "cube_index_buffer";

pub struct InstanceRenderer {
    render_pipeline: RenderPipeline,
    buffer_state: StResource<BufferState>,
    index_count: u32,
}

impl InstanceRenderer {
    /// Creates the cube geometry buffers and the render pipeline.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `buffer_state` - Shared state for buffer management
    /// * `shader_string` - The WGSL shader source code
    /// * `texture_format` - The surface format
    /// * `bind_group_state` - Holds the camera bind group layout
    pub fn new(
        device: &Device,
        buffer_state: StResource<BufferState>,
        shader_string: &str,
        texture_format: TextureFormat,
        bind_group_state: &BindGroupState,
    ) -> Self {
        let indices = cube_indices();
        {
            let mut buffers = buffer_state.get_mut();
            buffers.create_buffer_init(
                CUBE_VERTEX_BUFFER_NAME,
                wgpu::util::BufferInitDescriptor {
                    label: Some(CUBE_VERTEX_BUFFER_NAME),
                    contents: bytemuck::cast_slice(&cube_vertices()),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            );
            buffers.create_buffer_init(
                CUBE_INDEX_BUFFER_NAME,
                wgpu::util::BufferInitDescriptor {
                    label: Some(CUBE_INDEX_BUFFER_NAME),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                },
            );
        }

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Instanced Cube Pipeline Layout"),
            bind_group_layouts: &[bind_group_state.camera_bind_group_layout()],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Instanced Cube Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_string.into()),
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Instanced Cube Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[CubeVertex::desc(), InstanceRaw::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthTexture::depth_stencil_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Self {
            render_pipeline,
            buffer_state,
            index_count: indices.len() as u32,
        }
    }

    /// Records one instanced draw per live batch.
    pub fn render(&self, render_pass: &mut RenderPass<'_>, bind_group_state: &BindGroupState) {
        let buffer_state = self.buffer_state.get();
        let (Some(vertices), Some(indices)) = (
            buffer_state.get_buffer(CUBE_VERTEX_BUFFER_NAME),
            buffer_state.get_buffer(CUBE_INDEX_BUFFER_NAME),
        ) else {
            return;
        };

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, bind_group_state.camera_bind_group(), &[]);
        render_pass.set_vertex_buffer(0, vertices.slice(..));
        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);

        for (instances, count) in buffer_state.instance_batches() {
            render_pass.set_vertex_buffer(1, instances.slice(..));
            render_pass.draw_indexed(0..self.index_count, 0, 0..count);
        }
    }
}
