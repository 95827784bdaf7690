//! Translucent water planes.
//!
//! Runs after the cube renderer in the same pass. Planes are alpha blended,
//! drawn from both sides and tested against the cube depth without writing
//! their own, so terrain below the water line shows through.

use wgpu::{Device, RenderPass, RenderPipeline, TextureFormat};

use crate::{
    core::StResource,
    engine_state::buffer_state::{BufferState, WaterPlaneRaw},
};

use super::{
    bind_group_state::BindGroupState,
    texture::DepthTexture,
    vertex::{water_indices, water_vertices, WaterVertex},
};

pub const WATER_VERTEX_BUFFER_NAME: &str = "water_vertex_buffer";
pub const WATER_INDEX_BUFFER_NAME: &str = "water_index_buffer";

pub struct WaterRenderer {
    render_pipeline: RenderPipeline,
    buffer_state: StResource<BufferState>,
    index_count: u32,
}

impl WaterRenderer {
    /// Creates the water square buffers and the blended pipeline.
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
        let indices = water_indices();
        {
            let mut buffers = buffer_state.get_mut();
            buffers.create_buffer_init(
                WATER_VERTEX_BUFFER_NAME,
                wgpu::util::BufferInitDescriptor {
                    label: Some(WATER_VERTEX_BUFFER_NAME),
                    contents: bytemuck::cast_slice(&water_vertices()),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            );
            buffers.create_buffer_init(
                WATER_INDEX_BUFFER_NAME,
                wgpu::util::BufferInitDescriptor {
                    label: Some(WATER_INDEX_BUFFER_NAME),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                },
            );
        }

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Water Pipeline Layout"),
            bind_group_layouts: &[bind_group_state.camera_bind_group_layout()],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Water Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_string.into()),
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Water Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[WaterVertex::desc(), WaterPlaneRaw::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthTexture::read_only_depth_stencil_state()),
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

    /// Records one instanced draw covering every loaded chunk's water plane.
    pub fn render(&self, render_pass: &mut RenderPass<'_>, bind_group_state: &BindGroupState) {
        let buffer_state = self.buffer_state.get();
        let (Some(vertices), Some(indices), Some((planes, count))) = (
            buffer_state.get_buffer(WATER_VERTEX_BUFFER_NAME),
            buffer_state.get_buffer(WATER_INDEX_BUFFER_NAME),
            buffer_state.water_batch(),
        ) else {
            return;
        };

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, bind_group_state.camera_bind_group(), &[]);
        render_pass.set_vertex_buffer(0, vertices.slice(..));
        render_pass.set_vertex_buffer(1, planes.slice(..));
        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..self.index_count, 0, 0..count);
    }
}
