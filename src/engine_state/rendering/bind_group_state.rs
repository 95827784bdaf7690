//! Manages WebGPU bind groups and their layouts.
//!
//! The instanced cube pipeline only binds one resource: the camera uniform,
//! at group 0, binding 0.

use wgpu::{BindGroup, BindGroupLayout, Buffer, Device};

/// Name of the camera bind group
pub const CAMERA_BIND_GROUP: &str = "camera_bind_group";
/// Name of the camera bind group layout
pub const CAMERA_BIND_GROUP_LAYOUT: &str = "camera_bind_group_layout";

pub struct BindGroupState {
    camera_bind_group: BindGroup,
    camera_bind_group_layout: BindGroupLayout,
}

impl BindGroupState {
    /// Creates the camera bind group over an existing uniform buffer.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `camera_buffer` - The camera uniform buffer
    pub fn new(device: &Device, camera_buffer: &Buffer) -> Self {
        let (camera_bind_group, camera_bind_group_layout) =
            Self::generate_camera_bindgroups(device, camera_buffer);

        Self {
            camera_bind_group,
            camera_bind_group_layout,
        }
    }

    pub fn camera_bind_group(&self) -> &BindGroup {
        &self.camera_bind_group
    }

    pub fn camera_bind_group_layout(&self) -> &BindGroupLayout {
        &self.camera_bind_group_layout
    }

    fn generate_camera_bindgroups(
        device: &Device,
        camera_buffer: &Buffer,
    ) -> (BindGroup, BindGroupLayout) {
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some(CAMERA_BIND_GROUP_LAYOUT),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some(CAMERA_BIND_GROUP),
        });

        (camera_bind_group, camera_bind_group_layout)
    }
}
