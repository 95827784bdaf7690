//! # Buffer State Module
//!
//! This module mirrors the voxel world's instance batches on the GPU. It owns
//! every GPU buffer the engine draws from and keeps them in sync by applying
//! the [`RenderCommand`]s the world queues.
//!
//! ## Key Features
//!
//! * Named buffers for shared resources (camera uniform, cube geometry)
//! * One instance buffer per `(chunk, block)` pair, sized for a full chunk so
//!   slot writes never reallocate
//! * Live instance counts tracked per buffer; empty batches are never drawn
//! * One translucent water plane per loaded chunk, rebuilt when chunks come and go
//! * Allocation analytics for debugging memory use
//!
//! ## Architecture
//!
//! The voxel core assigns slots and never touches the GPU. Each frame the
//! engine drains the world's render commands and hands them to
//! [`BufferState::apply_render_commands`], which uploads whole chunks, patches
//! single slots, updates counts and frees released chunks.

use std::collections::HashMap;

use cgmath::Point3;
use log::{debug, error};
use wgpu::{util::DeviceExt, Buffer, BufferAddress, Device, Queue};

use crate::core::StResource;

use super::voxels::{
    block::block_type::BlockId,
    chunk::{Chunk, ChunkCoord},
    render_command::RenderCommand,
    world::World,
};

/// Per-instance vertex data: one cube.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Color: 3x f32 (12 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    /// Center of the voxel in world space
    pub position: [f32; 3],
    /// Linear RGB color from the block table
    pub color: [f32; 3],
}

impl InstanceRaw {
    pub const SIZE: BufferAddress = std::mem::size_of::<InstanceRaw>() as BufferAddress;

    pub fn new(position: Point3<i32>, block: BlockId) -> Self {
        Self {
            position: [position.x as f32, position.y as f32, position.z as f32],
            color: block.block_type().color_rgb().map(srgb_to_linear),
        }
    }

    /// Returns the vertex buffer layout of the instance stream.
    ///
    /// # Shader Attributes
    /// - `location = 2`: instance position (vec3<f32>)
    /// - `location = 3`: instance color (vec3<f32>)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// The block table stores sRGB colors; the surface expects linear ones.
fn srgb_to_linear(channel: f32) -> f32 {
    if channel <= 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// Height of the water surface above the `water_height` voxel row.
pub const WATER_SURFACE_OFFSET: f32 = 0.4;

/// Minimum number of water planes the water buffer is allocated for.
const MIN_WATER_CAPACITY: usize = 16;

/// Per-instance data of one chunk's water plane.
///
/// # Memory Layout
/// - Origin: 3x f32 (12 bytes)
/// - Size: f32 (4 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterPlaneRaw {
    /// Minimum corner of the plane in world space. Voxels are centered on
    /// integer coordinates, so the corner sits half a voxel below the origin.
    pub origin: [f32; 3],
    /// Edge length; the plane covers the chunk's full width
    pub size: f32,
}

impl WaterPlaneRaw {
    pub const SIZE: BufferAddress = std::mem::size_of::<WaterPlaneRaw>() as BufferAddress;

    /// The water plane of `chunk` for the given water height.
    pub fn new(chunk: &Chunk, water_height: i32) -> Self {
        let origin = chunk.origin();
        Self {
            origin: [
                origin.x as f32 - 0.5,
                water_height as f32 + WATER_SURFACE_OFFSET,
                origin.z as f32 - 0.5,
            ],
            size: chunk.size().width as f32,
        }
    }

    /// Returns the vertex buffer layout of the water instance stream.
    ///
    /// # Shader Attributes
    /// - `location = 1`: plane origin (vec3<f32>)
    /// - `location = 2`: plane size (f32)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Number of planes a water buffer holding `planes` is allocated for.
pub fn water_capacity(planes: usize) -> usize {
    planes.next_power_of_two().max(MIN_WATER_CAPACITY)
}

/// Byte offset of an instance slot.
pub fn slot_offset(slot: u32) -> BufferAddress {
    slot as BufferAddress * InstanceRaw::SIZE
}

/// Instance data for every live slot of one batch, in slot order.
pub fn instance_data(chunk: &Chunk, block: BlockId) -> Vec<InstanceRaw> {
    chunk
        .instance_positions(block)
        .map(|position| InstanceRaw::new(position, block))
        .collect()
}

/// Analytics data for a GPU buffer
#[derive(Debug, Default)]
struct BufferAnalytics {
    /// Total memory allocated for the buffer in bytes
    pub allocated_memory: u64,
    /// Highest byte written so far
    pub used_memory: u64,
    /// Number of times the buffer has been written to
    pub times_written: u64,
}

impl BufferAnalytics {
    fn record_write(&mut self, offset: u64, len: u64) {
        self.used_memory = self.used_memory.max(offset + len);
        self.times_written += 1;
    }
}

/// GPU mirror of one instance batch.
struct InstanceBuffer {
    buffer: Buffer,
    /// Instances drawn; slots past this are stale.
    count: u32,
    analytics: BufferAnalytics,
}

/// Central manager for GPU buffers in the engine
pub struct BufferState {
    /// Reference to the GPU device
    pub device: StResource<Device>,
    /// Reference to the GPU command queue
    pub queue: StResource<Queue>,
    /// Map of buffer names to buffer objects
    buffers: HashMap<&'static str, Buffer>,
    /// Analytics data for each named buffer
    buffer_analytics: HashMap<&'static str, BufferAnalytics>,
    instance_buffers: HashMap<(ChunkCoord, BlockId), InstanceBuffer>,
    water_planes: HashMap<ChunkCoord, WaterPlaneRaw>,
    /// Packed copy of `water_planes`; `None` until the first chunk loads
    water_buffer: Option<InstanceBuffer>,
    water_dirty: bool,
}

impl BufferState {
    pub fn new(device: StResource<Device>, queue: StResource<Queue>) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            buffer_analytics: HashMap::new(),
            instance_buffers: HashMap::new(),
            water_planes: HashMap::new(),
            water_buffer: None,
            water_dirty: false,
        }
    }

    /// Creates a named buffer and initializes it with data
    ///
    /// # Arguments
    ///
    /// * `buffer_name` - Unique name for the buffer
    /// * `init_descriptor` - Buffer initialization descriptor with data
    pub fn create_buffer_init(
        &mut self,
        buffer_name: &'static str,
        init_descriptor: wgpu::util::BufferInitDescriptor,
    ) {
        let len = init_descriptor.contents.len() as u64;
        let buffer = self.device.get().create_buffer_init(&init_descriptor);

        self.buffers.insert(buffer_name, buffer);
        self.buffer_analytics.insert(
            buffer_name,
            BufferAnalytics {
                allocated_memory: len,
                used_memory: len,
                times_written: 1,
            },
        );
    }

    /// Writes raw byte data to a named buffer
    ///
    /// Unknown buffers and out of bounds writes are logged and skipped.
    ///
    /// # Arguments
    ///
    /// * `buffer_name` - Name of the buffer to write to
    /// * `offset` - Byte offset in the buffer to start writing
    /// * `data` - Raw byte data to write
    pub fn write_buffer(&mut self, buffer_name: &'static str, offset: BufferAddress, data: &[u8]) {
        let (Some(buffer), Some(analytics)) = (
            self.buffers.get(buffer_name),
            self.buffer_analytics.get_mut(buffer_name),
        ) else {
            error!("Write to unknown buffer '{}'", buffer_name);
            return;
        };

        let data_size = data.len() as u64;
        if offset + data_size > analytics.allocated_memory {
            error!("Buffer write out of bounds for buffer name '{}'", buffer_name);
            return;
        }

        self.queue.get().write_buffer(buffer, offset, data);
        analytics.record_write(offset, data_size);
    }

    /// Gets a named buffer.
    pub fn get_buffer(&self, buffer_name: &'static str) -> Option<&Buffer> {
        self.buffers.get(buffer_name)
    }

    /// Applies render commands in order.
    ///
    /// # Arguments
    /// * `commands` - Commands drained from the world this frame
    /// * `world` - Source of instance data for full chunk uploads
    pub fn apply_render_commands(&mut self, commands: Vec<RenderCommand>, world: &World) {
        if commands.is_empty() {
            return;
        }
        let applied = commands.len();

        for command in commands {
            self.apply(command, world);
        }
        if self.water_dirty {
            self.sync_water_planes();
        }

        debug!(
            "Applied {} render commands, {} instance buffers, {} bytes allocated",
            applied,
            self.instance_buffers.len(),
            self.get_total_allocated_memory()
        );
    }

    fn apply(&mut self, command: RenderCommand, world: &World) {
        match command {
            RenderCommand::UploadChunk { chunk: coord } => {
                let Some(chunk) = world.chunk(coord) else {
                    return;
                };
                let water_height = world.params().terrain.water_height;
                self.water_planes
                    .insert(coord, WaterPlaneRaw::new(chunk, water_height));
                self.water_dirty = true;

                let capacity = chunk.size().volume();
                for block in BlockId::RENDERABLE {
                    let instances = instance_data(chunk, block);
                    if instances.is_empty() && !self.instance_buffers.contains_key(&(coord, block)) {
                        continue;
                    }
                    self.write_instances(coord, block, capacity, 0, &instances);
                    if let Some(batch) = self.instance_buffers.get_mut(&(coord, block)) {
                        batch.count = instances.len() as u32;
                    }
                }
            }
            RenderCommand::WriteInstance {
                chunk,
                block,
                slot,
                position,
            } => {
                let capacity = world.chunk_size().volume();
                self.write_instances(chunk, block, capacity, slot, &[InstanceRaw::new(position, block)]);
            }
            RenderCommand::SetInstanceCount {
                chunk,
                block,
                count,
            } => match self.instance_buffers.get_mut(&(chunk, block)) {
                Some(batch) => batch.count = count,
                None if count > 0 => {
                    error!("Instance count set for missing batch {:?} {}", chunk, block);
                }
                None => {}
            },
            RenderCommand::ReleaseChunk { chunk } => {
                self.water_dirty |= self.water_planes.remove(&chunk).is_some();
                self.instance_buffers.retain(|(coord, _), batch| {
                    if *coord == chunk {
                        batch.buffer.destroy();
                        false
                    } else {
                        true
                    }
                });
            }
        }
    }

    /// Writes instances starting at `slot`, creating the batch buffer if needed.
    fn write_instances(
        &mut self,
        chunk: ChunkCoord,
        block: BlockId,
        capacity: usize,
        slot: u32,
        instances: &[InstanceRaw],
    ) {
        let device = self.device.clone();
        let batch = self.instance_buffers.entry((chunk, block)).or_insert_with(|| {
            let size = capacity as BufferAddress * InstanceRaw::SIZE;
            let buffer = device.get().create_buffer(&wgpu::BufferDescriptor {
                label: Some("instance_buffer"),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            InstanceBuffer {
                buffer,
                count: 0,
                analytics: BufferAnalytics {
                    allocated_memory: size,
                    ..BufferAnalytics::default()
                },
            }
        });

        if instances.is_empty() {
            return;
        }

        let offset = slot_offset(slot);
        let data: &[u8] = bytemuck::cast_slice(instances);
        if offset + data.len() as u64 > batch.analytics.allocated_memory {
            error!(
                "Instance write out of bounds: chunk ({}, {}) {} slot {}",
                chunk.x, chunk.z, block, slot
            );
            return;
        }

        self.queue.get().write_buffer(&batch.buffer, offset, data);
        batch.analytics.record_write(offset, data.len() as u64);
    }

    /// Rewrites the water buffer from the current planes, growing it if needed.
    fn sync_water_planes(&mut self) {
        self.water_dirty = false;

        let mut planes: Vec<WaterPlaneRaw> = self.water_planes.values().copied().collect();
        planes.sort_by(|a, b| {
            a.origin[0]
                .total_cmp(&b.origin[0])
                .then(a.origin[2].total_cmp(&b.origin[2]))
        });

        let needed = planes.len() as BufferAddress * WaterPlaneRaw::SIZE;
        let too_small = self
            .water_buffer
            .as_ref()
            .map_or(true, |water| water.analytics.allocated_memory < needed);
        if too_small {
            if let Some(old) = self.water_buffer.take() {
                old.buffer.destroy();
            }
            let size = water_capacity(planes.len()) as BufferAddress * WaterPlaneRaw::SIZE;
            let buffer = self.device.get().create_buffer(&wgpu::BufferDescriptor {
                label: Some("water_plane_buffer"),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.water_buffer = Some(InstanceBuffer {
                buffer,
                count: 0,
                analytics: BufferAnalytics {
                    allocated_memory: size,
                    ..BufferAnalytics::default()
                },
            });
        }

        let Some(water) = self.water_buffer.as_mut() else {
            return;
        };
        if !planes.is_empty() {
            let data: &[u8] = bytemuck::cast_slice(&planes);
            self.queue.get().write_buffer(&water.buffer, 0, data);
            water.analytics.record_write(0, data.len() as u64);
        }
        water.count = planes.len() as u32;
    }

    /// The water planes of every loaded chunk, as `(buffer, count)`.
    pub fn water_batch(&self) -> Option<(&Buffer, u32)> {
        self.water_buffer
            .as_ref()
            .filter(|water| water.count > 0)
            .map(|water| (&water.buffer, water.count))
    }

    /// Every batch with live instances, as `(buffer, count)`.
    pub fn instance_batches(&self) -> impl Iterator<Item = (&Buffer, u32)> {
        self.instance_buffers
            .values()
            .filter(|batch| batch.count > 0)
            .map(|batch| (&batch.buffer, batch.count))
    }

    /// Total instances drawn per frame.
    pub fn instance_count(&self) -> u64 {
        self.instance_buffers
            .values()
            .map(|batch| batch.count as u64)
            .sum()
    }

    /// Gets the total allocated memory across all buffers
    pub fn get_total_allocated_memory(&self) -> u64 {
        self.buffer_analytics
            .values()
            .chain(self.instance_buffers.values().map(|batch| &batch.analytics))
            .chain(self.water_buffer.iter().map(|water| &water.analytics))
            .map(|analytics| analytics.allocated_memory)
            .sum()
    }

    /// Gets the total used memory across all buffers
    pub fn get_total_used_memory(&self) -> u64 {
        self.buffer_analytics
            .values()
            .chain(self.instance_buffers.values().map(|batch| &batch.analytics))
            .chain(self.water_buffer.iter().map(|water| &water.analytics))
            .map(|analytics| analytics.used_memory)
            .sum()
    }
}
