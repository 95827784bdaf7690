//! # Camera State Management
//!
//! Keeps the camera uniform on the GPU in step with the player. The camera
//! has no controls of its own: every frame it is placed at the player's eye
//! with the player's yaw and pitch.

use crate::core::StResource;

use super::{buffer_state::BufferState, player::Player};

pub mod camera;

/// Name of the GPU buffer used for camera uniform data
pub const CAMERA_BUFFER_NAME: &str = "camera_buffer";

pub struct CameraState {
    /// The camera used for the last uniform upload
    pub camera: camera::Camera,
    /// GPU-optimized camera data for shaders
    pub camera_uniform: camera::CameraUniform,
    pub buffer_state: StResource<BufferState>,
}

impl CameraState {
    /// Creates the camera uniform buffer and fills it from the player.
    ///
    /// # Arguments
    /// * `buffer_state` - The buffer state owning the uniform buffer
    /// * `player` - The player to look out of
    /// * `projection` - The initial camera projection settings
    pub fn new(
        buffer_state: StResource<BufferState>,
        player: &Player,
        projection: &camera::Projection,
    ) -> Self {
        let camera = camera::Camera::from_player(player);
        let mut camera_uniform = camera::CameraUniform::new();
        camera_uniform.update_view_proj_and_pos(&camera, projection);

        buffer_state.get_mut().create_buffer_init(
            CAMERA_BUFFER_NAME,
            wgpu::util::BufferInitDescriptor {
                label: Some(CAMERA_BUFFER_NAME),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        CameraState {
            camera,
            camera_uniform,
            buffer_state,
        }
    }

    /// Moves the camera to the player and uploads the new uniform.
    ///
    /// Should be called every frame, after physics and before rendering.
    pub fn update(&mut self, player: &Player, projection: &camera::Projection) {
        self.camera = camera::Camera::from_player(player);
        self.camera_uniform
            .update_view_proj_and_pos(&self.camera, projection);
        self.buffer_state.get_mut().write_buffer(
            CAMERA_BUFFER_NAME,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
    }
}
