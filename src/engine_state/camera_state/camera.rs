//! # Camera Implementation
//!
//! This module contains the view and projection math the renderer needs:
//! - `Camera`: a first-person view placed at the player's eye
//! - `Projection`: perspective projection settings
//! - `CameraUniform`: packed data structure for GPU shaders

use cgmath::*;

use crate::engine_state::player::Player;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,  // Scale Z from [-1,1] to [-0.5,0.5]
    0.0, 0.0, 0.5, 1.0,  // Translate Z from [-0.5,0.5] to [0,1]
);

/// Vertical field of view.
pub const FOVY: Deg<f32> = Deg(75.0);
pub const ZNEAR: f32 = 0.1;
pub const ZFAR: f32 = 1000.0;

/// A first-person camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// A camera looking out of the player's eyes.
    pub fn from_player(player: &Player) -> Self {
        Self::new(player.position, player.yaw, player.pitch)
    }

    /// Unit vector the camera looks along.
    pub fn get_view_vec(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.get_view_vec(), Vector3::unit_y())
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_ratio(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Minimized windows report zero sizes.
fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // We can't use cgmath with bytemuck directly so we'll have to convert the Matrix4 into a 4x4 f32 array
    view_proj: [[f32; 4]; 4],
    position: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            position: [0.0, 0.0, 0.0, 0.0],
        }
    }

    pub fn update_view_proj_and_pos(&mut self, camera: &Camera, projection: &Projection) {
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
        let pos3: [f32; 3] = camera.position.into();
        self.position = [pos3[0], pos3[1], pos3[2], 1.0];
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.view_proj.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(uniform: &CameraUniform, point: Point3<f32>) -> Vector3<f32> {
        let clip = uniform.view_proj() * point.to_homogeneous();
        clip.truncate() / clip.w
    }

    #[test]
    fn points_ahead_of_the_player_land_mid_screen() {
        let mut player = Player::new(Point3::new(3.0, 20.0, -4.0));
        player.yaw = Rad(1.1);
        player.pitch = Rad(-0.3);
        let projection = Projection::new(800, 600, FOVY, ZNEAR, ZFAR);
        let mut uniform = CameraUniform::new();

        let camera = Camera::from_player(&player);
        uniform.update_view_proj_and_pos(&camera, &projection);
        let ndc = project(&uniform, player.position + player.view_direction() * 10.0);

        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "{ndc:?}");
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn points_behind_the_player_are_clipped() {
        let player = Player::new(Point3::new(0.0, 10.0, 0.0));
        let projection = Projection::new(800, 600, FOVY, ZNEAR, ZFAR);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj_and_pos(&Camera::from_player(&player), &projection);

        let behind = player.position - player.view_direction() * 5.0;
        let clip = uniform.view_proj() * behind.to_homogeneous();

        assert!(clip.w < 0.0);
    }

    #[test]
    fn zero_height_windows_keep_a_finite_aspect() {
        let mut projection = Projection::new(800, 600, FOVY, ZNEAR, ZFAR);
        projection.resize(800, 0);

        let matrix = projection.calc_matrix();

        assert!(matrix.x.x.is_finite());
    }
}
