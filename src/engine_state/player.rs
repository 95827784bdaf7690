//! # Player
//!
//! The first-person player: an upright cylinder whose top sits at the eye.
//! Movement intent is kept in the player's local frame (x right, y up,
//! z forward) and rotated by the view yaw when applied to the world.
//!
//! ## Key Features
//! - WASD movement intent at a fixed top speed, jump when grounded
//! - Mouse-look with clamped pitch
//! - Block selection for the edit tool (`Empty` is the remove tool)
//! - Ray cast targeting of the voxel under the crosshair

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Point3, Rad, Vector3};

use super::voxels::{
    block::block_type::BlockId,
    raycast::{raycast, RaycastHit, MAX_REACH},
    world::BlockSource,
};

/// Cylinder radius.
pub const PLAYER_RADIUS: f32 = 0.4;
/// Cylinder height, feet to eye.
pub const PLAYER_HEIGHT: f32 = 1.75;
/// Upward speed given by a jump.
pub const JUMP_SPEED: f32 = 10.0;
/// Horizontal walking speed.
pub const MAX_SPEED: f32 = 8.0;
/// Eye position of a fresh player.
pub const SPAWN_POSITION: Point3<f32> = Point3::new(32.0, 16.0, 32.0);
/// Eye height after a manual reset.
pub const RESET_HEIGHT: f32 = 32.0;
/// Radians of view rotation per pixel of mouse motion.
pub const MOUSE_SENSITIVITY: f32 = 0.002;

const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Movement keys currently held.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug)]
pub struct Player {
    /// Eye position; the cylinder spans `[y - PLAYER_HEIGHT, y]`.
    pub position: Point3<f32>,
    /// Velocity in the local frame: x right, y up, z forward.
    pub velocity: Vector3<f32>,
    /// Requested horizontal velocity in the local frame.
    pub input: Vector3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    /// Set by the collision pass when the player rests on something.
    pub on_ground: bool,
    /// Block placed by the edit tool; `Empty` removes instead.
    pub selected_block: BlockId,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(SPAWN_POSITION)
    }
}

impl Player {
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            velocity: Vector3::new(0.0, 0.0, 0.0),
            input: Vector3::new(0.0, 0.0, 0.0),
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            on_ground: false,
            selected_block: BlockId::Grass,
        }
    }

    /// Horizontal unit vector the player walks along when moving forward.
    pub fn forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        Vector3::new(yaw_cos, 0.0, yaw_sin)
    }

    /// Horizontal unit vector to the player's right.
    pub fn right(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        Vector3::new(-yaw_sin, 0.0, yaw_cos)
    }

    /// Unit vector the player is looking along.
    pub fn view_direction(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize()
    }

    /// Center of the collision cylinder.
    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            self.position.x,
            self.position.y - PLAYER_HEIGHT / 2.0,
            self.position.z,
        )
    }

    /// Turns held keys into a requested local velocity at `MAX_SPEED`.
    pub fn set_movement(&mut self, keys: MovementKeys) {
        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => MAX_SPEED,
            (false, true) => -MAX_SPEED,
            _ => 0.0,
        };
        self.input.x = axis(keys.right, keys.left);
        self.input.z = axis(keys.forward, keys.backward);
    }

    /// Jumps if standing on something.
    pub fn jump(&mut self) {
        if self.on_ground {
            self.velocity.y += JUMP_SPEED;
        }
    }

    /// Applies a mouse delta to yaw and pitch, clamping pitch short of straight up/down.
    pub fn rotate(&mut self, delta_x: f64, delta_y: f64) {
        self.yaw += Rad(delta_x as f32 * MOUSE_SENSITIVITY);
        let pitch = self.pitch.0 - delta_y as f32 * MOUSE_SENSITIVITY;
        self.pitch = Rad(pitch.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
    }

    /// Moves the player back above the world and stops it.
    pub fn reset(&mut self) {
        self.position.y = RESET_HEIGHT;
        self.velocity = Vector3::new(0.0, 0.0, 0.0);
    }

    /// Integrates one step of movement.
    ///
    /// Horizontal velocity is replaced by the current input every step;
    /// vertical velocity carries over so gravity accumulates.
    pub fn apply_inputs(&mut self, dt: f32) {
        self.velocity.x = self.input.x;
        self.velocity.z = self.input.z;
        self.position += self.right() * self.velocity.x * dt;
        self.position += self.forward() * self.velocity.z * dt;
        self.position.y += self.velocity.y * dt;
    }

    /// Velocity in world axes.
    pub fn world_velocity(&self) -> Vector3<f32> {
        self.right() * self.velocity.x
            + Vector3::unit_y() * self.velocity.y
            + self.forward() * self.velocity.z
    }

    /// Adds a world-space change to the local velocity.
    pub fn apply_world_delta_velocity(&mut self, delta: Vector3<f32>) {
        self.velocity.x += delta.dot(self.right());
        self.velocity.y += delta.y;
        self.velocity.z += delta.dot(self.forward());
    }

    /// The voxel under the crosshair within reach.
    pub fn target(&self, blocks: &impl BlockSource) -> Option<RaycastHit> {
        raycast(blocks, self.position, self.view_direction(), MAX_REACH)
    }

    /// Selects the block for a number key. `0` picks the remove tool.
    ///
    /// # Returns
    /// `false` for digits without a block.
    pub fn select_digit(&mut self, digit: u8) -> bool {
        let block = match digit {
            0 => Some(BlockId::Empty),
            1..=8 => BlockId::from_raw(digit),
            _ => None,
        };
        match block {
            Some(block) => {
                self.selected_block = block;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn forward_input_follows_the_yaw() {
        let mut player = Player::new(Point3::new(0.0, 0.0, 0.0));
        player.yaw = Rad(FRAC_PI_2);
        player.set_movement(MovementKeys {
            forward: true,
            ..MovementKeys::default()
        });

        player.apply_inputs(0.5);

        assert_close(player.position - Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn world_velocity_round_trips_through_the_local_frame() {
        let mut player = Player::default();
        player.yaw = Rad(0.7);
        player.velocity = Vector3::new(1.0, -2.0, 3.0);
        let world = player.world_velocity();

        player.apply_world_delta_velocity(-world);

        assert_close(player.velocity, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn jumping_needs_ground() {
        let mut player = Player::default();
        player.jump();
        assert_eq!(player.velocity.y, 0.0);

        player.on_ground = true;
        player.jump();
        assert_eq!(player.velocity.y, JUMP_SPEED);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut player = Player::default();

        player.rotate(0.0, -100_000.0);

        assert!(player.pitch.0 < FRAC_PI_2);
        assert!(player.view_direction().y > 0.99);
    }

    #[test]
    fn digits_select_blocks_or_the_remove_tool() {
        let mut player = Player::default();

        assert!(player.select_digit(3));
        assert_eq!(player.selected_block, BlockId::Stone);
        assert!(player.select_digit(0));
        assert_eq!(player.selected_block, BlockId::Empty);
        assert!(!player.select_digit(9));
        assert_eq!(player.selected_block, BlockId::Empty);
    }

    #[test]
    fn reset_lifts_and_stops_the_player() {
        let mut player = Player::default();
        player.position.y = -40.0;
        player.velocity = Vector3::new(1.0, -30.0, 2.0);

        player.reset();

        assert_eq!(player.position.y, RESET_HEIGHT);
        assert_eq!(player.velocity, Vector3::new(0.0, 0.0, 0.0));
    }
}
