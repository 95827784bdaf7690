//! # Physics
//!
//! Fixed-rate player simulation against the voxel world. Every step applies
//! gravity, integrates the player's movement and resolves collisions in three
//! phases:
//!
//! 1. **Broad phase**: every known, non-empty voxel in the player's bounding box
//! 2. **Narrow phase**: the point of each voxel closest to the player's
//!    cylinder axis, kept if it lies inside the cylinder
//! 3. **Resolution**: smallest overlap first, push the player out along the
//!    contact normal and cancel the velocity into the surface
//!
//! Unknown voxels (chunks not generated yet) are never solid.

use cgmath::{InnerSpace, Point3, Vector3};
use log::trace;

use super::player::{Player, PLAYER_HEIGHT, PLAYER_RADIUS};
use super::voxels::world::BlockSource;

/// Simulation steps per second.
pub const STEP_RATE: f32 = 200.0;
/// Downward acceleration, in voxels per second squared.
pub const GRAVITY: f32 = 32.0;

/// One voxel the player is intersecting.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collision {
    pub block: Point3<i32>,
    /// Point of the voxel closest to the player's axis.
    pub contact_point: Point3<f32>,
    /// Direction the player is pushed out along.
    pub normal: Vector3<f32>,
    /// How far the player has to move along `normal` to stop intersecting.
    pub overlap: f32,
}

/// Fixed-timestep integrator for the player.
#[derive(Debug, Default)]
pub struct Physics {
    accumulator: f32,
}

impl Physics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration of one simulation step in seconds.
    pub fn step_size() -> f32 {
        1.0 / STEP_RATE
    }

    /// Advances the simulation by `dt` seconds, running as many whole steps as fit.
    ///
    /// Leftover time carries over to the next call.
    ///
    /// # Returns
    /// The number of steps run.
    pub fn update(&mut self, dt: f32, player: &mut Player, blocks: &impl BlockSource) -> u32 {
        let step = Self::step_size();
        let mut steps = 0;

        self.accumulator += dt;
        while self.accumulator >= step {
            player.velocity.y -= GRAVITY * step;
            player.apply_inputs(step);
            detect_collisions(player, blocks);
            self.accumulator -= step;
            steps += 1;
        }

        steps
    }
}

/// Runs one full collision pass and moves the player out of every voxel it overlaps.
pub fn detect_collisions(player: &mut Player, blocks: &impl BlockSource) {
    player.on_ground = false;
    let candidates = broad_phase(player, blocks);
    let collisions = narrow_phase(&candidates, player);
    if !collisions.is_empty() {
        trace!("Resolving {} collisions", collisions.len());
        resolve_collisions(collisions, player);
    }
}

/// Known, non-empty voxels inside the player's bounding box.
pub fn broad_phase(player: &Player, blocks: &impl BlockSource) -> Vec<Point3<i32>> {
    let p = player.position;
    let mut candidates = Vec::new();

    let x_range = (p.x - PLAYER_RADIUS).floor() as i32..=(p.x + PLAYER_RADIUS).ceil() as i32;
    let y_range = (p.y - PLAYER_HEIGHT).floor() as i32..=p.y.ceil() as i32;
    let z_range = (p.z - PLAYER_RADIUS).floor() as i32..=(p.z + PLAYER_RADIUS).ceil() as i32;

    for x in x_range {
        for y in y_range.clone() {
            for z in z_range.clone() {
                if blocks.is_solid(x, y, z) {
                    candidates.push(Point3::new(x, y, z));
                }
            }
        }
    }

    candidates
}

/// Offset from the cylinder center to `point`.
fn offset_from_center(player: &Player, point: Point3<f32>) -> Vector3<f32> {
    point - player.center()
}

/// Whether `point` lies strictly inside the player's cylinder.
pub fn point_in_player(player: &Player, point: Point3<f32>) -> bool {
    let d = offset_from_center(player, point);
    d.y.abs() < PLAYER_HEIGHT / 2.0 && d.x * d.x + d.z * d.z < PLAYER_RADIUS * PLAYER_RADIUS
}

/// Turns broad phase candidates into actual contacts.
///
/// A contact is resolved vertically when the vertical overlap is the smaller
/// one, which is also what marks the player as grounded.
pub fn narrow_phase(candidates: &[Point3<i32>], player: &mut Player) -> Vec<Collision> {
    let center = player.center();
    let mut collisions = Vec::new();

    for block in candidates {
        let (bx, by, bz) = (block.x as f32, block.y as f32, block.z as f32);
        let closest = Point3::new(
            center.x.clamp(bx - 0.5, bx + 0.5),
            center.y.clamp(by - 0.5, by + 0.5),
            center.z.clamp(bz - 0.5, bz + 0.5),
        );

        if !point_in_player(player, closest) {
            continue;
        }

        let d = closest - center;
        let overlap_y = PLAYER_HEIGHT / 2.0 - d.y.abs();
        let horizontal = (d.x * d.x + d.z * d.z).sqrt();
        let overlap_xz = PLAYER_RADIUS - horizontal;

        let (normal, overlap) = if overlap_y < overlap_xz || horizontal == 0.0 {
            player.on_ground = true;
            (Vector3::new(0.0, -d.y.signum(), 0.0), overlap_y)
        } else {
            (Vector3::new(-d.x, 0.0, -d.z).normalize(), overlap_xz)
        };

        collisions.push(Collision {
            block: *block,
            contact_point: closest,
            normal,
            overlap,
        });
    }

    collisions
}

/// Orders collisions smallest overlap first.
pub fn sort_by_overlap(collisions: &mut [Collision]) {
    collisions.sort_by(|a, b| a.overlap.total_cmp(&b.overlap));
}

/// Pushes the player out of each collision in turn.
///
/// Earlier pushes can clear later collisions; those are skipped.
pub fn resolve_collisions(mut collisions: Vec<Collision>, player: &mut Player) {
    sort_by_overlap(&mut collisions);

    for collision in collisions {
        if !point_in_player(player, collision.contact_point) {
            continue;
        }

        player.position += collision.normal * collision.overlap;

        let into_surface = player.world_velocity().dot(collision.normal);
        player.apply_world_delta_velocity(-(collision.normal * into_surface));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::engine_state::player::MovementKeys;
    use crate::engine_state::voxels::block::{block_type::BlockId, VoxelRecord};

    struct Voxels(HashSet<(i32, i32, i32)>);

    impl BlockSource for Voxels {
        fn block_at(&self, x: i32, y: i32, z: i32) -> Option<VoxelRecord> {
            self.0
                .contains(&(x, y, z))
                .then(|| VoxelRecord::new(BlockId::Dirt))
        }
    }

    /// A 9x9 floor of voxels at y = 0 centered on the origin.
    fn floor() -> Voxels {
        let mut voxels = HashSet::new();
        for x in -4..=4 {
            for z in -4..=4 {
                voxels.insert((x, 0, z));
            }
        }
        Voxels(voxels)
    }

    #[test]
    fn falling_player_comes_to_rest_on_the_floor() {
        let world = floor();
        let mut player = Player::new(Point3::new(0.0, 5.0, 0.0));
        let mut physics = Physics::new();

        let steps = physics.update(2.0, &mut player, &world);

        assert!(steps >= 399);
        assert!(player.on_ground);
        // Floor top is y = 0.5, the eye sits a player height above it.
        assert!((player.position.y - (0.5 + PLAYER_HEIGHT)).abs() < 0.01);
        assert!(player.velocity.y.abs() < GRAVITY * Physics::step_size() + 1e-4);
    }

    #[test]
    fn leftover_time_carries_into_the_next_update() {
        let world = floor();
        let mut player = Player::new(Point3::new(0.0, 10.0, 0.0));
        let mut physics = Physics::new();
        let half_step = Physics::step_size() / 2.0;

        assert_eq!(physics.update(half_step, &mut player, &world), 0);
        assert_eq!(physics.update(half_step * 1.01, &mut player, &world), 1);
    }

    #[test]
    fn walls_stop_horizontal_movement() {
        let mut world = floor();
        for y in 1..=3 {
            for z in -4..=4 {
                world.0.insert((3, y, z));
            }
        }
        let mut player = Player::new(Point3::new(0.0, 0.5 + PLAYER_HEIGHT, 0.0));
        player.set_movement(MovementKeys {
            forward: true,
            ..MovementKeys::default()
        });
        let mut physics = Physics::new();

        physics.update(2.0, &mut player, &world);

        assert!(player.position.x <= 2.5 - PLAYER_RADIUS + 0.01, "x = {}", player.position.x);
        assert!(player.position.x > 1.5);
    }

    #[test]
    fn unknown_voxels_are_not_solid() {
        let world = Voxels(HashSet::new());
        let mut player = Player::new(Point3::new(0.0, 5.0, 0.0));

        Physics::new().update(0.5, &mut player, &world);

        assert!(!player.on_ground);
        assert!(player.position.y < 5.0);
    }

    #[test]
    fn collisions_resolve_smallest_overlap_first() {
        let contact = |overlap: f32| Collision {
            block: Point3::new(0, 0, 0),
            contact_point: Point3::new(0.0, 0.0, 0.0),
            normal: Vector3::unit_y(),
            overlap,
        };
        let mut collisions = vec![contact(0.3), contact(0.01), contact(0.2), contact(0.05)];

        sort_by_overlap(&mut collisions);

        let overlaps: Vec<f32> = collisions.iter().map(|c| c.overlap).collect();
        assert_eq!(overlaps, vec![0.01, 0.05, 0.2, 0.3]);
    }

    #[test]
    fn narrow_phase_picks_the_shallower_axis() {
        let world = floor();
        // Feet sunk 0.1 into the floor: vertical overlap wins over horizontal.
        let mut player = Player::new(Point3::new(0.0, 0.4 + PLAYER_HEIGHT, 0.0));

        let candidates = broad_phase(&player, &world);
        let collisions = narrow_phase(&candidates, &mut player);

        assert!(!collisions.is_empty());
        assert!(player.on_ground);
        for collision in &collisions {
            assert_eq!(collision.normal, Vector3::unit_y());
            assert!((collision.overlap - 0.1).abs() < 1e-4);
        }
    }
}
