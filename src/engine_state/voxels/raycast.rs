//! # Voxel Ray Cast
//!
//! Finds the voxel the player is looking at by walking the voxel grid along a
//! ray (Amanatides & Woo). Voxel `(x, y, z)` is the unit cube centered on the
//! integer point, so the walk runs on coordinates shifted by half a voxel.
//! Unknown voxels are walked through like empty ones.

use cgmath::{InnerSpace, Point3, Vector3};

use super::world::BlockSource;

/// How far the player can reach, in voxels.
pub const MAX_REACH: f32 = 3.0;

/// The first solid voxel along a ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RaycastHit {
    /// The solid voxel that was hit.
    pub block: Point3<i32>,
    /// Outward normal of the face the ray entered through.
    pub normal: Vector3<i32>,
    /// Distance from the ray origin to the entry face.
    pub distance: f32,
}

impl RaycastHit {
    /// The voxel in front of the hit face, where a placed block goes.
    pub fn adjacent(&self) -> Point3<i32> {
        self.block + self.normal
    }
}

/// Casts a ray through the voxel grid.
///
/// The voxel containing `origin` is never reported.
///
/// # Arguments
/// * `blocks` - Voxel lookup
/// * `origin` - Ray start in world units
/// * `direction` - Ray direction, need not be normalized
/// * `max_distance` - Faces farther than this are ignored
///
/// # Returns
/// The first solid voxel entered within `max_distance`, if any.
pub fn raycast(
    blocks: &impl BlockSource,
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_distance: f32,
) -> Option<RaycastHit> {
    if direction.magnitude2() == 0.0 {
        return None;
    }
    let direction = direction.normalize();
    let start = [origin.x + 0.5, origin.y + 0.5, origin.z + 0.5];
    let dir = [direction.x, direction.y, direction.z];

    let mut voxel = start.map(|c| c.floor() as i32);
    let mut step = [0i32; 3];
    let mut t_max = [f32::INFINITY; 3];
    let mut t_delta = [f32::INFINITY; 3];

    for axis in 0..3 {
        if dir[axis] > 0.0 {
            step[axis] = 1;
            t_delta[axis] = 1.0 / dir[axis];
            t_max[axis] = (voxel[axis] as f32 + 1.0 - start[axis]) / dir[axis];
        } else if dir[axis] < 0.0 {
            step[axis] = -1;
            t_delta[axis] = -1.0 / dir[axis];
            t_max[axis] = (start[axis] - voxel[axis] as f32) / -dir[axis];
        }
    }

    loop {
        let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
            0
        } else if t_max[1] <= t_max[2] {
            1
        } else {
            2
        };

        let distance = t_max[axis];
        if distance > max_distance {
            return None;
        }

        voxel[axis] += step[axis];
        t_max[axis] += t_delta[axis];

        if blocks.is_solid(voxel[0], voxel[1], voxel[2]) {
            let mut normal = Vector3::new(0, 0, 0);
            normal[axis] = -step[axis];
            return Some(RaycastHit {
                block: Point3::new(voxel[0], voxel[1], voxel[2]),
                normal,
                distance,
            });
        }
    }
}
