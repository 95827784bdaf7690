//! Vertex data structures and layouts for the instanced cube and the water quad.
//!
//! Every visible voxel is drawn as one instance of a single unit cube
//! centered on the origin. The cube's faces carry a fixed brightness so
//! neighboring faces of the same color stay distinguishable. Water planes are
//! instances of one flat unit square scaled to the chunk width.

/// A corner of the unit cube.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Shade: f32 (4 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    /// Offset from the voxel center
    pub position: [f32; 3],
    /// Brightness multiplier of the face this corner belongs to
    pub shade: f32,
}

impl CubeVertex {
    /// Returns the vertex buffer layout description for the shader pipeline.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position (vec3<f32>)
    /// - `location = 1`: shade (f32)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Face corners, counter-clockwise seen from outside, with the face shade.
#[rustfmt::skip]
const FACES: [(f32, [[f32; 3]; 4]); 6] = [
    // +X
    (0.8, [[0.5, -0.5, 0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5]]),
    // -X
    (0.8, [[-0.5, -0.5, -0.5], [-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5]]),
    // +Y
    (1.0, [[-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5]]),
    // -Y
    (0.5, [[-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5]]),
    // +Z
    (0.7, [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]]),
    // -Z
    (0.7, [[0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5]]),
];

/// The 24 corners of the unit cube, four per face.
pub fn cube_vertices() -> Vec<CubeVertex> {
    FACES
        .iter()
        .flat_map(|(shade, corners)| {
            corners.iter().map(move |&position| CubeVertex {
                position,
                shade: *shade,
            })
        })
        .collect()
}

/// Two triangles per face over [`cube_vertices`].
pub fn cube_indices() -> Vec<u16> {
    (0..FACES.len() as u16)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect()
}

/// A corner of the unit water square, which lies in the `y = 0` plane.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterVertex {
    pub position: [f32; 3],
}

impl WaterVertex {
    /// # Shader Attributes
    /// - `location = 0`: position (vec3<f32>)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<WaterVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Corners of `[0, 1] x [0, 1]`, counter-clockwise seen from above.
pub fn water_vertices() -> [WaterVertex; 4] {
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]]
        .map(|position| WaterVertex { position })
}

pub fn water_indices() -> [u16; 6] {
    [0, 1, 2, 0, 2, 3]
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    #[test]
    fn every_triangle_faces_outwards() {
        let vertices = cube_vertices();
        let indices = cube_indices();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);

        for triangle in indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| Vector3::from(vertices[triangle[i] as usize].position));
            let normal = (b - a).cross(c - a);
            let center = (a + b + c) / 3.0;

            assert!(normal.dot(center) > 0.0, "inward triangle {triangle:?}");
        }
    }

    #[test]
    fn the_water_square_covers_the_unit_cell_facing_up() {
        let vertices = water_vertices();
        let indices = water_indices();

        assert!(vertices.iter().all(|v| v.position[1] == 0.0));
        for corner in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]] {
            assert!(vertices
                .iter()
                .any(|v| v.position[0] == corner[0] && v.position[2] == corner[1]));
        }
        for triangle in indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| Vector3::from(vertices[triangle[i] as usize].position));
            assert!((b - a).cross(c - a).y > 0.0, "triangle {triangle:?} faces down");
        }
    }

    #[test]
    fn the_top_face_is_brightest() {
        let vertices = cube_vertices();
        let top = vertices.iter().find(|v| v.position[1] > 0.0 && v.shade == 1.0);

        assert!(top.is_some());
        assert!(vertices.iter().all(|v| v.shade <= 1.0));
        assert!(vertices.iter().all(|v| v.position.iter().all(|c| c.abs() == 0.5)));
    }
}
