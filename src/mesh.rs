use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{BLUE, GREEN, RED};
use crate::layout::{VertexFormat, VertexLayout};

/// Rejections raised while validating vertex and index data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("mesh has no vertices")]
    Empty,
    #[error("{floats} floats do not divide into vertices of {per_vertex} floats")]
    Misaligned { floats: usize, per_vertex: usize },
    #[error("index list of length {len} is not made of whole triangles")]
    IncompleteTriangle { len: usize },
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u16, vertex_count: usize },
}

/// Interleaved vertex data plus an optional triangle index list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub format: VertexFormat,
    pub vertices: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u16>>,
}

/// The single draw issued per frame for a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    Arrays { vertex_count: u32 },
    Indexed { index_count: u32 },
}

impl Mesh {
    /// Builds a mesh and checks its layout and index invariants.
    pub fn new(
        format: VertexFormat,
        vertices: Vec<f32>,
        indices: Option<Vec<u16>>,
    ) -> Result<Self, GeometryError> {
        let mesh = Self {
            format,
            vertices,
            indices,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.vertices.is_empty() {
            return Err(GeometryError::Empty);
        }
        let vertex_count = self.layout().vertex_count(self.vertices.len())?;
        if let Some(indices) = &self.indices {
            if indices.len() % 3 != 0 {
                return Err(GeometryError::IncompleteTriangle { len: indices.len() });
            }
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(GeometryError::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> VertexLayout {
        self.format.layout()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout().floats_per_vertex().max(1)
    }

    pub fn byte_len(&self) -> usize {
        std::mem::size_of_val(self.vertices.as_slice())
    }

    pub fn draw_call(&self) -> DrawCall {
        match &self.indices {
            Some(indices) => DrawCall::Indexed {
                index_count: indices.len() as u32,
            },
            None => DrawCall::Arrays {
                vertex_count: self.vertex_count() as u32,
            },
        }
    }

    /// Single triangle with positions only.
    pub fn flat_triangle() -> Self {
        Self {
            format: VertexFormat::Position2,
            vertices: TRIANGLE_POSITIONS.iter().flatten().copied().collect(),
            indices: None,
        }
    }

    /// Triangle with a red, green and blue corner.
    pub fn colored_triangle() -> Self {
        let colors = [RED.rgb(), GREEN.rgb(), BLUE.rgb()];
        let vertices = TRIANGLE_POSITIONS
            .iter()
            .zip(colors)
            .flat_map(|(position, color)| position.iter().copied().chain(color))
            .collect();
        Self {
            format: VertexFormat::Position2Color,
            vertices,
            indices: None,
        }
    }

    /// 24-vertex cube with one flat color per face.
    pub fn colored_cube() -> Self {
        let vertices = CUBE_FACES
            .iter()
            .flat_map(|face| {
                face.corners
                    .iter()
                    .flat_map(move |corner| corner.iter().copied().chain(face.color))
            })
            .collect();
        Self {
            format: VertexFormat::Position3Color,
            vertices,
            indices: Some(BOX_INDICES.to_vec()),
        }
    }

    /// 24-vertex cube mapping the full texture onto every face.
    pub fn textured_cube() -> Self {
        let vertices = CUBE_FACES
            .iter()
            .flat_map(|face| {
                face.corners
                    .iter()
                    .zip(FACE_TEXCOORDS)
                    .flat_map(|(corner, uv)| corner.iter().copied().chain(uv))
            })
            .collect();
        Self {
            format: VertexFormat::Position3TexCoord,
            vertices,
            indices: Some(BOX_INDICES.to_vec()),
        }
    }
}

const TRIANGLE_POSITIONS: [[f32; 2]; 3] = [[0.0, 0.5], [-0.5, -0.5], [0.5, -0.5]];

struct CubeFace {
    /// Counter-clockwise when seen from outside the cube (left-handed frame).
    corners: [[f32; 3]; 4],
    color: [f32; 3],
}

const CUBE_FACES: [CubeFace; 6] = [
    // top
    CubeFace {
        corners: [
            [-1.0, 1.0, -1.0],
            [1.0, 1.0, -1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ],
        color: [0.5, 0.5, 0.5],
    },
    // left
    CubeFace {
        corners: [
            [-1.0, -1.0, 1.0],
            [-1.0, -1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, 1.0, 1.0],
        ],
        color: [0.75, 0.25, 0.5],
    },
    // right
    CubeFace {
        corners: [
            [1.0, -1.0, -1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [1.0, 1.0, -1.0],
        ],
        color: [0.25, 0.25, 0.75],
    },
    // front, facing the default camera
    CubeFace {
        corners: [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
        ],
        color: [1.0, 0.0, 0.15],
    },
    // back
    CubeFace {
        corners: [
            [1.0, -1.0, 1.0],
            [-1.0, -1.0, 1.0],
            [-1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
        ],
        color: [0.0, 1.0, 0.15],
    },
    // bottom
    CubeFace {
        corners: [
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, -1.0, -1.0],
            [-1.0, -1.0, -1.0],
        ],
        color: [0.5, 0.5, 1.0],
    },
];

const FACE_TEXCOORDS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

/// Two triangles per face, same winding for all six faces.
pub const BOX_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3, // top
    4, 5, 6, 4, 6, 7, // left
    8, 9, 10, 8, 10, 11, // right
    12, 13, 14, 12, 14, 15, // front
    16, 17, 18, 16, 18, 19, // back
    20, 21, 22, 20, 22, 23, // bottom
];

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn position(mesh: &Mesh, index: u16) -> Vec3 {
        let stride = mesh.layout().floats_per_vertex();
        let start = index as usize * stride;
        Vec3::from_slice(&mesh.vertices[start..start + 3])
    }

    #[test]
    fn colored_cube_matches_layout() {
        let cube = Mesh::colored_cube();
        assert_eq!(cube.vertices.len(), 144);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.byte_len(), 24 * cube.layout().stride() as usize);
        let indices = cube.indices.as_ref().unwrap();
        assert!(indices.iter().all(|&i| i < 24));
        assert_eq!(cube.draw_call(), DrawCall::Indexed { index_count: 36 });
        cube.validate().unwrap();
    }

    #[test]
    fn textured_cube_matches_layout() {
        let cube = Mesh::textured_cube();
        assert_eq!(cube.vertices.len(), 24 * 5);
        cube.validate().unwrap();
    }

    #[test]
    fn every_cube_triangle_faces_outward() {
        for cube in [Mesh::colored_cube(), Mesh::textured_cube()] {
            for triangle in cube.indices.as_ref().unwrap().chunks_exact(3) {
                let [a, b, c] = [0, 1, 2].map(|i| position(&cube, triangle[i]));
                // Left-handed normal of a counter-clockwise triangle.
                let normal = (c - a).cross(b - a);
                let centroid = (a + b + c) / 3.0;
                assert!(normal.dot(centroid) > 0.0, "triangle {triangle:?} winds inward");
            }
        }
    }

    #[test]
    fn triangles_draw_three_vertices() {
        let flat = Mesh::flat_triangle();
        assert_eq!(flat.vertices, vec![0.0, 0.5, -0.5, -0.5, 0.5, -0.5]);
        assert_eq!(flat.draw_call(), DrawCall::Arrays { vertex_count: 3 });

        let colored = Mesh::colored_triangle();
        assert_eq!(colored.vertices.len(), 15);
        assert_eq!(&colored.vertices[2..5], &RED.rgb());
        assert_eq!(colored.draw_call(), DrawCall::Arrays { vertex_count: 3 });
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = Mesh::new(
            VertexFormat::Position2,
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            Some(vec![0, 1, 3]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GeometryError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn rejects_partial_triangles_and_empty_meshes() {
        let partial = Mesh::new(
            VertexFormat::Position2,
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            Some(vec![0, 1]),
        );
        assert_eq!(partial, Err(GeometryError::IncompleteTriangle { len: 2 }));
        assert_eq!(
            Mesh::new(VertexFormat::Position3Color, Vec::new(), None),
            Err(GeometryError::Empty)
        );
    }
}
