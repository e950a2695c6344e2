use serde::{Deserialize, Serialize};

use crate::mesh::GeometryError;

pub const POSITION_ATTRIBUTE: &str = "coordinates";
pub const COLOR_ATTRIBUTE: &str = "vertColor";
pub const TEXCOORD_ATTRIBUTE: &str = "textureCoord";

const FLOAT_SIZE: u64 = std::mem::size_of::<f32>() as u64;

/// Which fields an interleaved vertex carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexFormat {
    /// `coordinates: vec2`
    Position2,
    /// `coordinates: vec2`, `vertColor: vec3`
    Position2Color,
    /// `coordinates: vec3`, `vertColor: vec3`
    Position3Color,
    /// `coordinates: vec3`, `textureCoord: vec2`
    Position3TexCoord,
}

impl VertexFormat {
    pub fn layout(self) -> VertexLayout {
        match self {
            Self::Position2 => VertexLayout::packed(&[(POSITION_ATTRIBUTE, 2)]),
            Self::Position2Color => {
                VertexLayout::packed(&[(POSITION_ATTRIBUTE, 2), (COLOR_ATTRIBUTE, 3)])
            }
            Self::Position3Color => {
                VertexLayout::packed(&[(POSITION_ATTRIBUTE, 3), (COLOR_ATTRIBUTE, 3)])
            }
            Self::Position3TexCoord => {
                VertexLayout::packed(&[(POSITION_ATTRIBUTE, 3), (TEXCOORD_ATTRIBUTE, 2)])
            }
        }
    }
}

/// One field of an interleaved vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeField {
    pub name: &'static str,
    pub components: u32,
    /// Byte distance from the start of the vertex.
    pub offset: u64,
}

impl AttributeField {
    pub fn wgpu_format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// Attribute layout of a tightly packed vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    fields: Vec<AttributeField>,
    stride: u64,
}

impl VertexLayout {
    /// Lays the given `(name, components)` fields out back to back.
    pub fn packed(fields: &[(&'static str, u32)]) -> Self {
        let mut offset = 0;
        let fields = fields
            .iter()
            .map(|&(name, components)| {
                let field = AttributeField {
                    name,
                    components,
                    offset,
                };
                offset += components as u64 * FLOAT_SIZE;
                field
            })
            .collect();
        Self {
            fields,
            stride: offset,
        }
    }

    pub fn fields(&self) -> &[AttributeField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&AttributeField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Bytes between consecutive vertices.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn floats_per_vertex(&self) -> usize {
        (self.stride / FLOAT_SIZE) as usize
    }

    /// Number of whole vertices stored in `float_count` floats.
    pub fn vertex_count(&self, float_count: usize) -> Result<usize, GeometryError> {
        let per_vertex = self.floats_per_vertex();
        if per_vertex == 0 || float_count % per_vertex != 0 {
            return Err(GeometryError::Misaligned {
                floats: float_count,
                per_vertex,
            });
        }
        Ok(float_count / per_vertex)
    }
}
