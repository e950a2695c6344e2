use wgpu::util::DeviceExt;

use crate::mesh::{DrawCall, GeometryError, Mesh};

/// Device-side copy of a mesh, uploaded once.
pub struct GeometryBuffer {
    vertex: wgpu::Buffer,
    index: Option<wgpu::Buffer>,
    draw: DrawCall,
}

impl GeometryBuffer {
    pub fn upload(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Result<Self, GeometryError> {
        mesh.validate()?;
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = mesh.indices.as_ref().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}-indices")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        log::debug!(
            "uploaded {label}: {} vertices, {} bytes",
            mesh.vertex_count(),
            mesh.byte_len()
        );
        Ok(Self {
            vertex,
            index,
            draw: mesh.draw_call(),
        })
    }

    pub fn draw_call(&self) -> DrawCall {
        self.draw
    }

    /// Binds the buffers and issues the single draw for this geometry.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex.slice(..));
        match (self.draw, &self.index) {
            (DrawCall::Indexed { index_count }, Some(index)) => {
                pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..index_count, 0, 0..1);
            }
            (DrawCall::Arrays { vertex_count }, _) => pass.draw(0..vertex_count, 0..1),
            (DrawCall::Indexed { .. }, None) => {
                log::error!("indexed draw without an index buffer");
            }
        }
    }
}
