use std::collections::BTreeMap;

use glam::Mat4;

use crate::color::to_wgpu_color;
use crate::demo::DemoConfig;
use crate::error::DemoError;
use crate::mesh::DrawCall;
use crate::program::{
    Program, ProgramError, UniformKind, PROJECTION_UNIFORM, VIEW_UNIFORM, WORLD_UNIFORM,
};

use super::context::GpuContext;
use super::geometry::GeometryBuffer;
use super::pipeline::{DemoPipeline, PipelineSettings};
use super::texture::{GpuTexture, TextureImage};

/// GPU state for one demo: pipeline, geometry and the uniforms feeding it.
pub struct DemoRenderer {
    pipeline: DemoPipeline,
    geometry: GeometryBuffer,
    matrices: BTreeMap<String, wgpu::Buffer>,
    bind_group: wgpu::BindGroup,
    _texture: Option<GpuTexture>,
    clear_color: wgpu::Color,
    depth_test: bool,
}

impl DemoRenderer {
    pub fn new(
        context: &GpuContext,
        config: &DemoConfig,
        program: &Program,
        color_format: wgpu::TextureFormat,
        image: Option<&TextureImage>,
    ) -> Result<Self, DemoError> {
        let device = &context.device;
        if config.rotation.is_some() {
            program.resolve(WORLD_UNIFORM)?;
        }

        let layout = config.mesh.layout();
        let pipeline = DemoPipeline::new(
            device,
            program,
            &layout,
            PipelineSettings {
                color_format,
                depth_test: config.depth_test,
                cull_back_faces: config.cull_back_faces,
            },
        )?;
        let geometry = GeometryBuffer::upload(device, &config.mesh, &config.name)?;

        let matrices: BTreeMap<String, wgpu::Buffer> = program
            .uniforms()
            .filter(|(_, slot)| slot.kind == UniformKind::Buffer)
            .map(|(name, _)| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(name),
                    size: std::mem::size_of::<[f32; 16]>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                context
                    .queue
                    .write_buffer(&buffer, 0, bytemuck::cast_slice(&Mat4::IDENTITY.to_cols_array()));
                (name.to_string(), buffer)
            })
            .collect();

        let needs_texture = program
            .uniforms()
            .any(|(_, slot)| slot.kind == UniformKind::Texture);
        let texture = if needs_texture {
            let fallback;
            let image = match image {
                Some(image) => image,
                None => {
                    log::warn!("{} has no texture image; using the crate board", config.name);
                    fallback = TextureImage::crate_board(128);
                    &fallback
                }
            };
            Some(GpuTexture::upload(device, &context.queue, image))
        } else {
            None
        };

        let mut entries = Vec::new();
        for (name, slot) in program.uniforms().filter(|(_, slot)| slot.group == 0) {
            let resource = match slot.kind {
                UniformKind::Buffer => matrices
                    .get(name)
                    .ok_or_else(|| ProgramError::MissingSlot(name.to_string()))?
                    .as_entire_binding(),
                UniformKind::Texture => match &texture {
                    Some(texture) => wgpu::BindingResource::TextureView(&texture.view),
                    None => return Err(ProgramError::MissingSlot(name.to_string()).into()),
                },
                UniformKind::Sampler => match &texture {
                    Some(texture) => wgpu::BindingResource::Sampler(&texture.sampler),
                    None => return Err(ProgramError::MissingSlot(name.to_string()).into()),
                },
            };
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource,
            });
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("demo-bind-group"),
            layout: &pipeline.bind_group_layout,
            entries: &entries,
        });

        log::info!(
            "{}: {} uniforms, draw {:?}",
            config.name,
            entries.len(),
            geometry.draw_call()
        );

        Ok(Self {
            pipeline,
            geometry,
            matrices,
            bind_group,
            _texture: texture,
            clear_color: to_wgpu_color(config.clear_color),
            depth_test: config.depth_test,
        })
    }

    pub fn draw_call(&self) -> DrawCall {
        self.geometry.draw_call()
    }

    /// Uploads a matrix if the program declares `name`; returns whether it did.
    pub fn push_matrix(&self, queue: &wgpu::Queue, name: &str, matrix: Mat4) -> bool {
        match self.matrices.get(name) {
            Some(buffer) => {
                queue.write_buffer(buffer, 0, bytemuck::cast_slice(&matrix.to_cols_array()));
                true
            }
            None => false,
        }
    }

    pub fn push_view_projection(&self, queue: &wgpu::Queue, view: Mat4, projection: Mat4) {
        self.push_matrix(queue, VIEW_UNIFORM, view);
        self.push_matrix(queue, PROJECTION_UNIFORM, projection);
    }

    pub fn push_world(&self, queue: &wgpu::Queue, world: Mat4) {
        self.push_matrix(queue, WORLD_UNIFORM, world);
    }

    /// Records clear and draw into `target`.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: Option<&wgpu::TextureView>,
    ) {
        let depth_stencil_attachment = depth.filter(|_| self.depth_test).map(|view| {
            wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("demo-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        self.geometry.draw(&mut pass);
    }
}
