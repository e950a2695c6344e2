use crate::layout::VertexLayout;
use crate::program::{Program, ProgramError, UniformKind, UniformSlot};

use super::surface::DepthBuffer;

/// Fixed-function state chosen per demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub color_format: wgpu::TextureFormat,
    pub depth_test: bool,
    pub cull_back_faces: bool,
}

const MATRIX_BYTES: u64 = 64;

/// Layout entries for every uniform the program declares in group 0.
pub fn bind_group_layout_entries(program: &Program) -> Vec<wgpu::BindGroupLayoutEntry> {
    program
        .uniforms()
        .filter(|(_, slot)| slot.group == 0)
        .map(|(_, slot)| layout_entry(slot))
        .collect()
}

fn layout_entry(slot: UniformSlot) -> wgpu::BindGroupLayoutEntry {
    let ty = match slot.kind {
        UniformKind::Buffer => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(MATRIX_BYTES),
        },
        UniformKind::Texture => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        UniformKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
    };
    wgpu::BindGroupLayoutEntry {
        binding: slot.binding,
        visibility: slot.visibility,
        ty,
        count: None,
    }
}

/// Binds each program attribute to its field in the interleaved layout.
///
/// Layout fields the program does not read are skipped; an attribute with
/// no matching field is a link failure.
pub fn vertex_attributes(
    layout: &VertexLayout,
    program: &Program,
) -> Result<Vec<wgpu::VertexAttribute>, ProgramError> {
    let mut attributes = program
        .attributes()
        .map(|(name, location)| {
            let field = layout.field(name).ok_or_else(|| {
                ProgramError::Link(format!("attribute `{name}` has no field in the vertex layout"))
            })?;
            Ok(wgpu::VertexAttribute {
                format: field.wgpu_format(),
                offset: field.offset,
                shader_location: location,
            })
        })
        .collect::<Result<Vec<_>, ProgramError>>()?;
    attributes.sort_by_key(|attribute| attribute.shader_location);
    Ok(attributes)
}

pub fn primitive_state(settings: &PipelineSettings) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: settings.cull_back_faces.then_some(wgpu::Face::Back),
        unclipped_depth: false,
        polygon_mode: wgpu::PolygonMode::Fill,
        conservative: false,
    }
}

pub fn depth_state(settings: &PipelineSettings) -> Option<wgpu::DepthStencilState> {
    settings.depth_test.then(|| wgpu::DepthStencilState {
        format: DepthBuffer::FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

/// Render pipeline plus the bind group layout its uniforms live in.
pub struct DemoPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl DemoPipeline {
    pub fn new(
        device: &wgpu::Device,
        program: &Program,
        layout: &VertexLayout,
        settings: PipelineSettings,
    ) -> Result<Self, ProgramError> {
        let attributes = vertex_attributes(layout, program)?;
        let (vertex_module, fragment_module) = program.create_modules(device);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("demo-uniforms"),
            entries: &bind_group_layout_entries(program),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("demo-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("demo-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(program.vertex_entry()),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: layout.stride(),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            primitive: primitive_state(&settings),
            depth_stencil: depth_state(&settings),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(program.fragment_entry()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: settings.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::VertexFormat;
    use crate::shaders;

    fn settings(depth_test: bool, cull_back_faces: bool) -> PipelineSettings {
        PipelineSettings {
            color_format: wgpu::TextureFormat::Rgba8Unorm,
            depth_test,
            cull_back_faces,
        }
    }

    #[test]
    fn textured_cube_needs_matrices_texture_and_sampler() {
        let program = Program::build(&shaders::textured_cube()).unwrap();
        let entries = bind_group_layout_entries(&program);
        let mut bindings: Vec<u32> = entries.iter().map(|entry| entry.binding).collect();
        bindings.sort_unstable();
        assert_eq!(bindings, vec![0, 1, 2, 3, 4]);

        let sampler = entries.iter().find(|entry| entry.binding == 4).unwrap();
        assert!(matches!(sampler.ty, wgpu::BindingType::Sampler(_)));
        assert_eq!(sampler.visibility, wgpu::ShaderStages::FRAGMENT);
    }

    #[test]
    fn attributes_follow_the_interleaved_layout() {
        let program = Program::build(&shaders::colored_cube()).unwrap();
        let attributes =
            vertex_attributes(&VertexFormat::Position3Color.layout(), &program).unwrap();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].shader_location, 0);
        assert_eq!(attributes[0].offset, 0);
        assert_eq!(attributes[1].offset, 12);
        assert_eq!(attributes[1].format, wgpu::VertexFormat::Float32x3);
    }

    #[test]
    fn attribute_without_field_fails_to_link() {
        let program = Program::build(&shaders::textured_cube()).unwrap();
        let err = vertex_attributes(&VertexFormat::Position3Color.layout(), &program).unwrap_err();
        assert!(matches!(err, ProgramError::Link(message) if message.contains("textureCoord")));
    }

    #[test]
    fn unused_layout_fields_are_skipped() {
        let program = Program::build(&shaders::flat_triangle([1.0, 1.0, 0.0, 1.0])).unwrap();
        let attributes =
            vertex_attributes(&VertexFormat::Position2Color.layout(), &program).unwrap();
        assert_eq!(attributes.len(), 1);
    }

    #[test]
    fn depth_and_culling_follow_settings() {
        assert!(depth_state(&settings(false, false)).is_none());
        let depth = depth_state(&settings(true, true)).unwrap();
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Less);
        assert_eq!(primitive_state(&settings(true, true)).cull_mode, Some(wgpu::Face::Back));
        assert_eq!(primitive_state(&settings(false, false)).cull_mode, None);
    }
}
