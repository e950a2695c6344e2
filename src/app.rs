use std::fmt::Write as _;

use glam::Mat4;

use crate::demo::{DemoConfig, DemoKind};
use crate::error::DemoError;
use crate::frame_loop::{FrameInput, FrameSink};
use crate::mesh::DrawCall;
use crate::program::{Program, Slot};
use crate::render::{DemoRenderer, GpuContext, OffscreenTarget, TextureImage, WindowSurface};
use crate::transform::TransformPipeline;

/// A demo ready to draw: compiled program, GPU state and transforms.
pub struct DemoSession {
    config: DemoConfig,
    renderer: DemoRenderer,
    transforms: TransformPipeline,
}

impl DemoSession {
    pub fn new(
        context: &GpuContext,
        config: DemoConfig,
        color_format: wgpu::TextureFormat,
        image: Option<&TextureImage>,
        size: (u32, u32),
    ) -> Result<Self, DemoError> {
        let program = Program::build(&config.shaders).inspect_err(|err| {
            log::error!("{}: {err}", config.name);
        })?;
        let transforms = TransformPipeline::new(
            config.camera,
            config.perspective,
            config.rotation,
            aspect_ratio(size),
        )?;
        let renderer = DemoRenderer::new(context, &config, &program, color_format, image)?;
        renderer.push_view_projection(&context.queue, transforms.view(), transforms.projection());
        log::info!("{} ready at {}x{}", config.name, size.0, size.1);

        Ok(Self {
            config,
            renderer,
            transforms,
        })
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn transforms(&self) -> &TransformPipeline {
        &self.transforms
    }

    /// Rebuilds and re-uploads the projection for a new target size.
    pub fn resize(&mut self, queue: &wgpu::Queue, size: (u32, u32)) {
        self.transforms.resize(aspect_ratio(size));
        self.renderer
            .push_view_projection(queue, self.transforms.view(), self.transforms.projection());
    }

    /// Uploads the frame's world matrix, then clears and draws into `target`.
    pub fn render(
        &self,
        context: &GpuContext,
        frame: FrameInput,
        target: &wgpu::TextureView,
        depth: Option<&wgpu::TextureView>,
    ) {
        if let Some(world) = frame.world {
            self.renderer.push_world(&context.queue, world);
        }
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("demo-frame"),
            });
        self.renderer.encode(&mut encoder, target, depth);
        context.queue.submit(Some(encoder.finish()));
    }
}

pub fn aspect_ratio((width, height): (u32, u32)) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Presents each frame to a window or canvas surface.
pub struct SurfaceSink<'a> {
    pub context: &'a GpuContext,
    pub session: &'a DemoSession,
    pub surface: &'a mut WindowSurface,
}

impl FrameSink for SurfaceSink<'_> {
    type Error = DemoError;

    fn draw_frame(&mut self, frame: FrameInput) -> Result<(), DemoError> {
        let output = match self.surface.acquire() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = self.surface.size();
                self.surface.resize(&self.context.device, width, height);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(DemoError::Surface("GPU is out of memory".into()));
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                return Ok(());
            }
        };
        let view = self.surface.frame_view(&output);
        self.session
            .render(self.context, frame, &view, Some(self.surface.depth_view()));
        output.present();
        Ok(())
    }
}

/// Draws each frame into an offscreen texture.
pub struct OffscreenSink<'a> {
    pub context: &'a GpuContext,
    pub session: &'a DemoSession,
    pub target: &'a OffscreenTarget,
}

impl FrameSink for OffscreenSink<'_> {
    type Error = DemoError;

    fn draw_frame(&mut self, frame: FrameInput) -> Result<(), DemoError> {
        self.session.render(
            self.context,
            frame,
            self.target.view(),
            Some(self.target.depth_view()),
        );
        Ok(())
    }
}

/// One line per built-in demo.
pub fn demo_listing() -> String {
    let mut out = String::new();
    for kind in DemoKind::ALL {
        let _ = writeln!(out, "{:<18} {}", kind.name(), kind.title());
    }
    out
}

/// Builds the program without a GPU and reports its slots, layout and transforms.
pub fn describe(config: &DemoConfig, size: (u32, u32)) -> Result<String, DemoError> {
    let program = Program::build(&config.shaders)?;
    let transforms = TransformPipeline::new(
        config.camera,
        config.perspective,
        config.rotation,
        aspect_ratio(size),
    )?;
    let layout = config.mesh.layout();

    let mut out = String::new();
    let _ = writeln!(out, "{} - {}", config.name, config.title);
    let _ = writeln!(
        out,
        "entry points: {} / {}",
        program.vertex_entry(),
        program.fragment_entry()
    );
    let _ = writeln!(out, "attributes:");
    for (name, location) in program.attributes() {
        let field = layout
            .field(name)
            .map(|field| format!("{} floats at byte {}", field.components, field.offset))
            .unwrap_or_else(|| "no layout field".to_string());
        let _ = writeln!(out, "  {name} @ location {location}: {field}");
    }
    let _ = writeln!(out, "uniforms:");
    for (name, _) in program.uniforms() {
        if let Ok(Slot::Uniform(slot)) = program.resolve(name) {
            let _ = writeln!(
                out,
                "  {name} @ group {} binding {} ({:?})",
                slot.group, slot.binding, slot.kind
            );
        }
    }
    let _ = writeln!(
        out,
        "layout: {:?}, stride {} bytes, {} vertices",
        config.mesh.format,
        layout.stride(),
        config.mesh.vertex_count()
    );
    let draw = match config.mesh.draw_call() {
        DrawCall::Arrays { vertex_count } => format!("draw arrays ({vertex_count} vertices)"),
        DrawCall::Indexed { index_count } => format!("draw indexed ({index_count} indices, u16)"),
    };
    let _ = writeln!(out, "draw: {draw}");
    let _ = writeln!(
        out,
        "depth test: {}, cull back faces: {}",
        config.depth_test, config.cull_back_faces
    );
    match transforms.rotation() {
        Some(rotation) => {
            let _ = writeln!(
                out,
                "rotation: {:?}, one turn per {}s",
                rotation.axis, rotation.period_secs
            );
        }
        None => {
            let _ = writeln!(out, "rotation: none");
        }
    }
    write_matrix(&mut out, "view", transforms.view());
    write_matrix(&mut out, "projection", transforms.projection());
    Ok(out)
}

fn write_matrix(out: &mut String, label: &str, matrix: Mat4) {
    let _ = writeln!(out, "{label}:");
    for row in 0..4 {
        let row = matrix.row(row);
        let _ = writeln!(
            out,
            "  [{:>8.3} {:>8.3} {:>8.3} {:>8.3}]",
            row.x, row.y, row.z, row.w
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_handles_zero_height() {
        assert_eq!(aspect_ratio((640, 480)), 640.0 / 480.0);
        assert_eq!(aspect_ratio((640, 0)), 1.0);
    }

    #[test]
    fn listing_names_every_demo() {
        let listing = demo_listing();
        for kind in DemoKind::ALL {
            assert!(listing.contains(kind.name()));
        }
    }

    #[test]
    fn describe_reports_slots_and_draw_call() {
        let text = describe(&DemoKind::TexturedCube.config(), (640, 480)).unwrap();
        assert!(text.contains("textureCoord @ location 1: 2 floats at byte 12"));
        assert!(text.contains("diffuseSampler @ group 0 binding 4"));
        assert!(text.contains("draw indexed (36 indices, u16)"));
        assert!(text.contains("stride 20 bytes"));
    }

    #[test]
    fn describe_surfaces_compile_errors() {
        let mut config = DemoKind::FlatTriangle.config();
        config.shaders.fragment = "@fragment fn fs_main( {".into();
        let err = describe(&config, (640, 480)).unwrap_err();
        assert!(err.to_string().starts_with("Fragment shader compilation failed"));
    }
}
