//! GPU side of the demos: context, buffers, pipeline and targets.

pub mod context;
pub mod geometry;
pub mod offscreen;
pub mod pipeline;
pub mod renderer;
pub mod surface;
pub mod texture;

pub use context::GpuContext;
pub use geometry::GeometryBuffer;
pub use offscreen::OffscreenTarget;
pub use pipeline::{DemoPipeline, PipelineSettings};
pub use renderer::DemoRenderer;
pub use surface::WindowSurface;
pub use texture::{GpuTexture, TextureImage};
