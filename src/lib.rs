//! WebGL tutorial demos rebuilt on one shared rendering pipeline.
//!
//! Each demo is a [`DemoConfig`] record: a mesh, a shader pair and the
//! transforms that animate it. The library compiles and reflects the
//! shaders, uploads geometry and drives a host-scheduled frame loop; the
//! binary and the browser glue only supply a surface and a clock.

pub mod app;
pub mod color;
pub mod config;
pub mod demo;
pub mod error;
pub mod frame_loop;
pub mod layout;
pub mod mesh;
pub mod program;
pub mod render;
pub mod shaders;
pub mod transform;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use color::{NamedColor, Rgba};
pub use demo::{ConfigError, DemoConfig, DemoKind};
pub use error::DemoError;
pub use frame_loop::{CancelToken, FrameInput, FrameLoop, FrameSink, LoopState, Tick};
pub use layout::{VertexFormat, VertexLayout};
pub use mesh::{DrawCall, GeometryError, Mesh};
pub use program::{Program, ProgramError, ShaderSource, Slot};
pub use transform::{Camera, Perspective, Rotation, RotationAxis, TransformError, TransformPipeline};
