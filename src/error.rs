use thiserror::Error;

use crate::mesh::GeometryError;
use crate::program::ProgramError;
use crate::transform::TransformError;

/// Setup and frame errors. Every variant ends the current demo run.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("WebGL not supported!")]
    ContextUnavailable { detail: String },
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("texture error: {0}")]
    Texture(String),
    #[error("surface error: {0}")]
    Surface(String),
}

impl DemoError {
    pub(crate) fn context_unavailable(detail: impl std::fmt::Display) -> Self {
        let detail = detail.to_string();
        log::error!("graphics context unavailable: {detail}");
        Self::ContextUnavailable { detail }
    }
}
