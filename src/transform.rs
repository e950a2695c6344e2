//! Projection, camera and per-frame world rotation.
//!
//! Matrices are column-major `glam::Mat4` in a left-handed frame with a
//! `0..1` clip depth range, which is what wgpu expects on every backend.

use std::f32::consts::TAU;

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds needed for one full turn of the world rotation.
pub const ROTATION_PERIOD_SECS: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("camera eye and target coincide")]
    EyeAtTarget,
    #[error("camera forward direction is parallel to its up vector")]
    ForwardParallelToUp,
}

/// Perspective projection parameters; the field of view is vertical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perspective {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Perspective {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Perspective {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() { aspect.max(0.01) } else { 1.0 };
        Mat4::perspective_lh(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }
}

/// Orthonormal camera axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, -5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl Camera {
    pub fn basis(&self) -> Result<CameraBasis, TransformError> {
        let forward = self.target - self.eye;
        if forward.length_squared() <= f32::EPSILON {
            return Err(TransformError::EyeAtTarget);
        }
        let forward = forward.normalize();
        let right = self.up.cross(forward);
        if right.length_squared() <= f32::EPSILON {
            return Err(TransformError::ForwardParallelToUp);
        }
        let right = right.normalize();
        Ok(CameraBasis {
            right,
            up: forward.cross(right),
            forward,
        })
    }

    /// World-to-camera matrix.
    pub fn view_matrix(&self) -> Result<Mat4, TransformError> {
        let CameraBasis { right, up, forward } = self.basis()?;
        Ok(Mat4::from_cols(
            Vec4::new(right.x, up.x, forward.x, 0.0),
            Vec4::new(right.y, up.y, forward.y, 0.0),
            Vec4::new(right.z, up.z, forward.z, 0.0),
            Vec4::new(
                -right.dot(self.eye),
                -up.dot(self.eye),
                -forward.dot(self.eye),
                1.0,
            ),
        ))
    }
}

/// Axis the world matrix spins around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RotationAxis {
    /// A single axis, cardinal or diagonal.
    Fixed { axis: Vec3 },
    /// `rot_x(angle) * rot_y(angle * y_rate)`.
    Composed { y_rate: f32 },
}

impl RotationAxis {
    /// Rotation by `angle` radians applied to the identity.
    pub fn matrix(&self, angle: f32) -> Mat4 {
        match *self {
            Self::Fixed { axis } => {
                let axis = axis.normalize_or_zero();
                if axis == Vec3::ZERO {
                    Mat4::IDENTITY
                } else {
                    Mat4::from_axis_angle(axis, angle)
                }
            }
            Self::Composed { y_rate } => {
                Mat4::from_rotation_x(angle) * Mat4::from_rotation_y(angle * y_rate)
            }
        }
    }
}

/// Time-driven rotation of the world matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub axis: RotationAxis,
    #[serde(default = "default_period")]
    pub period_secs: f32,
}

fn default_period() -> f32 {
    ROTATION_PERIOD_SECS
}

impl Rotation {
    pub fn new(axis: RotationAxis) -> Self {
        Self {
            axis,
            period_secs: ROTATION_PERIOD_SECS,
        }
    }

    pub fn angle_at(&self, elapsed_secs: f32) -> f32 {
        rotation_angle(elapsed_secs, self.period_secs)
    }

    /// World matrix at `elapsed_secs`, rebuilt from the identity every call.
    pub fn world_matrix(&self, elapsed_secs: f32) -> Mat4 {
        self.axis.matrix(self.angle_at(elapsed_secs))
    }
}

/// `elapsed / period` turns, in radians.
pub fn rotation_angle(elapsed_secs: f32, period_secs: f32) -> f32 {
    elapsed_secs / period_secs * TAU
}

/// World, view and projection matrices for one demo.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    camera: Camera,
    perspective: Perspective,
    rotation: Option<Rotation>,
    view: Mat4,
    projection: Mat4,
}

impl TransformPipeline {
    pub fn new(
        camera: Camera,
        perspective: Perspective,
        rotation: Option<Rotation>,
        aspect: f32,
    ) -> Result<Self, TransformError> {
        Ok(Self {
            view: camera.view_matrix()?,
            projection: perspective.matrix(aspect),
            camera,
            perspective,
            rotation,
        })
    }

    /// Rebuilds the projection for a new surface aspect ratio.
    pub fn resize(&mut self, aspect: f32) {
        self.projection = self.perspective.matrix(aspect);
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn rotation(&self) -> Option<&Rotation> {
        self.rotation.as_ref()
    }

    pub fn world_at(&self, elapsed_secs: f32) -> Mat4 {
        self.rotation
            .map(|rotation| rotation.world_matrix(elapsed_secs))
            .unwrap_or(Mat4::IDENTITY)
    }
}
