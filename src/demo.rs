use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{Rgba, BLACK, MAGENTA, YELLOW};
use crate::mesh::{GeometryError, Mesh};
use crate::program::ShaderSource;
use crate::shaders;
use crate::transform::{Camera, Perspective, Rotation, RotationAxis};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown demo `{0}`")]
    UnknownDemo(String),
    #[error("unknown rotation axis `{0}`")]
    UnknownAxis(String),
    #[error("invalid demo record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid demo mesh: {0}")]
    Geometry(#[from] GeometryError),
    #[error("invalid demo record: {0}")]
    Invalid(String),
}

/// Everything needed to run one demo on the shared pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    pub name: String,
    pub title: String,
    pub mesh: Mesh,
    pub shaders: ShaderSource,
    #[serde(default)]
    pub camera: Camera,
    #[serde(default)]
    pub perspective: Perspective,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    pub clear_color: Rgba,
    #[serde(default)]
    pub depth_test: bool,
    #[serde(default)]
    pub cull_back_faces: bool,
}

impl DemoConfig {
    /// Parses and validates a JSON demo record.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the mesh plus every numeric field a frame depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mesh.validate()?;

        if let Some(rotation) = &self.rotation {
            if !(rotation.period_secs.is_finite() && rotation.period_secs > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "rotation period must be positive, got {}",
                    rotation.period_secs
                )));
            }
        }

        let Perspective {
            fov_y_degrees,
            near,
            far,
        } = self.perspective;
        if !(fov_y_degrees.is_finite() && fov_y_degrees > 0.0 && fov_y_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "field of view must be within (0, 180) degrees, got {fov_y_degrees}"
            )));
        }
        if !(near.is_finite() && near > 0.0) {
            return Err(ConfigError::Invalid(format!("near plane must be positive, got {near}")));
        }
        if !(far.is_finite() && far > near) {
            return Err(ConfigError::Invalid(format!(
                "far plane must lie beyond the near plane, got near {near} far {far}"
            )));
        }

        if let Some(component) = self
            .clear_color
            .iter()
            .find(|component| !(0.0..=1.0).contains(*component))
        {
            return Err(ConfigError::Invalid(format!(
                "clear color components must be within [0, 1], got {component}"
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replaces the rotation axis, keeping the period.
    pub fn with_axis(mut self, axis: RotationAxis) -> Self {
        let period = self
            .rotation
            .map(|rotation| rotation.period_secs)
            .unwrap_or(crate::transform::ROTATION_PERIOD_SECS);
        self.rotation = Some(Rotation {
            axis,
            period_secs: period,
        });
        self
    }

    pub fn is_textured(&self) -> bool {
        self.shaders.fragment.contains("texture_2d")
    }
}

/// The built-in demos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoKind {
    FlatTriangle,
    ColoredTriangle,
    TexturedCube,
    ColoredCube,
}

const CUBE_CLEAR: Rgba = [0.75, 0.85, 0.8, 1.0];

impl DemoKind {
    pub const ALL: [DemoKind; 4] = [
        Self::FlatTriangle,
        Self::ColoredTriangle,
        Self::TexturedCube,
        Self::ColoredCube,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::FlatTriangle => "flat-triangle",
            Self::ColoredTriangle => "colored-triangle",
            Self::TexturedCube => "textured-cube",
            Self::ColoredCube => "colored-cube",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::FlatTriangle => "Yellow triangle on magenta",
            Self::ColoredTriangle => "Triangle with per-vertex colors",
            Self::TexturedCube => "Textured cube spinning on two axes",
            Self::ColoredCube => "Per-face colored cube spinning on a diagonal",
        }
    }

    pub fn config(self) -> DemoConfig {
        let base = |mesh: Mesh, shaders: ShaderSource, clear_color: Rgba| DemoConfig {
            name: self.name().to_string(),
            title: self.title().to_string(),
            mesh,
            shaders,
            camera: Camera::default(),
            perspective: Perspective::default(),
            rotation: None,
            clear_color,
            depth_test: false,
            cull_back_faces: false,
        };
        match self {
            Self::FlatTriangle => base(
                Mesh::flat_triangle(),
                shaders::flat_triangle(YELLOW.rgba),
                MAGENTA.rgba,
            ),
            Self::ColoredTriangle => base(
                Mesh::colored_triangle(),
                shaders::colored_triangle(),
                BLACK.rgba,
            ),
            Self::TexturedCube => DemoConfig {
                rotation: Some(Rotation::new(RotationAxis::Composed { y_rate: 0.25 })),
                depth_test: true,
                cull_back_faces: true,
                ..base(Mesh::textured_cube(), shaders::textured_cube(), CUBE_CLEAR)
            },
            Self::ColoredCube => DemoConfig {
                rotation: Some(Rotation::new(RotationAxis::Fixed {
                    axis: Vec3::new(1.0, 1.0, 0.0),
                })),
                depth_test: true,
                cull_back_faces: true,
                ..base(Mesh::colored_cube(), shaders::colored_cube(), CUBE_CLEAR)
            },
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DemoKind {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ConfigError::UnknownDemo(name.to_string()))
    }
}

/// Parses the `--axis` names: `x`, `y`, `z`, `diagonal`, `composed`.
pub fn parse_axis(name: &str) -> Result<RotationAxis, ConfigError> {
    let fixed = |axis: Vec3| RotationAxis::Fixed { axis };
    Ok(match name.to_ascii_lowercase().as_str() {
        "x" => fixed(Vec3::X),
        "y" => fixed(Vec3::Y),
        "z" => fixed(Vec3::Z),
        "diagonal" => fixed(Vec3::new(1.0, 1.0, 0.0)),
        "composed" => RotationAxis::Composed { y_rate: 0.25 },
        _ => return Err(ConfigError::UnknownAxis(name.to_string())),
    })
}
