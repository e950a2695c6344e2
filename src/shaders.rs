//! WGSL sources for the built-in demos.

use crate::color::Rgba;
use crate::program::ShaderSource;

const POSITION_ONLY_VERTEX: &str = r#"
@vertex
fn vs_main(@location(0) coordinates: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(coordinates, 0.0, 1.0);
}
"#;

const COLORED_TRIANGLE_VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) fragColor: vec3<f32>,
}

@vertex
fn vs_main(
    @location(0) coordinates: vec2<f32>,
    @location(1) vertColor: vec3<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.fragColor = vertColor;
    out.position = vec4<f32>(coordinates, 0.0, 1.0);
    return out;
}
"#;

const COLOR_FRAGMENT: &str = r#"
@fragment
fn fs_main(@location(0) fragColor: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(fragColor, 1.0);
}
"#;

const COLORED_CUBE_VERTEX: &str = r#"
@group(0) @binding(0)
var<uniform> mWorld: mat4x4<f32>;
@group(0) @binding(1)
var<uniform> mView: mat4x4<f32>;
@group(0) @binding(2)
var<uniform> mProj: mat4x4<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) fragColor: vec3<f32>,
}

@vertex
fn vs_main(
    @location(0) coordinates: vec3<f32>,
    @location(1) vertColor: vec3<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.fragColor = vertColor;
    out.position = mProj * mView * mWorld * vec4<f32>(coordinates, 1.0);
    return out;
}
"#;

const TEXTURED_CUBE_VERTEX: &str = r#"
@group(0) @binding(0)
var<uniform> mWorld: mat4x4<f32>;
@group(0) @binding(1)
var<uniform> mView: mat4x4<f32>;
@group(0) @binding(2)
var<uniform> mProj: mat4x4<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) fragTexCoord: vec2<f32>,
}

@vertex
fn vs_main(
    @location(0) coordinates: vec3<f32>,
    @location(1) textureCoord: vec2<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.fragTexCoord = textureCoord;
    out.position = mProj * mView * mWorld * vec4<f32>(coordinates, 1.0);
    return out;
}
"#;

const TEXTURED_CUBE_FRAGMENT: &str = r#"
@group(0) @binding(3)
var diffuseTexture: texture_2d<f32>;
@group(0) @binding(4)
var diffuseSampler: sampler;

@fragment
fn fs_main(@location(0) fragTexCoord: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(diffuseTexture, diffuseSampler, fragTexCoord);
}
"#;

/// Single-color triangle; the color is written into the fragment source.
pub fn flat_triangle(color: Rgba) -> ShaderSource {
    let [r, g, b, a] = color;
    ShaderSource {
        vertex: POSITION_ONLY_VERTEX.to_string(),
        fragment: format!(
            "\n@fragment\nfn fs_main() -> @location(0) vec4<f32> {{\n    return vec4<f32>({r:.4}, {g:.4}, {b:.4}, {a:.4});\n}}\n"
        ),
    }
}

pub fn colored_triangle() -> ShaderSource {
    ShaderSource {
        vertex: COLORED_TRIANGLE_VERTEX.to_string(),
        fragment: COLOR_FRAGMENT.to_string(),
    }
}

pub fn colored_cube() -> ShaderSource {
    ShaderSource {
        vertex: COLORED_CUBE_VERTEX.to_string(),
        fragment: COLOR_FRAGMENT.to_string(),
    }
}

pub fn textured_cube() -> ShaderSource {
    ShaderSource {
        vertex: TEXTURED_CUBE_VERTEX.to_string(),
        fragment: TEXTURED_CUBE_FRAGMENT.to_string(),
    }
}
