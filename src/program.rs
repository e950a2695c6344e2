//! Shader program builder.
//!
//! Both stages are compiled with naga's WGSL front end and validator before
//! any GPU object exists, so compile and link diagnostics are available in
//! headless tools and tests. The attribute/uniform name table is resolved
//! once from the validated modules.

use std::collections::BTreeMap;
use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const WORLD_UNIFORM: &str = "mWorld";
pub const VIEW_UNIFORM: &str = "mView";
pub const PROJECTION_UNIFORM: &str = "mProj";
pub const TEXTURE_UNIFORM: &str = "diffuseTexture";
pub const SAMPLER_UNIFORM: &str = "diffuseSampler";

/// Vertex-stage and fragment-stage WGSL source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("Vertex"),
            Self::Fragment => f.write_str("Fragment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("{stage} shader compilation failed: {diagnostic}")]
    ShaderCompile {
        stage: ShaderStage,
        diagnostic: String,
    },
    #[error("program link failed: {0}")]
    Link(String),
    #[error("program has no attribute or uniform named `{0}`")]
    MissingSlot(String),
}

/// What a uniform slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Buffer,
    Texture,
    Sampler,
}

/// Bind point of a named uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub group: u32,
    pub binding: u32,
    pub kind: UniformKind,
    pub visibility: wgpu::ShaderStages,
}

/// A resolved name from the program's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Attribute(u32),
    Uniform(UniformSlot),
}

/// A compiled and linked vertex/fragment pair.
#[derive(Debug, Clone)]
pub struct Program {
    source: ShaderSource,
    vertex_entry: String,
    fragment_entry: String,
    attributes: BTreeMap<String, u32>,
    uniforms: BTreeMap<String, UniformSlot>,
}

impl Program {
    /// Compiles both stages and links them into a program.
    pub fn build(source: &ShaderSource) -> Result<Self, ProgramError> {
        let vertex = compile(ShaderStage::Vertex, &source.vertex)?;
        let fragment = compile(ShaderStage::Fragment, &source.fragment)?;

        let vertex_entry = find_entry_point(&vertex, naga::ShaderStage::Vertex)
            .ok_or_else(|| ProgramError::Link("no @vertex entry point".to_string()))?;
        let fragment_entry = find_entry_point(&fragment, naga::ShaderStage::Fragment)
            .ok_or_else(|| ProgramError::Link("no @fragment entry point".to_string()))?;

        let outputs = stage_outputs(&vertex, vertex_entry);
        for (location, name, inner) in stage_inputs(&fragment, fragment_entry) {
            match outputs.get(&location) {
                Some(produced) if *produced == inner => {}
                Some(_) => {
                    return Err(ProgramError::Link(format!(
                        "varying `{name}` at location {location} has a different type in the vertex stage"
                    )))
                }
                None => {
                    return Err(ProgramError::Link(format!(
                        "varying `{name}` at location {location} is not written by the vertex stage"
                    )))
                }
            }
        }

        let attributes = stage_inputs(&vertex, vertex_entry)
            .into_iter()
            .map(|(location, name, _)| (name, location))
            .collect();

        let mut uniforms = BTreeMap::new();
        collect_uniforms(&vertex, wgpu::ShaderStages::VERTEX, &mut uniforms)?;
        collect_uniforms(&fragment, wgpu::ShaderStages::FRAGMENT, &mut uniforms)?;

        Ok(Self {
            source: source.clone(),
            vertex_entry: vertex_entry.name.clone(),
            fragment_entry: fragment_entry.name.clone(),
            attributes,
            uniforms,
        })
    }

    pub fn source(&self) -> &ShaderSource {
        &self.source
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.attributes
            .iter()
            .map(|(name, location)| (name.as_str(), *location))
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, UniformSlot)> + '_ {
        self.uniforms
            .iter()
            .map(|(name, slot)| (name.as_str(), *slot))
    }

    /// Looks a name up in the slot table, failing if the program lacks it.
    pub fn resolve(&self, name: &str) -> Result<Slot, ProgramError> {
        if let Some(location) = self.attribute_location(name) {
            return Ok(Slot::Attribute(location));
        }
        self.uniform(name)
            .map(Slot::Uniform)
            .ok_or_else(|| ProgramError::MissingSlot(name.to_string()))
    }

    /// Creates the GPU shader modules for both stages.
    pub fn create_modules(&self, device: &wgpu::Device) -> (wgpu::ShaderModule, wgpu::ShaderModule) {
        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vertex-stage"),
            source: wgpu::ShaderSource::Wgsl(self.source.vertex.as_str().into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fragment-stage"),
            source: wgpu::ShaderSource::Wgsl(self.source.fragment.as_str().into()),
        });
        (vertex, fragment)
    }
}

fn compile(stage: ShaderStage, source: &str) -> Result<naga::Module, ProgramError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| {
        ProgramError::ShaderCompile {
            stage,
            diagnostic: err.emit_to_string(source),
        }
    })?;
    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|err| ProgramError::ShaderCompile {
            stage,
            diagnostic: err.as_inner().to_string(),
        })?;
    Ok(module)
}

fn find_entry_point(module: &naga::Module, stage: naga::ShaderStage) -> Option<&naga::EntryPoint> {
    module.entry_points.iter().find(|entry| entry.stage == stage)
}

/// `(location, name, type)` of every located entry-point argument.
fn stage_inputs(
    module: &naga::Module,
    entry: &naga::EntryPoint,
) -> Vec<(u32, String, naga::TypeInner)> {
    let mut inputs = Vec::new();
    for argument in &entry.function.arguments {
        match &argument.binding {
            Some(binding) => {
                if let Some(location) = location_of(binding) {
                    let name = argument.name.clone().unwrap_or_default();
                    inputs.push((location, name, module.types[argument.ty].inner.clone()));
                }
            }
            None => inputs.extend(struct_locations(module, argument.ty)),
        }
    }
    inputs
}

fn stage_outputs(
    module: &naga::Module,
    entry: &naga::EntryPoint,
) -> BTreeMap<u32, naga::TypeInner> {
    let Some(result) = &entry.function.result else {
        return BTreeMap::new();
    };
    match &result.binding {
        Some(binding) => location_of(binding)
            .map(|location| (location, module.types[result.ty].inner.clone()))
            .into_iter()
            .collect(),
        None => struct_locations(module, result.ty)
            .into_iter()
            .map(|(location, _, inner)| (location, inner))
            .collect(),
    }
}

fn struct_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
) -> Vec<(u32, String, naga::TypeInner)> {
    let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner else {
        return Vec::new();
    };
    members
        .iter()
        .filter_map(|member| {
            let location = member.binding.as_ref().and_then(location_of)?;
            Some((
                location,
                member.name.clone().unwrap_or_default(),
                module.types[member.ty].inner.clone(),
            ))
        })
        .collect()
}

fn location_of(binding: &naga::Binding) -> Option<u32> {
    match binding {
        naga::Binding::Location { location, .. } => Some(*location),
        _ => None,
    }
}

fn collect_uniforms(
    module: &naga::Module,
    stage: wgpu::ShaderStages,
    uniforms: &mut BTreeMap<String, UniformSlot>,
) -> Result<(), ProgramError> {
    for (_, global) in module.global_variables.iter() {
        let (Some(name), Some(binding)) = (&global.name, &global.binding) else {
            continue;
        };
        let kind = match (global.space, &module.types[global.ty].inner) {
            (naga::AddressSpace::Uniform, _) => UniformKind::Buffer,
            (naga::AddressSpace::Handle, naga::TypeInner::Image { .. }) => UniformKind::Texture,
            (naga::AddressSpace::Handle, naga::TypeInner::Sampler { .. }) => UniformKind::Sampler,
            _ => continue,
        };
        match uniforms.get_mut(name) {
            Some(existing) => {
                if existing.group != binding.group
                    || existing.binding != binding.binding
                    || existing.kind != kind
                {
                    return Err(ProgramError::Link(format!(
                        "uniform `{name}` is bound differently in the two stages"
                    )));
                }
                existing.visibility |= stage;
            }
            None => {
                uniforms.insert(
                    name.clone(),
                    UniformSlot {
                        group: binding.group,
                        binding: binding.binding,
                        kind,
                        visibility: stage,
                    },
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::YELLOW;
    use crate::shaders;

    #[test]
    fn textured_program_resolves_every_name() {
        let program = Program::build(&shaders::textured_cube()).unwrap();
        assert_eq!(program.attribute_location("coordinates"), Some(0));
        assert_eq!(program.attribute_location("textureCoord"), Some(1));
        for name in [WORLD_UNIFORM, VIEW_UNIFORM, PROJECTION_UNIFORM] {
            let slot = program.uniform(name).unwrap();
            assert_eq!(slot.kind, UniformKind::Buffer);
            assert_eq!(slot.visibility, wgpu::ShaderStages::VERTEX);
        }
        assert_eq!(program.uniform(TEXTURE_UNIFORM).unwrap().kind, UniformKind::Texture);
        assert_eq!(program.uniform(SAMPLER_UNIFORM).unwrap().kind, UniformKind::Sampler);
        assert_eq!(program.vertex_entry(), "vs_main");
        assert_eq!(program.fragment_entry(), "fs_main");
    }

    #[test]
    fn colored_triangle_has_no_uniforms() {
        let program = Program::build(&shaders::colored_triangle()).unwrap();
        assert_eq!(program.attribute_location("vertColor"), Some(1));
        assert_eq!(program.uniforms().count(), 0);
        assert_eq!(
            program.resolve(WORLD_UNIFORM),
            Err(ProgramError::MissingSlot(WORLD_UNIFORM.to_string()))
        );
        assert_eq!(program.resolve("coordinates"), Ok(Slot::Attribute(0)));
    }

    #[test]
    fn flat_triangle_color_is_baked_into_source() {
        let source = shaders::flat_triangle(YELLOW.rgba);
        assert!(source.fragment.contains("vec4<f32>(1.0000, 1.0000, 0.0000, 1.0000)"));
        Program::build(&source).unwrap();
    }

    #[test]
    fn syntax_error_reports_the_stage() {
        let mut source = shaders::colored_cube();
        source.vertex = source.vertex.replace("return out;", "return out");
        match Program::build(&source) {
            Err(ProgramError::ShaderCompile { stage, diagnostic }) => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!diagnostic.is_empty());
            }
            other => panic!("expected a compile error, got {other:?}"),
        }

        let mut source = shaders::colored_cube();
        source.fragment.push_str("\nfn broken( {");
        let err = Program::build(&source).unwrap_err();
        assert!(err.to_string().starts_with("Fragment shader compilation failed"));
    }

    #[test]
    fn varying_without_producer_fails_to_link() {
        let source = ShaderSource {
            vertex: shaders::flat_triangle(YELLOW.rgba).vertex,
            fragment: shaders::colored_triangle().fragment,
        };
        assert!(matches!(Program::build(&source), Err(ProgramError::Link(_))));
    }

    #[test]
    fn missing_entry_point_fails_to_link() {
        let source = ShaderSource {
            vertex: shaders::colored_triangle().fragment,
            fragment: shaders::colored_triangle().fragment,
        };
        assert_eq!(
            Program::build(&source).unwrap_err(),
            ProgramError::Link("no @vertex entry point".to_string())
        );
    }
}
