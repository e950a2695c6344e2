use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use crate::color::{self, Rgba};
use crate::demo::{parse_axis, DemoConfig, DemoKind};
use crate::transform::RotationAxis;

pub const USAGE: &str = "Usage: gl-demos [DEMO] [--list] [--describe] [--dump-config] \
[--config <file.json>] [--texture <path>] [--axis x|y|z|diagonal|composed] [--clear <color>] \
[--frames <n>] [--headless] [--size WxH] [--snapshot <file.png>]";

pub const DEFAULT_SIZE: (u32, u32) = (640, 480);

/// What the binary should do once options are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    List,
    Describe,
    DumpConfig,
    Headless,
    Window,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub demo: DemoKind,
    pub mode: Mode,
    pub config_path: Option<PathBuf>,
    pub texture: Option<PathBuf>,
    pub axis: Option<RotationAxis>,
    pub clear_color: Option<Rgba>,
    pub frames: Option<u64>,
    pub size: (u32, u32),
    pub snapshot: Option<PathBuf>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            demo: DemoKind::ColoredCube,
            mode: Mode::Window,
            config_path: None,
            texture: None,
            axis: None,
            clear_color: None,
            frames: None,
            size: DEFAULT_SIZE,
            snapshot: None,
        }
    }
}

impl CliOptions {
    pub fn parse() -> Result<Self> {
        Self::parse_from(std::env::args().skip(1))
    }

    pub fn parse_from<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::default();
        let mut demo_seen = false;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} needs a value\n{USAGE}"))
            };
            match arg.as_str() {
                "--list" => options.mode = Mode::List,
                "--describe" => options.mode = Mode::Describe,
                "--dump-config" => options.mode = Mode::DumpConfig,
                "--headless" => options.mode = Mode::Headless,
                "--config" => options.config_path = Some(value("--config")?.into()),
                "--texture" => options.texture = Some(value("--texture")?.into()),
                "--snapshot" => options.snapshot = Some(value("--snapshot")?.into()),
                "--axis" => options.axis = Some(parse_axis(&value("--axis")?)?),
                "--clear" => {
                    let name = value("--clear")?;
                    let named = color::lookup(&name)
                        .ok_or_else(|| anyhow!("unknown color `{name}`"))?;
                    options.clear_color = Some(named.rgba);
                }
                "--frames" => {
                    let raw = value("--frames")?;
                    let frames: u64 = raw
                        .parse()
                        .with_context(|| format!("invalid frame count `{raw}`"))?;
                    if frames == 0 {
                        bail!("--frames must be at least 1");
                    }
                    options.frames = Some(frames);
                }
                "--size" => options.size = parse_size(&value("--size")?)?,
                other if other.starts_with('-') => {
                    bail!("Unknown argument: {other}\n{USAGE}");
                }
                name if !demo_seen => {
                    options.demo = name.parse()?;
                    demo_seen = true;
                }
                extra => bail!("Unexpected argument: {extra}\n{USAGE}"),
            }
        }
        if options.snapshot.is_some() && options.mode != Mode::Headless {
            bail!("--snapshot requires --headless");
        }
        Ok(options)
    }

    /// Loads the selected demo record and applies command-line overrides.
    pub fn load_demo(&self) -> Result<DemoConfig> {
        let mut config = match &self.config_path {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                DemoConfig::from_json(&json)
                    .with_context(|| format!("failed to load demo record {}", path.display()))?
            }
            None => self.demo.config(),
        };
        if let Some(axis) = self.axis {
            config = config.with_axis(axis);
        }
        if let Some(clear) = self.clear_color {
            config.clear_color = clear;
        }
        Ok(config)
    }
}

fn parse_size(raw: &str) -> Result<(u32, u32)> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("size must look like WxH, got `{raw}`"))?;
    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("invalid width in `{raw}`"))?;
    let height: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("invalid height in `{raw}`"))?;
    if width == 0 || height == 0 {
        bail!("size must be non-zero, got `{raw}`");
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse_from(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn defaults_to_colored_cube_in_a_window() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.demo, DemoKind::ColoredCube);
        assert_eq!(options.mode, Mode::Window);
        assert_eq!(options.size, DEFAULT_SIZE);
    }

    #[test]
    fn parses_headless_snapshot_run() {
        let options = parse(&[
            "flat-triangle",
            "--headless",
            "--size",
            "64x32",
            "--frames",
            "3",
            "--snapshot",
            "out.png",
        ])
        .unwrap();
        assert_eq!(options.demo, DemoKind::FlatTriangle);
        assert_eq!(options.mode, Mode::Headless);
        assert_eq!(options.size, (64, 32));
        assert_eq!(options.frames, Some(3));
        assert_eq!(options.snapshot, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn overrides_apply_to_the_loaded_demo() {
        let options = parse(&["colored-triangle", "--axis", "y", "--clear", "Orange"]).unwrap();
        let config = options.load_demo().unwrap();
        assert_eq!(config.clear_color, color::ORANGE.rgba);
        assert_eq!(
            config.rotation.map(|rotation| rotation.axis),
            Some(RotationAxis::Fixed { axis: Vec3::Y })
        );
    }

    #[test]
    fn rejects_bad_input() {
        let unknown = parse(&["--fullscreen"]).unwrap_err().to_string();
        assert!(unknown.contains("Unknown argument: --fullscreen"));
        assert!(unknown.contains("Usage: gl-demos"));
        assert!(parse(&["--size", "640"]).is_err());
        assert!(parse(&["--size", "0x10"]).is_err());
        assert!(parse(&["--frames"]).is_err());
        assert!(parse(&["--frames", "0"]).is_err());
        assert!(parse(&["--snapshot", "out.png"]).is_err());
        assert!(parse(&["teapot"]).is_err());
        assert!(parse(&["flat-triangle", "colored-cube"]).is_err());
    }
}
