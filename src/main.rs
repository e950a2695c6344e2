use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use pollster::block_on;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use gl_demos::app::{demo_listing, describe, DemoSession, OffscreenSink, SurfaceSink};
use gl_demos::config::{CliOptions, Mode};
use gl_demos::frame_loop::{FrameLoop, Tick};
use gl_demos::render::{GpuContext, OffscreenTarget, TextureImage, WindowSurface};
use gl_demos::DemoConfig;

const HEADLESS_FRAME_SECS: f32 = 1.0 / 60.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn,naga=warn"),
    )
    .init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    if options.mode == Mode::List {
        print!("{}", demo_listing());
        return Ok(());
    }

    let config = options.load_demo()?;
    match options.mode {
        Mode::Describe => {
            print!("{}", describe(&config, options.size)?);
            Ok(())
        }
        Mode::DumpConfig => {
            println!("{}", config.to_json()?);
            Ok(())
        }
        Mode::Headless => {
            let image = load_texture(&options, &config)?;
            run_headless(&options, config, image)
        }
        Mode::Window | Mode::List => {
            let image = load_texture(&options, &config)?;
            match run_window(&options, config.clone(), image.clone()) {
                Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
                    eprintln!("{err}. Falling back to --headless rendering.");
                    run_headless(&options, config, image)
                }
                result => result,
            }
        }
    }
}

fn load_texture(options: &CliOptions, config: &DemoConfig) -> Result<Option<TextureImage>> {
    if !config.is_textured() {
        return Ok(None);
    }
    options
        .texture
        .as_deref()
        .map(TextureImage::from_path)
        .transpose()
        .context("failed to load texture image")
}

fn run_headless(options: &CliOptions, config: DemoConfig, image: Option<TextureImage>) -> Result<()> {
    let context = block_on(GpuContext::headless())?;
    let (width, height) = options.size;
    let target = OffscreenTarget::new(&context.device, width, height);
    let name = config.name.clone();
    let session = DemoSession::new(
        &context,
        config,
        OffscreenTarget::FORMAT,
        image.as_ref(),
        target.size(),
    )?;

    let mut frame_loop = FrameLoop::new().with_frame_limit(Some(options.frames.unwrap_or(1)));
    frame_loop.start();
    let mut sink = OffscreenSink {
        context: &context,
        session: &session,
        target: &target,
    };
    loop {
        let elapsed = frame_loop.frames_drawn() as f32 * HEADLESS_FRAME_SECS;
        if frame_loop.tick(session.transforms(), elapsed, &mut sink)? == Tick::Finished {
            break;
        }
    }
    println!(
        "Rendered {} frame(s) of {name} at {width}x{height}",
        frame_loop.frames_drawn()
    );

    if let Some(path) = &options.snapshot {
        write_snapshot(&context, &target, path)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn write_snapshot(context: &GpuContext, target: &OffscreenTarget, path: &Path) -> Result<()> {
    let pixels = target.read_pixels(context)?;
    image::save_buffer(
        path,
        &pixels.rgba,
        pixels.width,
        pixels.height,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("failed to write snapshot {}", path.display()))
}

#[derive(Debug, Error)]
#[error("failed to initialize {stage}: {message}")]
struct WindowInitError {
    stage: &'static str,
    message: String,
}

fn run_window(options: &CliOptions, config: DemoConfig, image: Option<TextureImage>) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| WindowInitError {
        stage: "event loop",
        message: err.to_string(),
    })?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = DemoWindow {
        size: options.size,
        frame_limit: options.frames,
        pending: Some((config, image)),
        state: None,
        last_error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("window event loop failed")?;

    if let Some(state) = &app.state {
        info!("closed after {} frame(s)", state.frame_loop.frames_drawn());
    }
    match app.last_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct DemoWindow {
    size: (u32, u32),
    frame_limit: Option<u64>,
    pending: Option<(DemoConfig, Option<TextureImage>)>,
    state: Option<WindowState>,
    last_error: Option<anyhow::Error>,
}

struct WindowState {
    window: Arc<Window>,
    context: GpuContext,
    surface: WindowSurface,
    session: DemoSession,
    frame_loop: FrameLoop,
    started: Instant,
}

impl DemoWindow {
    fn open(
        &self,
        event_loop: &ActiveEventLoop,
        config: DemoConfig,
        image: Option<TextureImage>,
    ) -> Result<WindowState> {
        let attributes = Window::default_attributes()
            .with_title(format!("gl-demos: {}", config.title))
            .with_inner_size(LogicalSize::new(self.size.0 as f64, self.size.1 as f64));
        let window = Arc::new(event_loop.create_window(attributes).map_err(|err| {
            WindowInitError {
                stage: "window",
                message: err.to_string(),
            }
        })?);

        let inner = window.inner_size();
        let size = (inner.width.max(1), inner.height.max(1));
        let (context, surface) = block_on(GpuContext::for_surface(Arc::clone(&window)))?;
        let surface = WindowSurface::new(&context, surface, size.0, size.1);
        let session = DemoSession::new(&context, config, surface.format(), image.as_ref(), size)?;

        let mut frame_loop = FrameLoop::new().with_frame_limit(self.frame_limit);
        frame_loop.start();
        window.request_redraw();

        Ok(WindowState {
            window,
            context,
            surface,
            session,
            frame_loop,
            started: Instant::now(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.last_error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for DemoWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some((config, image)) = self.pending.take() else {
            return;
        };
        match self.open(event_loop, config, image) {
            Ok(state) => self.state = Some(state),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if window_id != state.window.id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                state.frame_loop.cancel_token().cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state
                    .surface
                    .resize(&state.context.device, size.width, size.height);
                state
                    .session
                    .resize(&state.context.queue, state.surface.size());
                state.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let elapsed = state.started.elapsed().as_secs_f32();
                let mut sink = SurfaceSink {
                    context: &state.context,
                    session: &state.session,
                    surface: &mut state.surface,
                };
                match state
                    .frame_loop
                    .tick(state.session.transforms(), elapsed, &mut sink)
                {
                    Ok(Tick::Rearm) => state.window.request_redraw(),
                    Ok(Tick::Finished) => event_loop.exit(),
                    Err(err) => {
                        self.last_error = Some(err.into());
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}
