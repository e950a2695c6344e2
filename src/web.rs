#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement};

use crate::app::{DemoSession, SurfaceSink};
use crate::demo::DemoKind;
use crate::error::DemoError;
use crate::frame_loop::{CancelToken, FrameLoop, Tick};
use crate::render::{GpuContext, TextureImage, WindowSurface};

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Handle to a demo running on a canvas.
#[wasm_bindgen]
pub struct WebDemo {
    cancel: CancelToken,
}

#[wasm_bindgen]
impl WebDemo {
    /// Stops the animation loop at the next frame.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Starts `demo` on the canvas with id `canvas_id`. Textured demos read
/// their pixels from the `<img>` with id `image_id` when one is given.
#[wasm_bindgen]
pub async fn start_demo(
    canvas_id: String,
    demo: String,
    image_id: Option<String>,
) -> Result<WebDemo, JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| report("document not available"))?;
    let canvas = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| report(format!("canvas `{canvas_id}` not found")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| report(format!("`{canvas_id}` is not a canvas")))?;

    let kind: DemoKind = demo.parse().map_err(report)?;
    let config = kind.config();
    let image = match image_id {
        Some(id) if config.is_textured() => Some(read_image(&document, &id).map_err(report)?),
        _ => None,
    };

    let size = (canvas.width().max(1), canvas.height().max(1));
    let (context, surface) =
        GpuContext::for_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .await
            .map_err(report)?;
    let surface = WindowSurface::new(&context, surface, size.0, size.1);
    let session = DemoSession::new(&context, config, surface.format(), image.as_ref(), size)
        .map_err(report)?;

    let mut frame_loop = FrameLoop::new();
    frame_loop.start();
    let cancel = frame_loop.cancel_token();

    let state = Rc::new(RefCell::new(CanvasState {
        canvas,
        context,
        surface,
        session,
        frame_loop,
        started_ms: None,
    }));
    schedule_animation_loop(state).map_err(|err| report(format!("{err:?}")))?;
    Ok(WebDemo { cancel })
}

struct CanvasState {
    canvas: HtmlCanvasElement,
    context: GpuContext,
    surface: WindowSurface,
    session: DemoSession,
    frame_loop: FrameLoop,
    started_ms: Option<f64>,
}

impl CanvasState {
    fn render_frame(&mut self, now_ms: f64) -> Result<Tick, DemoError> {
        let started = *self.started_ms.get_or_insert(now_ms);
        let elapsed = ((now_ms - started) / 1000.0) as f32;

        let size = (self.canvas.width(), self.canvas.height());
        if size != self.surface.size() && size.0 > 0 && size.1 > 0 {
            self.surface.resize(&self.context.device, size.0, size.1);
            self.session.resize(&self.context.queue, size);
        }

        let mut sink = SurfaceSink {
            context: &self.context,
            session: &self.session,
            surface: &mut self.surface,
        };
        self.frame_loop
            .tick(self.session.transforms(), elapsed, &mut sink)
    }
}

type FrameCallback = Closure<dyn FnMut(f64)>;

fn schedule_animation_loop(state: Rc<RefCell<CanvasState>>) -> Result<(), JsValue> {
    let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let rearm = Rc::clone(&callback);

    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |now_ms: f64| {
        let outcome = state.borrow_mut().render_frame(now_ms);
        match outcome {
            Ok(Tick::Rearm) => {
                if let Some(closure) = rearm.borrow().as_ref() {
                    if let Err(err) = request_animation_frame(closure) {
                        report(format!("{err:?}"));
                    }
                }
            }
            Ok(Tick::Finished) => {}
            Err(err) => {
                report(err);
            }
        }
    }) as Box<dyn FnMut(f64)>));

    match callback.borrow().as_ref() {
        Some(closure) => request_animation_frame(closure).map(|_| ()),
        None => Ok(()),
    }
}

fn request_animation_frame(closure: &FrameCallback) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("window not available"))?
        .request_animation_frame(closure.as_ref().unchecked_ref())
}

/// Copies an `<img>` element's pixels through a scratch 2D canvas.
fn read_image(document: &Document, image_id: &str) -> Result<TextureImage, DemoError> {
    let image = document
        .get_element_by_id(image_id)
        .ok_or_else(|| DemoError::Texture(format!("image `{image_id}` not found")))?
        .dyn_into::<HtmlImageElement>()
        .map_err(|_| DemoError::Texture(format!("`{image_id}` is not an image")))?;
    let (width, height) = (image.natural_width(), image.natural_height());

    let scratch = document
        .create_element("canvas")
        .map_err(|err| DemoError::Texture(format!("{err:?}")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| DemoError::Texture("scratch canvas unavailable".into()))?;
    scratch.set_width(width);
    scratch.set_height(height);
    let context = scratch
        .get_context("2d")
        .map_err(|err| DemoError::Texture(format!("{err:?}")))?
        .ok_or_else(|| DemoError::Texture("2d context unavailable".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| DemoError::Texture("2d context unavailable".into()))?;
    context
        .draw_image_with_html_image_element(&image, 0.0, 0.0)
        .map_err(|err| DemoError::Texture(format!("{err:?}")))?;
    let pixels = context
        .get_image_data(0.0, 0.0, width as f64, height as f64)
        .map_err(|err| DemoError::Texture(format!("{err:?}")))?;
    TextureImage::from_rgba(width, height, pixels.data().0)
}

/// Shows an error to the user and hands it back as a JS value.
fn report(err: impl Display) -> JsValue {
    let message = err.to_string();
    web_sys::console::error_1(&JsValue::from_str(&message));
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(&message);
    }
    JsValue::from_str(&message)
}
