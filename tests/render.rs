use once_cell::sync::Lazy;

use gl_demos::app::{DemoSession, OffscreenSink};
use gl_demos::render::{GpuContext, OffscreenTarget, TextureImage};
use gl_demos::{DemoConfig, DemoKind, FrameLoop, Tick};

const SIZE: (u32, u32) = (64, 64);

static CONTEXT: Lazy<Option<GpuContext>> =
    Lazy::new(|| pollster::block_on(GpuContext::headless()).ok());

/// Renders `frames` frames and reads the target back; `None` without an adapter.
fn render(config: DemoConfig, image: Option<&TextureImage>, frames: u64) -> Option<TextureImage> {
    let Some(context) = CONTEXT.as_ref() else {
        eprintln!("no GPU adapter available; skipping");
        return None;
    };
    let target = OffscreenTarget::new(&context.device, SIZE.0, SIZE.1);
    let session = DemoSession::new(context, config, OffscreenTarget::FORMAT, image, SIZE)
        .expect("demo session");

    let mut frame_loop = FrameLoop::new().with_frame_limit(Some(frames));
    assert!(frame_loop.start());
    let mut sink = OffscreenSink {
        context,
        session: &session,
        target: &target,
    };
    while frame_loop
        .tick(session.transforms(), 0.0, &mut sink)
        .expect("frame")
        == Tick::Rearm
    {}
    assert_eq!(frame_loop.frames_drawn(), frames);
    Some(target.read_pixels(context).expect("readback"))
}

fn center(image: &TextureImage) -> [u8; 4] {
    image
        .pixel(image.width / 2, image.height / 2)
        .expect("center pixel")
}

fn close(actual: [u8; 4], expected: [u8; 4]) -> bool {
    actual
        .iter()
        .zip(expected)
        .all(|(a, e)| a.abs_diff(e) <= 2)
}

#[test]
fn flat_triangle_draws_yellow_over_magenta() {
    let Some(pixels) = render(DemoKind::FlatTriangle.config(), None, 1) else {
        return;
    };
    assert_eq!(center(&pixels), [255, 255, 0, 255]);
    assert_eq!(pixels.pixel(0, 0), Some([255, 0, 255, 255]));
    assert_eq!(pixels.pixel(SIZE.0 - 1, SIZE.1 - 1), Some([255, 0, 255, 255]));
}

#[test]
fn colored_cube_shows_its_front_face_first() {
    let Some(pixels) = render(DemoKind::ColoredCube.config(), None, 2) else {
        return;
    };
    assert!(close(center(&pixels), [255, 0, 38, 255]));
    let corner = pixels.pixel(0, 0).expect("corner pixel");
    assert!(close(corner, [191, 217, 204, 255]));
}

#[test]
fn textured_cube_samples_the_supplied_image() {
    let blue = TextureImage::from_rgba(2, 2, [0, 0, 255, 255].repeat(4)).expect("image");
    let Some(pixels) = render(DemoKind::TexturedCube.config(), Some(&blue), 1) else {
        return;
    };
    assert!(close(center(&pixels), [0, 0, 255, 255]));
}

#[test]
fn rotating_demo_without_world_uniform_is_rejected() {
    let Some(context) = CONTEXT.as_ref() else {
        return;
    };
    let config = DemoKind::FlatTriangle
        .config()
        .with_axis(gl_demos::demo::parse_axis("z").expect("axis"));
    let err = DemoSession::new(context, config, OffscreenTarget::FORMAT, None, SIZE)
        .err()
        .expect("missing world uniform");
    assert!(err.to_string().contains("mWorld"));
}

#[test]
fn mid_gray_texels_reach_the_target_unchanged() {
    let gray = TextureImage::from_rgba(2, 2, [128, 128, 128, 255].repeat(4)).expect("image");
    let Some(pixels) = render(DemoKind::TexturedCube.config(), Some(&gray), 1) else {
        return;
    };
    assert!(close(center(&pixels), [128, 128, 128, 255]));
}

#[test]
fn clear_color_bytes_are_not_gamma_encoded() {
    let mut config = DemoKind::ColoredTriangle.config();
    config.clear_color = [0.5, 0.5, 0.5, 1.0];
    let Some(pixels) = render(config, None, 1) else {
        return;
    };
    let corner = pixels.pixel(0, 0).expect("corner pixel");
    assert!(close(corner, [128, 128, 128, 255]));
}

#[test]
fn screen_covering_triangle_overwrites_a_black_clear() {
    let mut config = DemoKind::FlatTriangle.config();
    config.clear_color = [0.0, 0.0, 0.0, 1.0];
    config.mesh.vertices = vec![-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];
    let Some(pixels) = render(config, None, 1) else {
        return;
    };
    for (index, pixel) in pixels.rgba.chunks(4).enumerate() {
        assert_eq!(pixel, [255, 255, 0, 255], "pixel {index}");
    }
}
