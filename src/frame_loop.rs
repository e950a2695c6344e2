use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Mat4;

use crate::transform::TransformPipeline;

/// Shared flag that stops a [`FrameLoop`] at its next tick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Whether the host should schedule another tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Rearm,
    Finished,
}

/// Per-frame input handed to a [`FrameSink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub elapsed_secs: f32,
    /// Freshly computed world matrix, absent for demos that do not rotate.
    pub world: Option<Mat4>,
}

/// Receives one unit of drawing work per tick: upload, clear, draw.
pub trait FrameSink {
    type Error;

    fn draw_frame(&mut self, frame: FrameInput) -> Result<(), Self::Error>;
}

/// Host-driven render loop.
///
/// The loop never schedules itself; the host calls [`FrameLoop::tick`] from
/// its refresh callback and re-arms the callback while `Tick::Rearm` is
/// returned.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    cancel: CancelToken,
    frames_drawn: u64,
    frame_limit: Option<u64>,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            cancel: CancelToken::new(),
            frames_drawn: 0,
            frame_limit: None,
        }
    }

    /// Stops the loop after `frames` draws.
    pub fn with_frame_limit(mut self, frames: Option<u64>) -> Self {
        self.frame_limit = frames;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Idle -> Running. Returns `false` if the loop already left Idle.
    pub fn start(&mut self) -> bool {
        if self.state != LoopState::Idle {
            return false;
        }
        self.state = LoopState::Running;
        log::debug!("frame loop running");
        true
    }

    /// Performs one frame of work.
    pub fn tick<S: FrameSink>(
        &mut self,
        transforms: &TransformPipeline,
        elapsed_secs: f32,
        sink: &mut S,
    ) -> Result<Tick, S::Error> {
        if self.state != LoopState::Running {
            return Ok(Tick::Finished);
        }
        if self.cancel.is_cancelled() {
            self.stop("cancelled");
            return Ok(Tick::Finished);
        }
        if self.limit_reached() {
            self.stop("frame limit reached");
            return Ok(Tick::Finished);
        }

        let frame = FrameInput {
            elapsed_secs,
            world: transforms
                .rotation()
                .map(|rotation| rotation.world_matrix(elapsed_secs)),
        };
        if let Err(err) = sink.draw_frame(frame) {
            self.stop("frame failed");
            return Err(err);
        }
        self.frames_drawn += 1;

        if self.limit_reached() {
            self.stop("frame limit reached");
            return Ok(Tick::Finished);
        }
        Ok(Tick::Rearm)
    }

    fn limit_reached(&self) -> bool {
        self.frame_limit
            .is_some_and(|limit| self.frames_drawn >= limit)
    }

    fn stop(&mut self, reason: &str) {
        self.state = LoopState::Stopped;
        log::info!("frame loop stopped after {} frame(s): {reason}", self.frames_drawn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Camera, Perspective, Rotation, RotationAxis};
    use glam::Vec3;

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<FrameInput>,
        fail_on: Option<usize>,
    }

    impl FrameSink for RecordingSink {
        type Error = String;

        fn draw_frame(&mut self, frame: FrameInput) -> Result<(), String> {
            if self.fail_on == Some(self.frames.len()) {
                return Err("device lost".to_string());
            }
            self.frames.push(frame);
            Ok(())
        }
    }

    fn spinning() -> TransformPipeline {
        let rotation = Rotation::new(RotationAxis::Fixed { axis: Vec3::Z });
        TransformPipeline::new(Camera::default(), Perspective::default(), Some(rotation), 1.0)
            .unwrap()
    }

    #[test]
    fn idle_loop_draws_nothing() {
        let mut frame_loop = FrameLoop::new();
        let mut sink = RecordingSink::default();
        let tick = frame_loop.tick(&spinning(), 0.5, &mut sink).unwrap();
        assert_eq!(tick, Tick::Finished);
        assert!(sink.frames.is_empty());
        assert_eq!(frame_loop.state(), LoopState::Idle);
    }

    #[test]
    fn running_loop_recomputes_world_each_tick() {
        let transforms = spinning();
        let mut frame_loop = FrameLoop::new();
        assert!(frame_loop.start());
        assert!(!frame_loop.start());

        let mut sink = RecordingSink::default();
        for elapsed in [0.0, 1.5, 1.5] {
            assert_eq!(
                frame_loop.tick(&transforms, elapsed, &mut sink).unwrap(),
                Tick::Rearm
            );
        }
        assert_eq!(frame_loop.frames_drawn(), 3);
        assert_eq!(sink.frames[0].world, Some(Mat4::IDENTITY));
        assert_eq!(sink.frames[1].world, sink.frames[2].world);
        let quarter_turn = Mat4::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2);
        assert!(sink.frames[1].world.unwrap().abs_diff_eq(quarter_turn, 1e-6));
    }

    #[test]
    fn static_demo_sends_no_world_matrix() {
        let transforms =
            TransformPipeline::new(Camera::default(), Perspective::default(), None, 1.0).unwrap();
        let mut frame_loop = FrameLoop::new();
        frame_loop.start();
        let mut sink = RecordingSink::default();
        frame_loop.tick(&transforms, 2.0, &mut sink).unwrap();
        assert_eq!(sink.frames[0].world, None);
        assert_eq!(sink.frames[0].elapsed_secs, 2.0);
    }

    #[test]
    fn cancel_token_stops_the_loop() {
        let transforms = spinning();
        let mut frame_loop = FrameLoop::new();
        let token = frame_loop.cancel_token();
        frame_loop.start();
        let mut sink = RecordingSink::default();
        frame_loop.tick(&transforms, 0.1, &mut sink).unwrap();

        token.cancel();
        assert_eq!(
            frame_loop.tick(&transforms, 0.2, &mut sink).unwrap(),
            Tick::Finished
        );
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert_eq!(sink.frames.len(), 1);
        assert!(!frame_loop.start());
    }

    #[test]
    fn frame_limit_finishes_on_last_frame() {
        let transforms = spinning();
        let mut frame_loop = FrameLoop::new().with_frame_limit(Some(2));
        frame_loop.start();
        let mut sink = RecordingSink::default();
        assert_eq!(frame_loop.tick(&transforms, 0.0, &mut sink), Ok(Tick::Rearm));
        assert_eq!(frame_loop.tick(&transforms, 0.1, &mut sink), Ok(Tick::Finished));
        assert_eq!(frame_loop.tick(&transforms, 0.2, &mut sink), Ok(Tick::Finished));
        assert_eq!(sink.frames.len(), 2);
    }

    #[test]
    fn zero_frame_limit_draws_nothing() {
        let transforms = spinning();
        let mut frame_loop = FrameLoop::new().with_frame_limit(Some(0));
        frame_loop.start();
        let mut sink = RecordingSink::default();
        assert_eq!(frame_loop.tick(&transforms, 0.0, &mut sink), Ok(Tick::Finished));
        assert!(sink.frames.is_empty());
        assert_eq!(frame_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn sink_error_stops_and_propagates() {
        let transforms = spinning();
        let mut frame_loop = FrameLoop::new();
        frame_loop.start();
        let mut sink = RecordingSink {
            fail_on: Some(1),
            ..RecordingSink::default()
        };
        frame_loop.tick(&transforms, 0.0, &mut sink).unwrap();
        assert_eq!(
            frame_loop.tick(&transforms, 0.1, &mut sink),
            Err("device lost".to_string())
        );
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert_eq!(frame_loop.frames_drawn(), 1);
    }
}
