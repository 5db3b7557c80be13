//! Drives [`frame::step`](crate::frame::step) against the host's GPU and frame callback.

use thiserror::Error;
use tracing::{error, trace, warn};

use crate::frame::{step, DrawCall, FrameInput, FramePlan, FrameState};
use crate::gpu::uniforms::FrameUniforms;
use crate::types::SurfaceSize;

/// Requests the next invocation of the frame callback.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// The GPU side of a frame: resize, upload, draw, submit, present.
pub trait FrameSink {
    /// Resizes the backing surface to exactly `size`.
    fn resize(&mut self, size: SurfaceSize);
    /// Reconfigures the surface at its current size after it was lost.
    fn reconfigure(&mut self);
    /// Writes `uniforms`, records one pass for `draw`, submits and presents.
    fn render(&mut self, uniforms: &FrameUniforms, draw: &DrawCall) -> Result<(), FrameError>;
}

/// Failures acquiring or presenting a surface texture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("surface was lost")]
    Lost,
    #[error("surface is outdated")]
    Outdated,
    #[error("timed out acquiring the next surface texture")]
    Timeout,
    #[error("out of memory acquiring the next surface texture")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Other(String),
}

impl FrameError {
    /// Fatal errors stop the loop; everything else skips one frame.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::OutOfMemory)
    }

    pub fn needs_reconfigure(&self) -> bool {
        matches!(self, FrameError::Lost | FrameError::Outdated)
    }
}

impl From<wgpu::SurfaceError> for FrameError {
    fn from(value: wgpu::SurfaceError) -> Self {
        match value {
            wgpu::SurfaceError::Lost => FrameError::Lost,
            wgpu::SurfaceError::Outdated => FrameError::Outdated,
            wgpu::SurfaceError::Timeout => FrameError::Timeout,
            wgpu::SurfaceError::OutOfMemory => FrameError::OutOfMemory,
            #[allow(unreachable_patterns)]
            other => FrameError::Other(other.to_string()),
        }
    }
}

/// What happened to a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Presented,
    Skipped,
    /// The loop stopped; no further frame was requested.
    Stopped(FrameError),
}

/// Owns the [`FrameState`] between frame callbacks.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    state: FrameState,
    frames: u64,
}

impl FrameLoop {
    pub fn new(surface: SurfaceSize) -> Self {
        Self {
            state: FrameState::new(surface),
            frames: 0,
        }
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    /// Frames presented so far.
    pub fn presented_frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame and requests the next one unless the failure was fatal.
    pub fn tick<S, R>(&mut self, input: FrameInput, sink: &mut S, scheduler: &mut R) -> FrameOutcome
    where
        S: FrameSink + ?Sized,
        R: FrameScheduler + ?Sized,
    {
        let (next, plan) = step(&self.state, input);
        self.state = next;

        let outcome = match plan {
            FramePlan::Skip => {
                trace!(display = %input.display, "display has no area; skipping frame");
                FrameOutcome::Skipped
            }
            FramePlan::Render {
                resize,
                uniforms,
                draw,
            } => {
                if let Some(size) = resize {
                    trace!(%size, "resizing surface to displayed size");
                    sink.resize(size);
                }
                match sink.render(&uniforms, &draw) {
                    Ok(()) => {
                        self.frames += 1;
                        FrameOutcome::Presented
                    }
                    Err(err) if err.is_fatal() => {
                        error!(error = %err, frames = self.frames, "stopping frame loop");
                        return FrameOutcome::Stopped(err);
                    }
                    Err(err) => {
                        if err.needs_reconfigure() {
                            sink.reconfigure();
                        }
                        warn!(error = %err, "skipping frame");
                        FrameOutcome::Skipped
                    }
                }
            }
        };

        scheduler.request_frame();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::input::PointerPosition;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Resize(SurfaceSize),
        Reconfigure,
        Render([f32; 6], u32, u32),
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<Call>,
        failures: VecDeque<FrameError>,
    }

    impl FrameSink for RecordingSink {
        fn resize(&mut self, size: SurfaceSize) {
            self.calls.push(Call::Resize(size));
        }

        fn reconfigure(&mut self) {
            self.calls.push(Call::Reconfigure);
        }

        fn render(&mut self, uniforms: &FrameUniforms, draw: &DrawCall) -> Result<(), FrameError> {
            self.calls.push(Call::Render(
                uniforms.fields(),
                draw.vertex_count,
                draw.instance_count,
            ));
            match self.failures.pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct CountingScheduler {
        requests: usize,
    }

    impl FrameScheduler for CountingScheduler {
        fn request_frame(&mut self) {
            self.requests += 1;
        }
    }

    fn input(timestamp_ms: f64, width: u32, height: u32) -> FrameInput {
        FrameInput {
            timestamp_ms,
            display: SurfaceSize::new(width, height),
            pointer: PointerPosition::default(),
        }
    }

    #[test]
    fn first_frame_resizes_then_draws_and_reschedules() {
        let mut frame_loop = FrameLoop::new(SurfaceSize::new(300, 150));
        let mut sink = RecordingSink::default();
        let mut scheduler = CountingScheduler::default();

        let outcome = frame_loop.tick(input(1000.0, 640, 480), &mut sink, &mut scheduler);

        assert_eq!(outcome, FrameOutcome::Presented);
        assert_eq!(
            sink.calls,
            vec![
                Call::Resize(SurfaceSize::new(640, 480)),
                Call::Render([640.0, 480.0, 1.0, 0.0, 0.5, 0.5], 6, 1),
            ]
        );
        assert_eq!(scheduler.requests, 1);
    }

    #[test]
    fn reschedules_exactly_once_per_frame() {
        let mut frame_loop = FrameLoop::new(SurfaceSize::new(64, 64));
        let mut sink = RecordingSink::default();
        sink.failures.push_back(FrameError::Timeout);
        sink.failures.push_back(FrameError::Outdated);
        let mut scheduler = CountingScheduler::default();

        let frames = [
            input(0.0, 64, 64),
            input(16.0, 64, 64),
            input(32.0, 0, 64),
            input(48.0, 128, 64),
            input(64.0, 128, 64),
        ];
        for (index, frame) in frames.into_iter().enumerate() {
            frame_loop.tick(frame, &mut sink, &mut scheduler);
            assert_eq!(scheduler.requests, index + 1);
        }
        assert_eq!(frame_loop.presented_frames(), 2);
    }

    #[test]
    fn lost_surface_is_reconfigured_and_frame_skipped() {
        let mut frame_loop = FrameLoop::new(SurfaceSize::new(32, 32));
        let mut sink = RecordingSink::default();
        sink.failures.push_back(FrameError::Lost);
        let mut scheduler = CountingScheduler::default();

        let outcome = frame_loop.tick(input(0.0, 32, 32), &mut sink, &mut scheduler);

        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(sink.calls.last(), Some(&Call::Reconfigure));
        assert_eq!(scheduler.requests, 1);
    }

    #[test]
    fn out_of_memory_stops_without_rescheduling() {
        let mut frame_loop = FrameLoop::new(SurfaceSize::new(32, 32));
        let mut sink = RecordingSink::default();
        sink.failures.push_back(FrameError::OutOfMemory);
        let mut scheduler = CountingScheduler::default();

        let outcome = frame_loop.tick(input(0.0, 32, 32), &mut sink, &mut scheduler);

        assert_eq!(outcome, FrameOutcome::Stopped(FrameError::OutOfMemory));
        assert_eq!(scheduler.requests, 0);
    }

    #[test]
    fn hidden_display_issues_no_gpu_work() {
        let mut frame_loop = FrameLoop::new(SurfaceSize::new(32, 32));
        let mut sink = RecordingSink::default();
        let mut scheduler = CountingScheduler::default();

        let outcome = frame_loop.tick(input(0.0, 0, 0), &mut sink, &mut scheduler);

        assert_eq!(outcome, FrameOutcome::Skipped);
        assert!(sink.calls.is_empty());
        assert_eq!(frame_loop.state().surface, SurfaceSize::new(32, 32));
    }

    #[test]
    fn surface_errors_map_onto_frame_errors() {
        assert_eq!(FrameError::from(wgpu::SurfaceError::Lost), FrameError::Lost);
        assert!(FrameError::from(wgpu::SurfaceError::OutOfMemory).is_fatal());
        assert!(!FrameError::Timeout.is_fatal());
        assert!(FrameError::Outdated.needs_reconfigure());
    }
}
