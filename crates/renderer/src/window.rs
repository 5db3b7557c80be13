//! Desktop host: a `winit` window driving the shared frame loop.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::error::EventLoopError;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::bootstrap::{bootstrap, InitError, Notifier, Platform};
use crate::frame::FrameInput;
use crate::frame_loop::{FrameError, FrameLoop, FrameOutcome, FrameScheduler};
use crate::gpu::{AcquiredGpu, GpuState};
use crate::input::PointerTracker;
use crate::runtime::time_source_for;
use crate::shader::ShaderProgram;
use crate::types::{GpuPowerPreference, RendererConfig, SurfaceSize};

/// Native `wgpu` instance plus the window its surface will present to.
struct WindowPlatform {
    instance: wgpu::Instance,
    window: Arc<Window>,
    power: GpuPowerPreference,
}

impl WindowPlatform {
    fn new(window: Arc<Window>, power: GpuPowerPreference) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        Self {
            instance,
            window,
            power,
        }
    }
}

impl Platform for WindowPlatform {
    type Gpu = AcquiredGpu;

    const UNSUPPORTED_REASON: &'static str = "no GPU adapter is available on this system";

    fn has_gpu_support(&self) -> bool {
        let adapters = self.instance.enumerate_adapters(wgpu::Backends::all());
        tracing::debug!(count = adapters.len(), "enumerated GPU adapters");
        !adapters.is_empty()
    }

    async fn acquire_gpu(self) -> Result<AcquiredGpu, InitError> {
        let surface = self.instance.create_surface(self.window)?;
        AcquiredGpu::request(self.instance, surface, self.power).await
    }
}

/// Reports start-up failures on standard error.
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&mut self, message: &str) {
        eprintln!("quatmarch: {message}");
    }
}

/// Parks redraw requests while the window has no area, so a minimised
/// window does not spin the event loop.
#[derive(Debug, Default)]
struct RedrawPacer {
    parked: bool,
}

impl RedrawPacer {
    /// Whether the next frame should be requested for a window of `size`.
    fn should_request(&mut self, size: SurfaceSize) -> bool {
        self.parked = size.is_empty();
        !self.parked
    }

    /// Whether a resize to `size` should wake a parked loop.
    fn should_resume(&mut self, size: SurfaceSize) -> bool {
        if self.parked && !size.is_empty() {
            self.parked = false;
            true
        } else {
            false
        }
    }
}

struct RedrawScheduler<'a> {
    window: &'a Window,
    pacer: &'a mut RedrawPacer,
}

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) {
        if self.pacer.should_request(displayed_size(self.window)) {
            self.window.request_redraw();
        } else {
            tracing::debug!("window has no area; parking redraws");
        }
    }
}

fn displayed_size(window: &Window) -> SurfaceSize {
    let PhysicalSize { width, height } = window.inner_size();
    SurfaceSize::new(width, height)
}

/// Opens the window, initialises the GPU and runs the frame loop until the
/// window is closed.
pub(crate) fn run(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialise event loop")?;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(LogicalSize::new(
            config.window_size.width,
            config.window_size.height,
        ))
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let platform = WindowPlatform::new(Arc::clone(&window), config.power_preference);
    let gpu = pollster::block_on(bootstrap(platform, &mut StderrNotifier))
        .context("GPU initialisation failed")?;

    let program = ShaderProgram::load(&config.shader_source)?;
    program.verify(config.check_interface)?;
    let mut gpu = pollster::block_on(GpuState::new(gpu, displayed_size(&window), &program))?;
    info!(shader = %program.label(), size = %gpu.size(), "renderer ready");

    let mut frame_loop = FrameLoop::new(gpu.size());
    let mut pointer = PointerTracker::default();
    let mut clock = time_source_for(config.freeze_time);
    clock.reset();
    let mut pacer = RedrawPacer::default();
    let mut fatal = None;
    let fatal_slot = &mut fatal;
    window.request_redraw();

    let result = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);

        let Event::WindowEvent { window_id, event } = event else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                info!(frames = frame_loop.presented_frames(), "window closed");
                elwt.exit();
            }
            WindowEvent::Resized(size) => {
                if pacer.should_resume(SurfaceSize::new(size.width, size.height)) {
                    window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                pointer.handle_move(position.x, position.y, displayed_size(&window));
            }
            WindowEvent::RedrawRequested => {
                let input = FrameInput {
                    timestamp_ms: clock.now_ms(),
                    display: displayed_size(&window),
                    pointer: pointer.position(),
                };
                let mut scheduler = RedrawScheduler {
                    window: &window,
                    pacer: &mut pacer,
                };
                if let FrameOutcome::Stopped(err) =
                    frame_loop.tick(input, &mut gpu, &mut scheduler)
                {
                    error!(error = %err, "frame loop stopped; closing window");
                    *fatal_slot = Some(err);
                    elwt.exit();
                }
            }
            _ => {}
        }
    });

    finish(result, fatal)
}

/// Folds the event loop result and any fatal frame error into the exit result.
fn finish(result: Result<(), EventLoopError>, fatal: Option<FrameError>) -> Result<()> {
    result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    match fatal {
        Some(err) => Err(anyhow::Error::new(err).context("rendering stopped")),
        None => Ok(()),
    }
}
