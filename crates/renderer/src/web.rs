//! Browser host: a canvas element, WebGPU and `requestAnimationFrame`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, MouseEvent, Response};

use crate::bootstrap::{bootstrap, InitError, Notifier, Platform};
use crate::frame::{DrawCall, FrameInput};
use crate::frame_loop::{FrameError, FrameLoop, FrameOutcome, FrameScheduler, FrameSink};
use crate::gpu::uniforms::FrameUniforms;
use crate::gpu::{AcquiredGpu, GpuState};
use crate::input::PointerTracker;
use crate::runtime::{FixedTimeSource, TimeSource};
use crate::shader::ShaderProgram;
use crate::types::{
    GpuPowerPreference, RendererConfig, SurfaceSize, DEFAULT_CANVAS_ID, DEFAULT_SHADER_PATH,
};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Installs the panic hook and routes log records to the browser console.
#[wasm_bindgen(start)]
pub fn init_console() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Renders `shader/shader.wgsl` into the `gpuCanvas` element.
#[wasm_bindgen]
pub fn start() {
    start_with(DEFAULT_CANVAS_ID, DEFAULT_SHADER_PATH, None);
}

/// Renders the shader at `shader_url` into the canvas with id `canvas_id`,
/// optionally pinning the uniform time to `freeze_time` seconds.
#[wasm_bindgen]
pub fn start_with(canvas_id: &str, shader_url: &str, freeze_time: Option<f32>) {
    let config = RendererConfig::for_canvas(canvas_id, shader_url, freeze_time);
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = run(config).await {
            tracing::error!("renderer stopped: {err:#}");
        }
    });
}

struct WebPlatform {
    window: web_sys::Window,
    canvas: HtmlCanvasElement,
    power: GpuPowerPreference,
}

impl Platform for WebPlatform {
    type Gpu = AcquiredGpu;

    const UNSUPPORTED_REASON: &'static str =
        "WebGPU is not supported by your browser or may not be enabled.";

    fn has_gpu_support(&self) -> bool {
        js_sys::Reflect::get(&self.window.navigator(), &JsValue::from_str("gpu"))
            .map(|gpu| !gpu.is_undefined() && !gpu.is_null())
            .unwrap_or(false)
    }

    async fn acquire_gpu(self) -> Result<AcquiredGpu, InitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(self.canvas))?;
        AcquiredGpu::request(instance, surface, self.power).await
    }
}

/// Shows start-up failures with `window.alert`.
pub struct AlertNotifier {
    window: web_sys::Window,
}

impl Notifier for AlertNotifier {
    fn notify(&mut self, message: &str) {
        if let Err(err) = self.window.alert_with_message(message) {
            tracing::error!(?err, "window.alert failed");
        }
    }
}

struct AnimationFrameScheduler {
    window: web_sys::Window,
    callback: FrameCallback,
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self) {
        let callback = self.callback.borrow();
        let Some(closure) = callback.as_ref() else {
            return;
        };
        if let Err(err) = self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            tracing::error!(?err, "requestAnimationFrame failed");
        }
    }
}

/// Keeps the canvas backing store in step with the configured surface.
struct CanvasSink {
    canvas: HtmlCanvasElement,
    gpu: GpuState,
}

impl FrameSink for CanvasSink {
    fn resize(&mut self, size: SurfaceSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        self.gpu.resize(size);
    }

    fn reconfigure(&mut self) {
        self.gpu.reconfigure();
    }

    fn render(&mut self, uniforms: &FrameUniforms, draw: &DrawCall) -> Result<(), FrameError> {
        self.gpu.render(uniforms, draw)
    }
}

fn displayed_size(canvas: &HtmlCanvasElement) -> SurfaceSize {
    let width = canvas.client_width().max(0) as u32;
    let height = canvas.client_height().max(0) as u32;
    SurfaceSize::new(width, height)
}

async fn fetch_shader(window: &web_sys::Window, url: &str) -> Result<ShaderProgram> {
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| anyhow!("failed to fetch shader at {url}: {err:?}"))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| anyhow!("fetch for {url} did not return a Response"))?;
    if !response.ok() {
        return Err(anyhow!(
            "failed to fetch shader at {url}: HTTP {}",
            response.status()
        ));
    }
    let text = response
        .text()
        .map_err(|err| anyhow!("failed to read shader body from {url}: {err:?}"))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|err| anyhow!("failed to read shader body from {url}: {err:?}"))?;
    let source = text
        .as_string()
        .ok_or_else(|| anyhow!("shader body from {url} is not text"))?;
    Ok(ShaderProgram::new(url, source))
}

async fn run(config: RendererConfig) -> Result<()> {
    let window = web_sys::window().context("no global window")?;
    let document = window.document().context("window has no document")?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(&config.canvas_id)
        .with_context(|| format!("no element with id '{}'", config.canvas_id))?
        .dyn_into()
        .map_err(|_| anyhow!("element '{}' is not a canvas", config.canvas_id))?;

    let platform = WebPlatform {
        window: window.clone(),
        canvas: canvas.clone(),
        power: config.power_preference,
    };
    let mut notifier = AlertNotifier {
        window: window.clone(),
    };
    let gpu = bootstrap(platform, &mut notifier)
        .await
        .context("GPU initialisation failed")?;

    let shader_url = config.shader_source.to_string_lossy();
    let program = fetch_shader(&window, &shader_url).await?;
    program.verify(config.check_interface)?;
    let initial = SurfaceSize::new(canvas.width(), canvas.height());
    let gpu = GpuState::new(gpu, initial, &program).await?;
    tracing::info!(shader = %program.label(), size = %gpu.size(), "renderer ready");

    let pointer = Rc::new(Cell::new(PointerTracker::default()));
    {
        let pointer = Rc::clone(&pointer);
        let target = canvas.clone();
        let on_move = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let mut tracker = pointer.get();
            tracker.handle_move(
                f64::from(event.client_x()),
                f64::from(event.client_y()),
                displayed_size(&target),
            );
            pointer.set(tracker);
        });
        canvas
            .add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("failed to register mousemove listener: {err:?}"))?;
        on_move.forget();
    }

    let mut frame_loop = FrameLoop::new(gpu.size());
    let mut sink = CanvasSink {
        canvas: canvas.clone(),
        gpu,
    };
    let mut frozen = config.freeze_time.map(FixedTimeSource::from_seconds);

    let callback: FrameCallback = Rc::new(RefCell::new(None));
    let mut scheduler = AnimationFrameScheduler {
        window: window.clone(),
        callback: Rc::clone(&callback),
    };
    *callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
        let input = FrameInput {
            timestamp_ms: frozen.as_mut().map_or(timestamp, |clock| clock.now_ms()),
            display: displayed_size(&canvas),
            pointer: pointer.get().position(),
        };
        if let FrameOutcome::Stopped(err) = frame_loop.tick(input, &mut sink, &mut scheduler) {
            tracing::error!(error = %err, "frame loop stopped");
        }
    }));

    AnimationFrameScheduler {
        window,
        callback,
    }
    .request_frame();
    Ok(())
}
