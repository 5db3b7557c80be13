//! Renderer crate for the quaternionic raymarcher harness.
//!
//! The crate loads a WGSL program, binds a 24-byte uniform block, and redraws
//! a full-surface quad every frame with the elapsed time and pointer position.
//! Two hosts share the same core:
//!
//! ```text
//!   quatmarch CLI ──RendererConfig──▶ Renderer::run ──▶ window (winit)
//!   web page ──start()/start_with()──────────────────▶ web (canvas + rAF)
//!                                                          │
//!        bootstrap: capability check ─▶ device ─▶ GpuState │
//!                                                          ▼
//!        FrameLoop::tick ─▶ frame::step ─▶ FramePlan ─▶ FrameSink (GpuState)
//!                       └─▶ FrameScheduler (request_redraw / rAF)
//! ```
//!
//! [`frame::step`] is pure, so resize decisions and the uniform payload are
//! tested without a device. Shaders can be checked against the uniform layout
//! offline with [`interface::check_source`].

pub mod bootstrap;
pub mod frame;
pub mod frame_loop;
mod gpu;
pub mod input;
pub mod interface;
pub mod runtime;
pub mod shader;
mod types;
#[cfg(target_arch = "wasm32")]
pub mod web;
#[cfg(not(target_arch = "wasm32"))]
mod window;

pub use gpu::uniforms::{FrameUniforms, UniformSlot, FRAME_UNIFORMS_SIZE, UNIFORM_SLOTS};
pub use interface::{InterfaceError, ShaderInterface};
pub use shader::ShaderProgram;
pub use types::{
    GpuPowerPreference, RendererConfig, SurfaceSize, DEFAULT_CANVAS_ID, DEFAULT_SHADER_PATH,
    FRAGMENT_ENTRY_POINT, VERTEX_ENTRY_POINT,
};
#[cfg(not(target_arch = "wasm32"))]
pub use window::StderrNotifier;

/// Desktop entry point that owns the chosen configuration.
#[cfg(not(target_arch = "wasm32"))]
pub struct Renderer {
    config: RendererConfig,
}

#[cfg(not(target_arch = "wasm32"))]
impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the window and renders until it is closed.
    ///
    /// Returns an error when no GPU is usable (after the user was notified),
    /// when the shader cannot be read or fails the interface check, or when
    /// the pipeline cannot be built.
    pub fn run(&mut self) -> anyhow::Result<()> {
        window::run(&self.config)
    }
}
