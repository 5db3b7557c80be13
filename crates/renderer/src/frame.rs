//! Pure per-frame logic.
//!
//! [`step`] turns the previous [`FrameState`] and the inputs sampled by the
//! host into the next state plus a [`FramePlan`] describing the GPU work. It
//! never touches a device, so the resize decision, the uniform payload, and
//! the draw parameters can be tested without a GPU.

use crate::gpu::uniforms::FrameUniforms;
use crate::input::PointerPosition;
use crate::runtime::timestamp_to_seconds;
use crate::types::SurfaceSize;

/// Vertices in the full-surface quad (two triangles, no index buffer).
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Opaque black, RGBA.
pub const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// What the loop carries from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Current size of the backing surface.
    pub surface: SurfaceSize,
    /// Pointer position as of the previous frame.
    pub pointer: PointerPosition,
}

impl FrameState {
    pub fn new(surface: SurfaceSize) -> Self {
        Self {
            surface,
            pointer: PointerPosition::default(),
        }
    }
}

/// Inputs sampled by the host right before a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Frame-callback timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Layout size of the displayed element.
    pub display: SurfaceSize,
    /// Latest pointer position.
    pub pointer: PointerPosition,
}

/// Parameters of the single render pass recorded each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub clear_color: [f64; 4],
    pub vertex_count: u32,
    pub instance_count: u32,
}

impl Default for DrawCall {
    fn default() -> Self {
        Self {
            clear_color: CLEAR_COLOR,
            vertex_count: QUAD_VERTEX_COUNT,
            instance_count: 1,
        }
    }
}

/// GPU work the host must perform for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePlan {
    /// Resize the backing surface if asked, upload `uniforms`, then draw.
    Render {
        resize: Option<SurfaceSize>,
        uniforms: FrameUniforms,
        draw: DrawCall,
    },
    /// The displayed element has no area; nothing can be presented.
    Skip,
}

impl FramePlan {
    pub fn resize(&self) -> Option<SurfaceSize> {
        match self {
            FramePlan::Render { resize, .. } => *resize,
            FramePlan::Skip => None,
        }
    }
}

/// Computes the next state and the work for one frame.
pub fn step(previous: &FrameState, input: FrameInput) -> (FrameState, FramePlan) {
    let mut next = FrameState {
        surface: previous.surface,
        pointer: input.pointer,
    };

    if input.display.is_empty() {
        return (next, FramePlan::Skip);
    }

    let resize = (previous.surface != input.display).then_some(input.display);
    if let Some(size) = resize {
        next.surface = size;
    }

    let uniforms = FrameUniforms::new(
        next.surface,
        timestamp_to_seconds(input.timestamp_ms),
        next.pointer,
    );

    (
        next,
        FramePlan::Render {
            resize,
            uniforms,
            draw: DrawCall::default(),
        },
    )
}
