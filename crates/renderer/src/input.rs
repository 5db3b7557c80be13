use crate::types::SurfaceSize;

/// Pointer position normalised to the displayed surface, Y pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f32,
    pub y: f32,
}

impl PointerPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Maps client coordinates over a displayed surface to `(cx / dw, 1 - cy / dh)`.
    ///
    /// Values are not clamped: a pointer outside the surface yields components
    /// outside `[0, 1]`. Returns `None` for a zero-area surface.
    pub fn from_client(client_x: f64, client_y: f64, display: SurfaceSize) -> Option<Self> {
        if display.is_empty() {
            return None;
        }
        let x = client_x / f64::from(display.width);
        let y = 1.0 - client_y / f64::from(display.height);
        Some(Self::new(x as f32, y as f32))
    }
}

impl Default for PointerPosition {
    /// Centre of the surface, used until the first pointer event arrives.
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Last pointer position reported by the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTracker {
    position: PointerPosition,
}

impl PointerTracker {
    pub fn position(&self) -> PointerPosition {
        self.position
    }

    /// Records a pointer move; moves over a zero-area surface are ignored.
    pub fn handle_move(&mut self, client_x: f64, client_y: f64, surface: SurfaceSize) {
        if let Some(position) = PointerPosition::from_client(client_x, client_y, surface) {
            self.position = position;
        } else {
            tracing::trace!(%surface, "ignoring pointer move over an empty surface");
        }
    }
}
