use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Relative path the harness loads its WGSL program from.
pub const DEFAULT_SHADER_PATH: &str = "shader/shader.wgsl";

/// Element id of the canvas the browser host renders into.
pub const DEFAULT_CANVAS_ID: &str = "gpuCanvas";

/// Vertex stage entry point the shader must export.
pub const VERTEX_ENTRY_POINT: &str = "vs_main";

/// Fragment stage entry point the shader must export.
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

/// Pixel dimensions of a displayed element or a backing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero; such a surface cannot be drawn to.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for SurfaceSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (width, height) = trimmed
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| format!("invalid size '{trimmed}'; expected WIDTHxHEIGHT"))?;
        let width: u32 = width
            .trim()
            .parse()
            .map_err(|_| format!("invalid width in '{trimmed}'"))?;
        let height: u32 = height
            .trim()
            .parse()
            .map_err(|_| format!("invalid height in '{trimmed}'"))?;
        if width == 0 || height == 0 {
            return Err(format!("size '{trimmed}' must be non-zero in both dimensions"));
        }
        Ok(Self::new(width, height))
    }
}

/// Which class of adapter the harness should ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

impl GpuPowerPreference {
    pub(crate) fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

impl fmt::Display for GpuPowerPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuPowerPreference::Low => f.write_str("low"),
            GpuPowerPreference::High => f.write_str("high"),
        }
    }
}

impl FromStr for GpuPowerPreference {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "low-power" | "integrated" => Ok(Self::Low),
            "high" | "high-performance" | "discrete" => Ok(Self::High),
            other => Err(format!("unknown GPU power preference '{other}' (expected low or high)")),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// The desktop binary fills this from CLI flags; the browser entry point
/// builds it from the canvas id and shader URL it was started with.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Location of the WGSL program (file path on desktop, URL in the browser).
    pub shader_source: PathBuf,
    /// Initial window size in logical pixels (desktop only).
    pub window_size: SurfaceSize,
    /// Window title (desktop only).
    pub title: String,
    /// Canvas element id (browser only).
    pub canvas_id: String,
    /// Adapter power preference.
    pub power_preference: GpuPowerPreference,
    /// Pin the uniform time to this many seconds instead of the frame clock.
    pub freeze_time: Option<f32>,
    /// Check the shader against the uniform contract before compiling it.
    pub check_interface: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            shader_source: PathBuf::from(DEFAULT_SHADER_PATH),
            window_size: SurfaceSize::new(1280, 720),
            title: "Quaternionic Raymarcher".to_string(),
            canvas_id: DEFAULT_CANVAS_ID.to_string(),
            power_preference: GpuPowerPreference::default(),
            freeze_time: None,
            check_interface: true,
        }
    }
}

impl RendererConfig {
    /// Browser configuration: shader fetched from `shader_url`, drawn into `canvas_id`.
    pub fn for_canvas(canvas_id: &str, shader_url: &str, freeze_time: Option<f32>) -> Self {
        Self {
            shader_source: PathBuf::from(shader_url),
            canvas_id: canvas_id.to_string(),
            freeze_time: freeze_time.filter(|seconds| seconds.is_finite() && *seconds >= 0.0),
            ..Self::default()
        }
    }
}
