use std::path::PathBuf;

use clap::Parser;
use renderer::{GpuPowerPreference, RendererConfig, SurfaceSize, DEFAULT_SHADER_PATH};

#[derive(Parser, Debug)]
#[command(
    name = "quatmarch",
    author,
    version,
    about = "Render a WGSL quaternionic raymarcher in a desktop window"
)]
pub struct Cli {
    /// WGSL shader to render; takes precedence over `--shader`.
    #[arg(value_name = "SHADER")]
    pub shader_path: Option<PathBuf>,

    /// WGSL shader to render.
    #[arg(
        long,
        value_name = "PATH",
        env = "QUATMARCH_SHADER",
        default_value = DEFAULT_SHADER_PATH
    )]
    pub shader: PathBuf,

    /// Initial window size (e.g. `1280x720`).
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_size,
        default_value = "1280x720"
    )]
    pub size: SurfaceSize,

    /// Adapter power preference: `low` or `high`.
    #[arg(
        long,
        value_name = "POWER",
        value_parser = parse_gpu_power,
        default_value_t = GpuPowerPreference::default()
    )]
    pub gpu_power: GpuPowerPreference,

    /// Pin the shader clock to this many seconds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_freeze_time)]
    pub freeze_time: Option<f32>,

    /// Compile the shader without checking it against the uniform layout.
    #[arg(long)]
    pub skip_interface_check: bool,

    /// Check the shader against the uniform layout, print a report and exit.
    #[arg(long)]
    pub check: bool,

    /// Window title.
    #[arg(long, value_name = "TEXT", default_value = "Quaternionic Raymarcher")]
    pub title: String,
}

impl Cli {
    pub fn shader(&self) -> &PathBuf {
        self.shader_path.as_ref().unwrap_or(&self.shader)
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            shader_source: self.shader().clone(),
            window_size: self.size,
            title: self.title.clone(),
            power_preference: self.gpu_power,
            freeze_time: self.freeze_time,
            check_interface: !self.skip_interface_check,
            ..RendererConfig::default()
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<SurfaceSize, String> {
    value.parse()
}

pub fn parse_gpu_power(value: &str) -> Result<GpuPowerPreference, String> {
    if value.trim().is_empty() {
        return Err("GPU power preference must not be empty".to_string());
    }
    value.parse()
}

pub fn parse_freeze_time(value: &str) -> Result<f32, String> {
    let seconds: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid time '{}'; expected seconds", value.trim()))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("time must be a non-negative number of seconds, got {seconds}"));
    }
    Ok(seconds)
}
