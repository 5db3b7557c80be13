use std::path::Path;

use anyhow::{Context, Result};
use renderer::bootstrap::InitError;
use renderer::{Renderer, ShaderProgram};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn run(cli: Cli) -> Result<()> {
    if cli.check {
        return check_shader(cli.shader());
    }

    let config = cli.renderer_config();
    tracing::info!(
        shader = %config.shader_source.display(),
        size = %config.window_size,
        gpu_power = %config.power_preference,
        freeze_time = ?config.freeze_time,
        "starting quatmarch"
    );
    Renderer::new(config).run()
}

/// Start-up failures have already been shown to the user by the notifier.
pub fn already_reported(err: &anyhow::Error) -> bool {
    err.downcast_ref::<InitError>().is_some()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn check_shader(path: &Path) -> Result<()> {
    let program = ShaderProgram::load(path)?;
    let report = program
        .interface()
        .with_context(|| format!("{} does not match the uniform layout", path.display()))?;
    print!("{report}");
    if report.reads_padding() {
        println!("  note: the padding slot at offset 12 is always zero");
    }
    println!("{}: ok", path.display());
    Ok(())
}
