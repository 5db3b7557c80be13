use std::borrow::Cow;

use anyhow::{Context, Result};

use crate::interface::{self, InterfaceError, ShaderInterface};

/// WGSL source text plus a label used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    label: String,
    source: String,
}

impl ShaderProgram {
    pub fn new(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
        }
    }

    /// Reads the program from disk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shader at {}", path.display()))?;
        Ok(Self::new(path.display().to_string(), source))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn interface(&self) -> Result<ShaderInterface, InterfaceError> {
        interface::check_source(&self.source)
    }

    /// Runs the interface check unless disabled, logging the result.
    pub fn verify(&self, enabled: bool) -> Result<()> {
        if !enabled {
            tracing::debug!(shader = %self.label, "shader interface check disabled");
            return Ok(());
        }
        let report = self
            .interface()
            .with_context(|| format!("shader {} does not match the uniform layout", self.label))?;
        tracing::debug!(
            shader = %self.label,
            uniform_size = report.uniform_size,
            slots = report.slots.len(),
            "shader interface verified"
        );
        Ok(())
    }

    pub(crate) fn compile(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(self.source.as_str())),
        })
    }
}
