use anyhow::{anyhow, Result};

use crate::bootstrap::InitError;
use crate::types::{GpuPowerPreference, SurfaceSize};

/// Adapter, device and queue acquired for a surface, not yet configured.
pub(crate) struct AcquiredGpu {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl AcquiredGpu {
    /// Requests an adapter able to present to `surface` and a device on it.
    pub(crate) async fn request(
        instance: wgpu::Instance,
        surface: wgpu::Surface<'static>,
        power: GpuPowerPreference,
    ) -> Result<Self, InitError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power.to_wgpu(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        tracing::info!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            "selected GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("quatmarch device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::default(),
            })
            .await?;

        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            tracing::error!(error = %err, "uncaptured GPU error");
        }));

        Ok(Self {
            _instance: instance,
            surface,
            adapter,
            device,
            queue,
        })
    }
}

/// Configured presentation surface plus the device that owns it.
pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: SurfaceSize,
}

impl GpuContext {
    /// Configures the surface: first reported format, premultiplied alpha
    /// when available, FIFO presentation.
    pub(crate) fn configure(gpu: AcquiredGpu, initial_size: SurfaceSize) -> Result<Self> {
        let AcquiredGpu {
            _instance,
            surface,
            adapter,
            device,
            queue,
        } = gpu;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| anyhow!("surface is not compatible with the selected adapter"))?;
        let alpha_mode = select_alpha_mode(&caps.alpha_modes);

        let size = SurfaceSize::new(initial_size.width.max(1), initial_size.height.max(1));
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::debug!(?format, ?alpha_mode, %size, "configured surface");

        Ok(Self {
            _instance,
            surface,
            device,
            queue,
            config,
            size,
        })
    }

    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub(crate) fn resize(&mut self, new_size: SurfaceSize) {
        if new_size.is_empty() {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn select_alpha_mode(supported: &[wgpu::CompositeAlphaMode]) -> wgpu::CompositeAlphaMode {
    if supported.contains(&wgpu::CompositeAlphaMode::PreMultiplied) {
        wgpu::CompositeAlphaMode::PreMultiplied
    } else {
        supported
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto)
    }
}
