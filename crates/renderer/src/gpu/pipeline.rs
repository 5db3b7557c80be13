use anyhow::{anyhow, Result};

use crate::shader::ShaderProgram;
use crate::types::{FRAGMENT_ENTRY_POINT, VERTEX_ENTRY_POINT};

/// Render pipeline for the full-surface quad and the layout of its uniform group.
pub(crate) struct ShaderPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_layout: wgpu::BindGroupLayout,
}

impl ShaderPipeline {
    /// Compiles `program` and builds the pipeline, reporting validation
    /// failures as errors instead of leaving them to the device handler.
    pub async fn new(
        device: &wgpu::Device,
        program: &ShaderProgram,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let module = program.compile(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shader pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shader pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(VERTEX_ENTRY_POINT),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(FRAGMENT_ENTRY_POINT),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            return Err(anyhow!(
                "failed to build pipeline for {}: {err}",
                program.label()
            ));
        }

        tracing::debug!(shader = %program.label(), ?surface_format, "built shader pipeline");

        Ok(Self {
            pipeline,
            uniform_layout,
        })
    }
}
