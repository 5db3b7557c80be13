use anyhow::Result;

use crate::frame::DrawCall;
use crate::frame_loop::{FrameError, FrameSink};
use crate::shader::ShaderProgram;
use crate::types::SurfaceSize;

use super::context::{AcquiredGpu, GpuContext};
use super::pipeline::ShaderPipeline;
use super::uniforms::{FrameUniforms, UniformBlock};

/// Every GPU object the frame loop touches, built once during start-up.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: ShaderPipeline,
    uniforms: UniformBlock,
}

impl GpuState {
    pub(crate) async fn new(
        gpu: AcquiredGpu,
        initial_size: SurfaceSize,
        program: &ShaderProgram,
    ) -> Result<Self> {
        let context = GpuContext::configure(gpu, initial_size)?;
        let pipeline = ShaderPipeline::new(&context.device, program, context.format()).await?;
        let uniforms = UniformBlock::new(&context.device, &pipeline.uniform_layout);
        Ok(Self {
            context,
            pipeline,
            uniforms,
        })
    }

    pub(crate) fn size(&self) -> SurfaceSize {
        self.context.size
    }
}

impl FrameSink for GpuState {
    fn resize(&mut self, size: SurfaceSize) {
        self.context.resize(size);
    }

    fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    fn render(&mut self, uniforms: &FrameUniforms, draw: &DrawCall) -> Result<(), FrameError> {
        self.uniforms.write(&self.context.queue, uniforms);

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        {
            let [r, g, b, a] = draw.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, self.uniforms.bind_group(), &[]);
            render_pass.draw(0..draw.vertex_count, 0..draw.instance_count);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
