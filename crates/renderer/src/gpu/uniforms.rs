use bytemuck::{Pod, Zeroable};

use crate::input::PointerPosition;
use crate::types::SurfaceSize;

/// Size in bytes of the uniform block shared with the shader.
pub const FRAME_UNIFORMS_SIZE: usize = 24;

/// Per-frame parameters written to `@group(0) @binding(0)`.
///
/// The layout is a fixed contract with the WGSL program: six little-endian
/// `f32` values in the order `[width, height, time, padding, pointer_x,
/// pointer_y]`. [`UNIFORM_SLOTS`] names each slot with its byte offset.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub _padding: f32,
    pub pointer: [f32; 2],
}

const _: () = assert!(std::mem::size_of::<FrameUniforms>() == FRAME_UNIFORMS_SIZE);

/// One named `f32` slot of the uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: &'static str,
    pub offset: u32,
}

/// Byte offsets of every slot in [`FrameUniforms`].
pub const UNIFORM_SLOTS: [UniformSlot; 6] = [
    UniformSlot { name: "surface_width", offset: 0 },
    UniformSlot { name: "surface_height", offset: 4 },
    UniformSlot { name: "elapsed_seconds", offset: 8 },
    UniformSlot { name: "padding", offset: 12 },
    UniformSlot { name: "pointer_x", offset: 16 },
    UniformSlot { name: "pointer_y", offset: 20 },
];

/// Offset of the slot that is always written as zero.
pub const PADDING_OFFSET: u32 = 12;

impl FrameUniforms {
    pub fn new(surface: SurfaceSize, seconds: f32, pointer: PointerPosition) -> Self {
        Self {
            resolution: [surface.width as f32, surface.height as f32],
            time: seconds,
            _padding: 0.0,
            pointer: [pointer.x, pointer.y],
        }
    }

    /// The payload as six floats in wire order.
    pub fn fields(&self) -> [f32; 6] {
        [
            self.resolution[0],
            self.resolution[1],
            self.time,
            self._padding,
            self.pointer[0],
            self.pointer[1],
        ]
    }

    /// Serialises the payload as little-endian bytes regardless of host order.
    pub fn to_le_bytes(&self) -> [u8; FRAME_UNIFORMS_SIZE] {
        let mut bytes = [0u8; FRAME_UNIFORMS_SIZE];
        for (chunk, value) in bytes.chunks_exact_mut(4).zip(self.fields()) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Zero-copy view of the payload; matches [`Self::to_le_bytes`] on little-endian hosts.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Owns the device-side uniform buffer and the bind group exposing it.
pub(crate) struct UniformBlock {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformBlock {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame uniform buffer"),
            size: FRAME_UNIFORMS_SIZE as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame uniform bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn write(&self, queue: &wgpu::Queue, uniforms: &FrameUniforms) {
        queue.write_buffer(&self.buffer, 0, &uniforms.to_le_bytes());
    }
}
