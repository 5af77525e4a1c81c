//! Per-frame resources
//!
//! Everything the CPU writes while recording a frame lives in a
//! [`FrameResource`]: the command allocator and the upload buffers for pass,
//! object and material constants (plus dynamic vertices). While the GPU reads
//! one frame resource the CPU fills the next, so no buffer is ever written
//! while in flight.

use crate::render::backend::GraphicsDevice;
use crate::render::commands::CommandAllocator;
use crate::render::constants::{MaterialConstants, ObjectConstants, PassConstants};
use crate::render::error::RenderResult;
use crate::render::geometry::Vertex;
use crate::render::upload_buffer::UploadBuffer;

/// Sizes of the buffers in one frame resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameResourceDesc {
    /// Pass constant elements
    pub pass_count: usize,
    /// Object constant elements (one per render item)
    pub object_count: usize,
    /// Material constant elements (one per material)
    pub material_count: usize,
    /// Dynamic vertices; zero means no dynamic vertex buffer
    pub dynamic_vertex_count: usize,
    /// Constant buffer element alignment
    pub constant_alignment: u64,
}

/// Command allocator, constant buffers and fence value of one in-flight frame
#[derive(Debug)]
pub struct FrameResource {
    /// Recording memory for this frame's command list
    pub allocator: CommandAllocator,
    /// Per-pass constants
    pub pass_constants: UploadBuffer<PassConstants>,
    /// Per-object constants, indexed by render item
    pub object_constants: UploadBuffer<ObjectConstants>,
    /// Per-material constants, indexed by material
    pub material_constants: UploadBuffer<MaterialConstants>,
    /// Vertices rewritten every frame
    pub dynamic_vertices: Option<UploadBuffer<Vertex>>,
    /// Fence value marking the end of this frame's GPU work. Zero means the
    /// resource has never been submitted.
    pub fence: u64,
}

impl FrameResource {
    /// Allocate every buffer of one frame resource
    pub fn new(device: &mut dyn GraphicsDevice, desc: &FrameResourceDesc) -> RenderResult<Self> {
        let alignment = desc.constant_alignment;
        let dynamic_vertices = if desc.dynamic_vertex_count > 0 {
            Some(UploadBuffer::packed(device, "dynamic vertex", desc.dynamic_vertex_count)?)
        } else {
            None
        };

        Ok(Self {
            allocator: CommandAllocator::new(),
            pass_constants: UploadBuffer::constant(device, "pass constant", desc.pass_count, alignment)?,
            object_constants: UploadBuffer::constant(device, "object constant", desc.object_count, alignment)?,
            material_constants: UploadBuffer::constant(
                device,
                "material constant",
                desc.material_count,
                alignment,
            )?,
            dynamic_vertices,
            fence: 0,
        })
    }
}
