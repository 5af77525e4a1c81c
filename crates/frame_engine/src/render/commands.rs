//! Command recording
//!
//! Draw submission is recorded as a flat list of [`Command`] values, one per
//! API call a Direct3D12 command list would receive. Keeping commands as
//! plain data makes a frame comparable: two recordings of the same scene into
//! the same frame resource are equal element for element.

use crate::render::backend::{BackBufferId, DescriptorHandle, GpuAddress};
use crate::render::error::{RenderError, RenderResult};
use crate::render::geometry::{IndexBufferView, PrimitiveTopology, VertexBufferView};
use crate::render::scene::PipelineId;

bitflags::bitflags! {
    /// Which planes of the depth/stencil buffer to clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        /// Clear depth
        const DEPTH = 0b01;
        /// Clear stencil
        const STENCIL = 0b10;
    }
}

/// Usage state of a back buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Owned by the presentation engine
    Present,
    /// Bound as a colour target
    RenderTarget,
}

/// One recorded API call
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set viewport and scissor to the full render target
    SetViewport {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Transition a back buffer between usage states
    ResourceBarrier {
        /// Buffer being transitioned
        back_buffer: BackBufferId,
        /// State before the barrier
        before: ResourceState,
        /// State after the barrier
        after: ResourceState,
    },
    /// Clear a back buffer to a colour
    ClearRenderTarget {
        /// Buffer being cleared
        back_buffer: BackBufferId,
        /// RGBA clear colour
        color: [f32; 4],
    },
    /// Clear the depth/stencil buffer
    ClearDepthStencil {
        /// Planes to clear
        flags: ClearFlags,
        /// Depth clear value
        depth: f32,
        /// Stencil clear value
        stencil: u8,
    },
    /// Bind the back buffer and depth buffer as outputs
    SetRenderTarget(BackBufferId),
    /// Switch pipeline state
    SetPipelineState(PipelineId),
    /// Bind the per-pass constant buffer
    SetPassConstants(GpuAddress),
    /// Bind a vertex buffer
    SetVertexBuffer(VertexBufferView),
    /// Bind an index buffer
    SetIndexBuffer(IndexBufferView),
    /// Set primitive topology
    SetPrimitiveTopology(PrimitiveTopology),
    /// Bind the diffuse texture descriptor table
    SetTextureTable(DescriptorHandle),
    /// Bind the per-object constant buffer
    SetObjectConstants(GpuAddress),
    /// Bind the per-material constant buffer
    SetMaterialConstants(GpuAddress),
    /// Indexed, single-instance draw
    DrawIndexed {
        /// Number of indices
        index_count: u32,
        /// First index
        start_index: u32,
        /// Offset added to each index
        base_vertex: i32,
    },
}

/// Backing memory for command recording, one per frame resource.
///
/// An allocator may only be reset once the GPU has finished the last command
/// list recorded from it.
#[derive(Debug, Default)]
pub struct CommandAllocator {
    submitted_fence: u64,
    reset_count: u64,
}

impl CommandAllocator {
    /// Create a fresh allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Reclaim recording memory. `completed` is the GPU's completed fence value.
    pub fn reset(&mut self, completed: u64) -> RenderResult<()> {
        if completed < self.submitted_fence {
            return Err(RenderError::AllocatorInUse {
                fence: self.submitted_fence,
                completed,
            });
        }
        self.reset_count += 1;
        Ok(())
    }

    /// Remember the fence value that marks the end of this allocator's work
    pub fn mark_submitted(&mut self, fence: u64) {
        self.submitted_fence = fence;
    }

    /// Number of resets so far
    pub fn reset_count(&self) -> u64 {
        self.reset_count
    }
}

/// A command list being recorded or ready for submission
#[derive(Debug, Default)]
pub struct CommandList {
    commands: Vec<Command>,
    closed: bool,
}

impl CommandList {
    /// Create an empty, closed command list
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            closed: true,
        }
    }

    /// Start recording against `allocator`, optionally with an initial pipeline.
    ///
    /// The allocator must already have been reset for this frame.
    pub fn reset(&mut self, _allocator: &CommandAllocator, initial_pipeline: Option<PipelineId>) {
        self.commands.clear();
        self.closed = false;
        if let Some(pipeline) = initial_pipeline {
            self.commands.push(Command::SetPipelineState(pipeline));
        }
    }

    /// Append a command
    pub fn record(&mut self, command: Command) {
        debug_assert!(!self.closed, "recording into a closed command list");
        self.commands.push(command);
    }

    /// Finish recording
    pub fn close(&mut self) -> &[Command] {
        self.closed = true;
        &self.commands
    }

    /// Whether the list has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Recorded commands
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of indexed draws recorded
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, Command::DrawIndexed { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_refuses_reset_while_in_flight() {
        let mut allocator = CommandAllocator::new();
        allocator.mark_submitted(4);

        assert!(matches!(
            allocator.reset(3),
            Err(RenderError::AllocatorInUse { fence: 4, completed: 3 })
        ));
        assert!(allocator.reset(4).is_ok());
        assert_eq!(allocator.reset_count(), 1);
    }

    #[test]
    fn test_reset_clears_previous_recording() {
        let allocator = CommandAllocator::new();
        let mut list = CommandList::new();
        assert!(list.is_closed());

        list.reset(&allocator, None);
        list.record(Command::DrawIndexed { index_count: 3, start_index: 0, base_vertex: 0 });
        assert_eq!(list.close().len(), 1);

        list.reset(&allocator, None);
        assert!(list.commands().is_empty());
        assert!(!list.is_closed());
    }

    #[test]
    fn test_draw_count() {
        let allocator = CommandAllocator::new();
        let mut list = CommandList::new();
        list.reset(&allocator, None);
        list.record(Command::SetPrimitiveTopology(PrimitiveTopology::TriangleList));
        list.record(Command::DrawIndexed { index_count: 6, start_index: 0, base_vertex: 0 });
        list.record(Command::DrawIndexed { index_count: 6, start_index: 6, base_vertex: 4 });

        assert_eq!(list.draw_count(), 2);
    }
}
