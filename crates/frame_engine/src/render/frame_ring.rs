//! Frame resource ring
//!
//! The CPU may run up to N-1 frames ahead of the GPU. [`FrameRing::advance`]
//! moves to the next frame resource and, if the GPU has not yet finished the
//! work last submitted from it, blocks on the fence. This is the only place
//! the frame cycle waits.

use std::sync::Arc;

use crate::render::error::{RenderError, RenderResult};
use crate::render::frame_resource::FrameResource;
use crate::render::sync::GpuFence;

/// Round-robin ring of frame resources guarded by one fence
pub struct FrameRing {
    slots: Vec<FrameResource>,
    fence: Arc<dyn GpuFence>,
    current: usize,
    frames_advanced: u64,
    last_retired: u64,
    stall_count: u64,
}

impl std::fmt::Debug for FrameRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRing")
            .field("slots", &self.slots.len())
            .field("current", &self.current)
            .field("frames_advanced", &self.frames_advanced)
            .field("last_retired", &self.last_retired)
            .field("stall_count", &self.stall_count)
            .finish()
    }
}

impl FrameRing {
    /// Take ownership of `slots`. Slot 0 is current until the first advance.
    pub fn new(slots: Vec<FrameResource>, fence: Arc<dyn GpuFence>) -> RenderResult<Self> {
        if slots.is_empty() {
            return Err(RenderError::InvalidConfig(
                "frame ring needs at least one frame resource".to_string(),
            ));
        }

        Ok(Self {
            slots,
            fence,
            current: 0,
            frames_advanced: 0,
            last_retired: 0,
            stall_count: 0,
        })
    }

    /// Move to the next frame resource, waiting for the GPU if it still owns
    /// it. Returns whether the call had to wait.
    ///
    /// The k-th call (counting from zero) selects slot `k mod N`.
    pub fn advance(&mut self) -> RenderResult<bool> {
        let index = (self.frames_advanced % self.slots.len() as u64) as usize;
        self.current = index;
        self.frames_advanced += 1;

        let pending = self.slots[index].fence;
        if pending == 0 {
            return Ok(false);
        }

        let completed = self.fence.completed_value();
        if completed >= pending {
            return Ok(false);
        }

        log::trace!(
            "Frame resource {} busy: waiting for fence {} (completed {})",
            index,
            pending,
            completed
        );
        self.stall_count += 1;
        self.fence.wait_until(pending)?;
        Ok(true)
    }

    /// Record that the current frame resource's work ends at `fence_value`
    pub fn retire(&mut self, fence_value: u64) -> RenderResult<()> {
        if fence_value <= self.last_retired {
            return Err(RenderError::FenceRegression {
                value: fence_value,
                previous: self.last_retired,
            });
        }

        let slot = &mut self.slots[self.current];
        slot.fence = fence_value;
        slot.allocator.mark_submitted(fence_value);
        self.last_retired = fence_value;
        Ok(())
    }

    /// Block until every retired frame has completed on the GPU
    pub fn drain(&mut self) -> RenderResult<()> {
        if self.last_retired == 0 || self.fence.completed_value() >= self.last_retired {
            return Ok(());
        }

        log::debug!("Draining frame ring up to fence {}", self.last_retired);
        self.fence.wait_until(self.last_retired)
    }

    /// Current frame resource
    pub fn current(&self) -> &FrameResource {
        &self.slots[self.current]
    }

    /// Current frame resource, mutably
    pub fn current_mut(&mut self) -> &mut FrameResource {
        &mut self.slots[self.current]
    }

    /// Index of the current frame resource
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Frame resource at `index`
    pub fn slot(&self, index: usize) -> Option<&FrameResource> {
        self.slots.get(index)
    }

    /// Number of frame resources
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of [`FrameRing::advance`] calls so far
    pub fn frames_advanced(&self) -> u64 {
        self.frames_advanced
    }

    /// Highest fence value retired so far
    pub fn last_retired(&self) -> u64 {
        self.last_retired
    }

    /// Number of advances that had to wait for the GPU
    pub fn stall_count(&self) -> u64 {
        self.stall_count
    }

    /// Fence the ring waits on
    pub fn fence(&self) -> &Arc<dyn GpuFence> {
        &self.fence
    }
}
