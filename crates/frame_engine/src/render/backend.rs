//! Backend abstraction traits for the rendering system
//!
//! [`GraphicsDevice`] is everything the frame renderer asks of the device,
//! swap chain and command queue. A Direct3D12 backend would wrap
//! `ID3D12Device`, `IDXGISwapChain` and `ID3D12CommandQueue`; the crate ships
//! a [`SimulatedDevice`](crate::render::simulated::SimulatedDevice) that runs
//! the GPU side on a worker thread.

use std::sync::Arc;

use crate::render::commands::Command;
use crate::render::error::RenderResult;
use crate::render::sync::GpuFence;

/// GPU virtual address of a buffer element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GpuAddress(pub u64);

impl GpuAddress {
    /// Address `bytes` past this one
    pub fn offset(self, bytes: u64) -> Self {
        Self(self.0 + bytes)
    }
}

/// GPU handle of a shader-visible descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DescriptorHandle(pub u64);

/// Shader-visible descriptor heap holding texture views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorHeap {
    /// Handle of descriptor 0
    pub gpu_start: DescriptorHandle,
    /// Bytes between consecutive descriptors
    pub increment: u32,
    /// Number of descriptors in the heap
    pub capacity: u32,
}

impl DescriptorHeap {
    /// Handle of the descriptor at `index`
    pub fn handle(&self, index: u32) -> DescriptorHandle {
        DescriptorHandle(self.gpu_start.0 + u64::from(index) * u64::from(self.increment))
    }
}

/// Identifies a swap chain back buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackBufferId(pub u32);

/// Device, swap chain and command queue as seen by the frame renderer
pub trait GraphicsDevice {
    /// Fence the command queue signals
    fn fence(&self) -> Arc<dyn GpuFence>;

    /// Reserve a CPU-writable, GPU-readable heap of `byte_size` bytes
    fn allocate_upload_heap(&mut self, byte_size: u64) -> RenderResult<GpuAddress>;

    /// Create a shader-visible descriptor heap
    fn allocate_descriptor_heap(&mut self, capacity: u32) -> RenderResult<DescriptorHeap>;

    /// Back buffer the next frame renders into
    fn current_back_buffer(&self) -> BackBufferId;

    /// Submit a closed command list for execution
    fn execute_command_list(&mut self, commands: &[Command]) -> RenderResult<()>;

    /// Queue a fence signal behind all previously submitted work
    fn signal(&mut self, value: u64) -> RenderResult<()>;

    /// Present the current back buffer and flip to the next one
    fn present(&mut self) -> RenderResult<()>;
}
