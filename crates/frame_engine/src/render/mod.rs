//! # Rendering System
//!
//! The per-frame update and draw-submission cycle of a Direct3D12-style
//! renderer, expressed against the [`GraphicsDevice`] and [`GpuFence`]
//! traits.
//!
//! ## Architecture
//!
//! - **Frame ring**: N rotating [`FrameResource`]s, each with its own command
//!   allocator and constant buffers, guarded by one fence
//! - **Dirty propagation**: object and material constants carry a counter so
//!   a change is written to every frame resource exactly once
//! - **Layered batching**: items are drawn layer by layer
//!   (Opaque, AlphaTested, Billboard, Transparent), each under its own
//!   pipeline state
//! - **Scene context**: slot-map registries for geometry, textures,
//!   materials, pipelines and render items
//! - **Simulated device**: a worker thread that plays the GPU

pub mod backend;
pub mod commands;
pub mod constants;
pub mod dirty;
pub mod draw;
pub mod error;
pub mod frame_resource;
pub mod frame_ring;
pub mod geometry;
pub mod layer;
pub mod material;
pub mod render_item;
pub mod renderer;
pub mod scene;
pub mod simulated;
pub mod sync;
pub mod update;
pub mod upload_buffer;

#[cfg(test)]
mod tests;

pub use backend::{BackBufferId, DescriptorHandle, DescriptorHeap, GpuAddress, GraphicsDevice};
pub use commands::{ClearFlags, Command, CommandAllocator, CommandList, ResourceState};
pub use constants::{Light, MaterialConstants, ObjectConstants, PassConstants, MAX_LIGHTS};
pub use draw::DrawStats;
pub use error::{RenderError, RenderResult};
pub use frame_resource::{FrameResource, FrameResourceDesc};
pub use frame_ring::FrameRing;
pub use geometry::{
    IndexBufferView, IndexFormat, MeshGeometry, PrimitiveTopology, SpriteVertex, SubmeshGeometry, Vertex,
    VertexBufferView, VertexSource,
};
pub use layer::RenderLayer;
pub use material::{Material, MaterialDesc, Texture};
pub use render_item::{RenderItem, RenderItemDesc};
pub use renderer::{FrameRenderer, FrameStats};
pub use scene::{
    BlendMode, GeometryId, MaterialId, PipelineId, PipelineState, RenderItemId, SceneContext, TextureId,
};
pub use simulated::SimulatedDevice;
pub use sync::{GpuFence, SimulatedFence};
pub use upload_buffer::UploadBuffer;
