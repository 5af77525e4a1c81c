//! # Frame Engine
//!
//! The frame loop of a Direct3D12-style renderer: a ring of frame resources
//! kept in step with the GPU by a fence, constant buffers that are only
//! rewritten while an object or material is dirty, and draw submission
//! batched by render layer.
//!
//! ## Features
//!
//! - **Frame ring**: the CPU records frame k+1 while the GPU executes frame k,
//!   blocking only when it laps the GPU
//! - **Dirty propagation**: a change reaches every frame resource exactly once
//! - **Layered draws**: Opaque, AlphaTested, Billboard and Transparent items
//!   each drawn under their own pipeline state
//! - **Simulated GPU**: a threaded device for running the loop headless
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frame_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RendererConfig::default();
//!     let mut device = SimulatedDevice::new(&config, &SimulationConfig::default())?;
//!     let heap = device.allocate_descriptor_heap(1)?;
//!     let mut scene = SceneContext::new(config.frame_resource_count, heap);
//!     // ... register geometry, materials, pipelines and render items ...
//!
//!     let mut renderer = FrameRenderer::new(device, &scene, config, 0)?;
//!     renderer.render_frame(&mut scene, &PassConstants::default(), &[])?;
//!     renderer.flush()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{ApplicationConfig, Config, ConfigError, EngineConfig, RendererConfig, SimulationConfig},
        foundation::{
            bounds::Aabb,
            math::{Mat4, Mat4Ext, Vec2, Vec3, Vec4},
            time::{Stopwatch, Timer},
        },
        render::{
            FrameRenderer, FrameStats, GraphicsDevice, Light, MaterialDesc, MeshGeometry, PassConstants,
            PipelineState, RenderError, RenderItemDesc, RenderLayer, RenderResult, SceneContext, SimulatedDevice,
        },
        scene::{Camera, CameraMove, MeshData, Spin, Waves},
    };
}
