//! Frame renderer
//!
//! [`FrameRenderer`] drives one frame through its three phases:
//!
//! 1. [`begin_frame`](FrameRenderer::begin_frame) advances the frame ring,
//!    waiting if the GPU still owns the next frame resource.
//! 2. [`update`](FrameRenderer::update) uploads dirty object and material
//!    constants, the pass constants and the dynamic vertices.
//! 3. [`draw`](FrameRenderer::draw) records the command list, submits it,
//!    presents and signals the fence.
//!
//! [`render_frame`](FrameRenderer::render_frame) runs all three.

use crate::core::config::RendererConfig;
use crate::render::backend::GraphicsDevice;
use crate::render::commands::{ClearFlags, Command, CommandList, ResourceState};
use crate::render::constants::PassConstants;
use crate::render::draw::draw_layers;
use crate::render::error::{RenderError, RenderResult};
use crate::render::frame_resource::{FrameResource, FrameResourceDesc};
use crate::render::frame_ring::FrameRing;
use crate::render::geometry::Vertex;
use crate::render::layer::RenderLayer;
use crate::render::scene::SceneContext;
use crate::render::update;

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames completed before this one
    pub frame_index: u64,
    /// Frame resource used
    pub slot_index: usize,
    /// Object constants written
    pub object_writes: usize,
    /// Material constants written
    pub material_writes: usize,
    /// Indexed draws recorded
    pub draw_calls: usize,
    /// Pipeline switches recorded
    pub pipeline_changes: usize,
    /// Whether the frame waited for the GPU
    pub stalled: bool,
    /// Times this frame resource's command allocator has been reset
    pub allocator_resets: u64,
}

/// Frame cycle over a [`GraphicsDevice`]
pub struct FrameRenderer<D: GraphicsDevice> {
    device: D,
    config: RendererConfig,
    ring: FrameRing,
    command_list: CommandList,
    fence_value: u64,
    frame_index: u64,
    stats: FrameStats,
}

impl<D: GraphicsDevice> FrameRenderer<D> {
    /// Create the frame resources for `scene`.
    ///
    /// Object and material buffers are sized to the scene as it is now;
    /// render items added later have no constant buffer slot.
    pub fn new(
        mut device: D,
        scene: &SceneContext,
        config: RendererConfig,
        dynamic_vertex_count: usize,
    ) -> RenderResult<Self> {
        config.validate()?;
        if scene.frame_resource_count() != config.frame_resource_count {
            return Err(RenderError::InvalidConfig(format!(
                "scene tracks {} frame resources, renderer is configured for {}",
                scene.frame_resource_count(),
                config.frame_resource_count
            )));
        }

        let desc = FrameResourceDesc {
            pass_count: config.pass_count,
            object_count: scene.item_count(),
            material_count: scene.material_count(),
            dynamic_vertex_count,
            constant_alignment: config.constant_buffer_alignment,
        };
        let slots = (0..config.frame_resource_count)
            .map(|_| FrameResource::new(&mut device, &desc))
            .collect::<RenderResult<Vec<_>>>()?;
        let ring = FrameRing::new(slots, device.fence())?;

        log::info!(
            "Frame renderer ready: {} frame resources, {} render items, {} materials",
            config.frame_resource_count,
            desc.object_count,
            desc.material_count
        );

        Ok(Self {
            device,
            config,
            ring,
            command_list: CommandList::new(),
            fence_value: 0,
            frame_index: 0,
            stats: FrameStats::default(),
        })
    }

    /// Advance to the next frame resource, waiting for the GPU if needed
    pub fn begin_frame(&mut self) -> RenderResult<()> {
        let stalled = self.ring.advance()?;
        self.stats = FrameStats {
            frame_index: self.frame_index,
            slot_index: self.ring.current_index(),
            stalled,
            ..FrameStats::default()
        };
        Ok(())
    }

    /// Upload this frame's constants and dynamic vertices
    pub fn update(
        &mut self,
        scene: &mut SceneContext,
        pass: &PassConstants,
        dynamic_vertices: &[Vertex],
    ) -> RenderResult<()> {
        let frame = self.ring.current_mut();
        self.stats.object_writes = update::update_object_constants(scene, frame)?;
        self.stats.material_writes = update::update_material_constants(scene, frame)?;
        update::update_pass_constants(frame, pass)?;
        update::update_dynamic_vertices(frame, dynamic_vertices)?;

        log::trace!(
            "Frame {} slot {}: {} object writes, {} material writes",
            self.stats.frame_index,
            self.stats.slot_index,
            self.stats.object_writes,
            self.stats.material_writes
        );
        Ok(())
    }

    /// Record, submit and present the frame, then signal the fence
    pub fn draw(&mut self, scene: &SceneContext) -> RenderResult<FrameStats> {
        let completed = self.ring.fence().completed_value();
        let frame = self.ring.current_mut();
        frame.allocator.reset(completed)?;
        self.stats.allocator_resets = frame.allocator.reset_count();

        let opaque = scene.layer_pipeline(RenderLayer::Opaque).ok();
        let list = &mut self.command_list;
        list.reset(&frame.allocator, opaque);

        let back_buffer = self.device.current_back_buffer();
        let (width, height) = self.config.viewport;
        list.record(Command::SetViewport { width, height });
        list.record(Command::ResourceBarrier {
            back_buffer,
            before: ResourceState::Present,
            after: ResourceState::RenderTarget,
        });
        list.record(Command::ClearRenderTarget {
            back_buffer,
            color: self.config.clear_color,
        });
        list.record(Command::ClearDepthStencil {
            flags: ClearFlags::DEPTH | ClearFlags::STENCIL,
            depth: 1.0,
            stencil: 0,
        });
        list.record(Command::SetRenderTarget(back_buffer));
        list.record(Command::SetPassConstants(frame.pass_constants.gpu_address(0)?));

        let draw = draw_layers(list, scene, frame, opaque)?;

        list.record(Command::ResourceBarrier {
            back_buffer,
            before: ResourceState::RenderTarget,
            after: ResourceState::Present,
        });
        let commands = list.close();
        self.device.execute_command_list(commands)?;
        self.device.present()?;

        self.fence_value += 1;
        self.device.signal(self.fence_value)?;
        self.ring.retire(self.fence_value)?;

        self.frame_index += 1;
        self.stats.draw_calls = draw.draw_calls;
        self.stats.pipeline_changes = draw.pipeline_changes;
        Ok(self.stats)
    }

    /// Run one full frame
    pub fn render_frame(
        &mut self,
        scene: &mut SceneContext,
        pass: &PassConstants,
        dynamic_vertices: &[Vertex],
    ) -> RenderResult<FrameStats> {
        self.begin_frame()?;
        self.update(scene, pass, dynamic_vertices)?;
        self.draw(scene)
    }

    /// Whether a command list was left open by a frame that failed mid-recording
    pub fn is_recording(&self) -> bool {
        !self.command_list.is_closed()
    }

    /// Wait until the GPU has finished every submitted frame
    pub fn flush(&mut self) -> RenderResult<()> {
        self.ring.drain()
    }

    /// The device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The device, mutably
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// The frame ring
    pub fn ring(&self) -> &FrameRing {
        &self.ring
    }

    /// Renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Last fence value signalled
    pub fn fence_value(&self) -> u64 {
        self.fence_value
    }

    /// Statistics of the frame in progress or last drawn
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Commands recorded for the last frame
    pub fn recorded_commands(&self) -> &[Command] {
        self.command_list.commands()
    }
}

impl<D: GraphicsDevice> Drop for FrameRenderer<D> {
    fn drop(&mut self) {
        if let Err(e) = self.ring.drain() {
            log::error!("Failed to drain frame ring on shutdown: {}", e);
        }
    }
}
