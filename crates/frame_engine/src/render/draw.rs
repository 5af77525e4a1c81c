//! Layered draw batching
//!
//! Layers are drawn in a fixed order, each under its own pipeline state.
//! Inside a layer items are drawn in insertion order; nothing is sorted, not
//! even the transparent layer.

use crate::render::commands::{Command, CommandList};
use crate::render::error::{RenderError, RenderResult};
use crate::render::frame_resource::FrameResource;
use crate::render::geometry::{VertexBufferView, VertexSource};
use crate::render::layer::RenderLayer;
use crate::render::scene::{PipelineId, RenderItemId, SceneContext};

/// Counters for one recorded frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Indexed draws recorded
    pub draw_calls: usize,
    /// Pipeline state switches recorded
    pub pipeline_changes: usize,
}

/// Record every non-empty layer in draw order.
///
/// `bound` is the pipeline the list was reset with; a layer using the same
/// pipeline does not switch again.
pub fn draw_layers(
    list: &mut CommandList,
    scene: &SceneContext,
    frame: &FrameResource,
    bound: Option<PipelineId>,
) -> RenderResult<DrawStats> {
    let mut stats = DrawStats::default();
    let mut current = bound;

    for layer in RenderLayer::DRAW_ORDER {
        let items = scene.layer_items(layer);
        if items.is_empty() {
            continue;
        }

        let pipeline = scene.layer_pipeline(layer)?;
        if current != Some(pipeline) {
            list.record(Command::SetPipelineState(pipeline));
            current = Some(pipeline);
            stats.pipeline_changes += 1;
        }

        stats.draw_calls += draw_render_items(list, scene, frame, items)?;
    }

    Ok(stats)
}

/// Record the binds and draw of each item. Returns the number of draws.
pub fn draw_render_items(
    list: &mut CommandList,
    scene: &SceneContext,
    frame: &FrameResource,
    items: &[RenderItemId],
) -> RenderResult<usize> {
    let heap = scene.descriptor_heap();

    for &id in items {
        let item = scene.item(id)?;
        let geometry = scene.geometry(item.geometry)?;
        let material = scene.material(item.material)?;
        let texture = scene.texture(material.diffuse_texture())?;

        let vertex_buffer = match geometry.vertex_source {
            VertexSource::Static(view) => view,
            VertexSource::Dynamic => dynamic_vertex_view(frame, &geometry.name)?,
        };

        list.record(Command::SetVertexBuffer(vertex_buffer));
        list.record(Command::SetIndexBuffer(geometry.index_buffer));
        list.record(Command::SetPrimitiveTopology(item.topology));
        list.record(Command::SetTextureTable(heap.handle(texture.descriptor_index)));
        list.record(Command::SetObjectConstants(
            frame.object_constants.gpu_address(item.object_cb_index)?,
        ));
        list.record(Command::SetMaterialConstants(
            frame.material_constants.gpu_address(material.cb_index())?,
        ));
        list.record(Command::DrawIndexed {
            index_count: item.index_count,
            start_index: item.start_index,
            base_vertex: item.base_vertex,
        });
    }

    Ok(items.len())
}

fn dynamic_vertex_view(frame: &FrameResource, geometry: &str) -> RenderResult<VertexBufferView> {
    frame
        .dynamic_vertices
        .as_ref()
        .map(|buffer| buffer.vertex_buffer_view())
        .ok_or_else(|| RenderError::MissingResource {
            kind: "dynamic vertex buffer",
            name: geometry.to_string(),
        })
}
