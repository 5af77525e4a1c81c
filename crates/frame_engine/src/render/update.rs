//! Constant buffer updates
//!
//! Object and material constants are uploaded only while their dirty counter
//! is positive, one frame resource per frame. Pass constants and dynamic
//! vertices change every frame and are always written.

use crate::render::constants::PassConstants;
use crate::render::error::{RenderError, RenderResult};
use crate::render::frame_resource::FrameResource;
use crate::render::geometry::Vertex;
use crate::render::scene::SceneContext;

/// Upload dirty object constants into `frame`. Returns the number of writes.
pub fn update_object_constants(scene: &mut SceneContext, frame: &mut FrameResource) -> RenderResult<usize> {
    let mut writes = 0;
    for item in scene.items_mut() {
        if !item.dirty.is_dirty() {
            continue;
        }

        frame
            .object_constants
            .copy_data(item.object_cb_index, &item.constants())?;
        item.dirty.consume();
        writes += 1;
    }
    Ok(writes)
}

/// Upload dirty material constants into `frame`. Returns the number of writes.
pub fn update_material_constants(scene: &mut SceneContext, frame: &mut FrameResource) -> RenderResult<usize> {
    let mut writes = 0;
    for material in scene.materials_mut() {
        if !material.dirty.is_dirty() {
            continue;
        }

        frame
            .material_constants
            .copy_data(material.cb_index(), &material.constants())?;
        material.dirty.consume();
        writes += 1;
    }
    Ok(writes)
}

/// Write the main pass constants into `frame`
pub fn update_pass_constants(frame: &mut FrameResource, pass: &PassConstants) -> RenderResult<()> {
    frame.pass_constants.copy_data(0, pass)
}

/// Overwrite `frame`'s dynamic vertex buffer
pub fn update_dynamic_vertices(frame: &mut FrameResource, vertices: &[Vertex]) -> RenderResult<()> {
    match frame.dynamic_vertices.as_mut() {
        Some(buffer) => buffer.copy_slice(vertices),
        None if vertices.is_empty() => Ok(()),
        None => Err(RenderError::SlotOutOfRange {
            buffer: "dynamic vertex",
            index: vertices.len() - 1,
            capacity: 0,
        }),
    }
}
