//! Render items
//!
//! A render item is one indexed draw: a submesh, a material, a world
//! transform and the layer it is batched into.

use crate::foundation::bounds::Aabb;
use crate::foundation::math::Mat4;
use crate::render::constants::ObjectConstants;
use crate::render::dirty::DirtyCounter;
use crate::render::geometry::PrimitiveTopology;
use crate::render::layer::RenderLayer;
use crate::render::scene::{GeometryId, MaterialId};

/// One drawable instance
#[derive(Debug, Clone)]
pub struct RenderItem {
    /// Object-to-world transform
    pub world: Mat4,
    /// Texture coordinate transform
    pub tex_transform: Mat4,
    /// Element of the object constant buffer this item occupies
    pub object_cb_index: usize,
    /// Material
    pub material: MaterialId,
    /// Geometry
    pub geometry: GeometryId,
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Number of indices to draw
    pub index_count: u32,
    /// First index
    pub start_index: u32,
    /// Value added to each index
    pub base_vertex: i32,
    layer: RenderLayer,
    local_bounds: Option<Aabb>,
    pub(crate) dirty: DirtyCounter,
}

impl RenderItem {
    pub(crate) fn new(
        desc: RenderItemDesc,
        object_cb_index: usize,
        frames: usize,
        draw: DrawArgs,
        local_bounds: Option<Aabb>,
    ) -> Self {
        Self {
            world: desc.world,
            tex_transform: desc.tex_transform,
            object_cb_index,
            material: desc.material,
            geometry: desc.geometry,
            topology: desc.topology,
            index_count: draw.index_count,
            start_index: draw.start_index,
            base_vertex: draw.base_vertex,
            layer: desc.layer,
            local_bounds,
            dirty: DirtyCounter::new(frames),
        }
    }

    /// Layer the item is drawn in
    pub fn layer(&self) -> RenderLayer {
        self.layer
    }

    /// World-space bounds, when the submesh has bounds
    pub fn bounds(&self) -> Option<Aabb> {
        self.local_bounds.map(|bounds| bounds.transformed(&self.world))
    }

    /// Per-object constants ready for upload
    pub fn constants(&self) -> ObjectConstants {
        ObjectConstants::new(&self.world, &self.tex_transform)
    }

    /// Frame resources still holding stale constants
    pub fn dirty_frames(&self) -> usize {
        self.dirty.remaining()
    }
}

/// Draw range resolved from a geometry's submesh
#[derive(Debug, Clone, Copy)]
pub(crate) struct DrawArgs {
    pub index_count: u32,
    pub start_index: u32,
    pub base_vertex: i32,
}

/// Parameters for adding a render item
#[derive(Debug, Clone)]
pub struct RenderItemDesc {
    /// Geometry to draw
    pub geometry: GeometryId,
    /// Submesh of the geometry; the geometry's own name selects the whole mesh
    pub submesh: String,
    /// Material
    pub material: MaterialId,
    /// Layer
    pub layer: RenderLayer,
    /// Object-to-world transform
    pub world: Mat4,
    /// Texture coordinate transform
    pub tex_transform: Mat4,
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Local bounds used instead of the submesh's own
    pub bounds: Option<Aabb>,
}

impl RenderItemDesc {
    /// Opaque triangle-list item with identity transforms
    pub fn new(geometry: GeometryId, submesh: impl Into<String>, material: MaterialId) -> Self {
        Self {
            geometry,
            submesh: submesh.into(),
            material,
            layer: RenderLayer::Opaque,
            world: Mat4::identity(),
            tex_transform: Mat4::identity(),
            topology: PrimitiveTopology::TriangleList,
            bounds: None,
        }
    }

    /// Set the layer
    pub fn with_layer(mut self, layer: RenderLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Set the world transform
    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    /// Set the texture transform
    pub fn with_tex_transform(mut self, tex_transform: Mat4) -> Self {
        self.tex_transform = tex_transform;
        self
    }

    /// Set the primitive topology
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Override the submesh bounds, in object space
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = Some(bounds);
        self
    }
}
