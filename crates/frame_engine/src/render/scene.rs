//! Scene context
//!
//! [`SceneContext`] owns everything the frame cycle reads: geometry,
//! textures, materials, pipeline states and render items. Resources are
//! registered during setup and addressed by typed slot-map handles
//! afterwards. After setup the shape of the scene is fixed; only numeric
//! fields (transforms, material parameters) change, and every change goes
//! through a method that restarts dirty propagation.

use slotmap::SlotMap;

use crate::foundation::collections::Registry;
use crate::foundation::math::Mat4;
use crate::render::backend::DescriptorHeap;
use crate::render::error::{RenderError, RenderResult};
use crate::render::geometry::{MeshGeometry, PrimitiveTopology};
use crate::render::layer::RenderLayer;
use crate::render::material::{Material, MaterialDesc, Texture};
use crate::render::render_item::{DrawArgs, RenderItem, RenderItemDesc};

slotmap::new_key_type! {
    /// Handle to a registered mesh
    pub struct GeometryId;
    /// Handle to a registered material
    pub struct MaterialId;
    /// Handle to a registered texture
    pub struct TextureId;
    /// Handle to a registered pipeline state
    pub struct PipelineId;
    /// Handle to a render item
    pub struct RenderItemId;
}

/// How a pipeline combines its output with the render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Overwrite
    Opaque,
    /// Source-alpha blending
    AlphaBlend,
}

/// Compiled pipeline state, described by the fields that matter to batching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    /// Registry name
    pub name: String,
    /// Blend mode
    pub blend: BlendMode,
    /// Whether the pixel shader discards low-alpha texels
    pub alpha_clip: bool,
    /// Primitive topology type the pipeline was built for
    pub topology: PrimitiveTopology,
}

impl PipelineState {
    /// Solid triangles
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blend: BlendMode::Opaque,
            alpha_clip: false,
            topology: PrimitiveTopology::TriangleList,
        }
    }

    /// Alpha-clipped triangles
    pub fn alpha_tested(name: impl Into<String>) -> Self {
        Self {
            alpha_clip: true,
            ..Self::opaque(name)
        }
    }

    /// Alpha-clipped point sprites
    pub fn billboard(name: impl Into<String>) -> Self {
        Self {
            alpha_clip: true,
            topology: PrimitiveTopology::PointList,
            ..Self::opaque(name)
        }
    }

    /// Alpha-blended triangles
    pub fn transparent(name: impl Into<String>) -> Self {
        Self {
            blend: BlendMode::AlphaBlend,
            ..Self::opaque(name)
        }
    }
}

/// Registries and render items for one scene
#[derive(Debug)]
pub struct SceneContext {
    frame_resource_count: usize,
    descriptor_heap: DescriptorHeap,
    geometries: Registry<GeometryId, MeshGeometry>,
    textures: Registry<TextureId, Texture>,
    materials: Registry<MaterialId, Material>,
    pipelines: Registry<PipelineId, PipelineState>,
    layer_pipelines: [Option<PipelineId>; RenderLayer::COUNT],
    item_slots: SlotMap<RenderItemId, usize>,
    items: Vec<RenderItem>,
    layers: [Vec<RenderItemId>; RenderLayer::COUNT],
}

impl SceneContext {
    /// Empty scene for a ring of `frame_resource_count` slots
    pub fn new(frame_resource_count: usize, descriptor_heap: DescriptorHeap) -> Self {
        Self {
            frame_resource_count,
            descriptor_heap,
            geometries: Registry::new("geometry"),
            textures: Registry::new("texture"),
            materials: Registry::new("material"),
            pipelines: Registry::new("pipeline"),
            layer_pipelines: [None; RenderLayer::COUNT],
            item_slots: SlotMap::with_key(),
            items: Vec::new(),
            layers: Default::default(),
        }
    }

    /// Number of frame resources dirty counters are sized for
    pub fn frame_resource_count(&self) -> usize {
        self.frame_resource_count
    }

    /// Shader-visible heap holding texture descriptors
    pub fn descriptor_heap(&self) -> &DescriptorHeap {
        &self.descriptor_heap
    }

    // Geometry

    /// Register a mesh under its own name
    pub fn add_geometry(&mut self, mesh: MeshGeometry) -> RenderResult<GeometryId> {
        let name = mesh.name.clone();
        self.geometries.insert(name, mesh)
    }

    /// Look up a mesh handle by name
    pub fn geometry_id(&self, name: &str) -> RenderResult<GeometryId> {
        self.geometries.id(name)
    }

    /// Borrow a mesh
    pub fn geometry(&self, id: GeometryId) -> RenderResult<&MeshGeometry> {
        self.geometries.get(id)
    }

    // Textures

    /// Register a texture in the next free descriptor slot
    pub fn add_texture(&mut self, name: impl Into<String>) -> RenderResult<TextureId> {
        let descriptor_index = self.textures.len();
        if descriptor_index >= self.descriptor_heap.capacity as usize {
            return Err(RenderError::SlotOutOfRange {
                buffer: "descriptor heap",
                index: descriptor_index,
                capacity: self.descriptor_heap.capacity as usize,
            });
        }

        let name = name.into();
        log::debug!("Registered texture '{}' at descriptor {}", name, descriptor_index);
        self.textures.insert(
            name.clone(),
            Texture {
                name,
                descriptor_index: descriptor_index as u32,
            },
        )
    }

    /// Look up a texture handle by name
    pub fn texture_id(&self, name: &str) -> RenderResult<TextureId> {
        self.textures.id(name)
    }

    /// Borrow a texture
    pub fn texture(&self, id: TextureId) -> RenderResult<&Texture> {
        self.textures.get(id)
    }

    // Materials

    /// Register a material. Material constant buffer indices are assigned in
    /// registration order.
    pub fn add_material(&mut self, name: impl Into<String>, desc: MaterialDesc) -> RenderResult<MaterialId> {
        self.textures.index_of(desc.diffuse_texture)?;

        let name = name.into();
        let material = Material::new(name.clone(), self.materials.len(), desc, self.frame_resource_count);
        log::debug!("Registered material '{}' at constant slot {}", name, material.cb_index());
        self.materials.insert(name, material)
    }

    /// Look up a material handle by name
    pub fn material_id(&self, name: &str) -> RenderResult<MaterialId> {
        self.materials.id(name)
    }

    /// Borrow a material
    pub fn material(&self, id: MaterialId) -> RenderResult<&Material> {
        self.materials.get(id)
    }

    /// Restart propagation of a material's constants
    pub fn mark_material_dirty(&mut self, id: MaterialId) -> RenderResult<()> {
        self.materials.get_mut(id)?.dirty.mark();
        Ok(())
    }

    /// Change a material and restart its propagation
    pub fn update_material<F>(&mut self, id: MaterialId, change: F) -> RenderResult<()>
    where
        F: FnOnce(&mut MaterialDesc),
    {
        let material = self.materials.get_mut(id)?;
        change(material.params_mut());
        material.dirty.mark();
        Ok(())
    }

    /// Materials in constant buffer order
    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter()
    }

    pub(crate) fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials.iter_mut().map(|(_, material)| material)
    }

    /// Number of materials
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    // Pipelines

    /// Register a pipeline state under its own name
    pub fn add_pipeline(&mut self, pipeline: PipelineState) -> RenderResult<PipelineId> {
        let name = pipeline.name.clone();
        self.pipelines.insert(name, pipeline)
    }

    /// Look up a pipeline handle by name
    pub fn pipeline_id(&self, name: &str) -> RenderResult<PipelineId> {
        self.pipelines.id(name)
    }

    /// Borrow a pipeline state
    pub fn pipeline(&self, id: PipelineId) -> RenderResult<&PipelineState> {
        self.pipelines.get(id)
    }

    /// Use `pipeline` for every item in `layer`
    pub fn bind_layer_pipeline(&mut self, layer: RenderLayer, pipeline: PipelineId) -> RenderResult<()> {
        self.pipelines.index_of(pipeline)?;
        self.layer_pipelines[layer.index()] = Some(pipeline);
        Ok(())
    }

    /// Pipeline bound to `layer`
    pub fn layer_pipeline(&self, layer: RenderLayer) -> RenderResult<PipelineId> {
        self.layer_pipelines[layer.index()].ok_or(RenderError::MissingPipeline(layer))
    }

    // Render items

    /// Add a render item. Object constant buffer indices are assigned in
    /// insertion order, so the item count must not exceed the capacity the
    /// frame resources were created with.
    pub fn add_render_item(&mut self, desc: RenderItemDesc) -> RenderResult<RenderItemId> {
        let geometry = self.geometries.get(desc.geometry)?;
        let submesh = geometry.draw_args(&desc.submesh)?;
        let bounds = desc.bounds.or_else(|| geometry.bounds(&desc.submesh));
        self.materials.index_of(desc.material)?;

        let object_cb_index = self.items.len();
        let layer = desc.layer;
        let draw = DrawArgs {
            index_count: submesh.index_count,
            start_index: submesh.start_index,
            base_vertex: submesh.base_vertex,
        };

        log::trace!(
            "Adding render item {} ({} indices) to {:?} layer",
            object_cb_index,
            draw.index_count,
            layer
        );
        self.items
            .push(RenderItem::new(desc, object_cb_index, self.frame_resource_count, draw, bounds));
        let id = self.item_slots.insert(object_cb_index);
        self.layers[layer.index()].push(id);
        Ok(id)
    }

    /// Borrow a render item
    pub fn item(&self, id: RenderItemId) -> RenderResult<&RenderItem> {
        let index = self.item_index(id)?;
        Ok(&self.items[index])
    }

    fn item_mut(&mut self, id: RenderItemId) -> RenderResult<&mut RenderItem> {
        let index = self.item_index(id)?;
        Ok(&mut self.items[index])
    }

    fn item_index(&self, id: RenderItemId) -> RenderResult<usize> {
        self.item_slots
            .get(id)
            .copied()
            .ok_or(RenderError::InvalidHandle { kind: "render item" })
    }

    /// Replace an item's world transform
    pub fn set_item_world(&mut self, id: RenderItemId, world: Mat4) -> RenderResult<()> {
        let item = self.item_mut(id)?;
        item.world = world;
        item.dirty.mark();
        Ok(())
    }

    /// Replace an item's texture transform
    pub fn set_item_tex_transform(&mut self, id: RenderItemId, tex_transform: Mat4) -> RenderResult<()> {
        let item = self.item_mut(id)?;
        item.tex_transform = tex_transform;
        item.dirty.mark();
        Ok(())
    }

    /// Replace both transforms
    pub fn set_item_transforms(&mut self, id: RenderItemId, world: Mat4, tex_transform: Mat4) -> RenderResult<()> {
        let item = self.item_mut(id)?;
        item.world = world;
        item.tex_transform = tex_transform;
        item.dirty.mark();
        Ok(())
    }

    /// All render items in insertion order
    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [RenderItem] {
        &mut self.items
    }

    /// Handles of the items in `layer`, in insertion order
    pub fn layer_items(&self, layer: RenderLayer) -> &[RenderItemId] {
        &self.layers[layer.index()]
    }

    /// Number of render items
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;
    use crate::render::backend::{DescriptorHandle, GpuAddress};
    use crate::render::geometry::{IndexBufferView, IndexFormat, VertexSource};

    fn heap(capacity: u32) -> DescriptorHeap {
        DescriptorHeap {
            gpu_start: DescriptorHandle(0x8000),
            increment: 32,
            capacity,
        }
    }

    fn scene() -> (SceneContext, GeometryId, MaterialId) {
        let mut scene = SceneContext::new(3, heap(4));
        let mesh = MeshGeometry::new(
            "box",
            VertexSource::Dynamic,
            IndexBufferView {
                address: GpuAddress(0x1_0000),
                size_in_bytes: 72,
                format: IndexFormat::U16,
            },
        );
        let geometry = scene.add_geometry(mesh).unwrap();
        let texture = scene.add_texture("bricks").unwrap();
        let material = scene.add_material("bricks", MaterialDesc::new(texture)).unwrap();
        (scene, geometry, material)
    }

    #[test]
    fn test_items_keep_insertion_order_within_layers() {
        let (mut scene, geometry, material) = scene();
        let a = scene
            .add_render_item(RenderItemDesc::new(geometry, "box", material))
            .unwrap();
        let b = scene
            .add_render_item(RenderItemDesc::new(geometry, "box", material).with_layer(RenderLayer::Transparent))
            .unwrap();
        let c = scene
            .add_render_item(RenderItemDesc::new(geometry, "box", material))
            .unwrap();

        assert_eq!(scene.layer_items(RenderLayer::Opaque), &[a, c]);
        assert_eq!(scene.layer_items(RenderLayer::Transparent), &[b]);
        assert!(scene.layer_items(RenderLayer::Billboard).is_empty());
        assert_eq!(scene.item(c).unwrap().object_cb_index, 2);
        assert_eq!(scene.item(a).unwrap().index_count, 36);
    }

    #[test]
    fn test_new_items_and_materials_start_dirty() {
        let (mut scene, geometry, material) = scene();
        let item = scene
            .add_render_item(RenderItemDesc::new(geometry, "box", material))
            .unwrap();

        assert_eq!(scene.item(item).unwrap().dirty_frames(), 3);
        assert_eq!(scene.material(material).unwrap().dirty_frames(), 3);
    }

    #[test]
    fn test_mutation_restarts_propagation() {
        let (mut scene, geometry, material) = scene();
        let item = scene
            .add_render_item(RenderItemDesc::new(geometry, "box", material))
            .unwrap();
        scene.items_mut()[0].dirty.consume();
        scene.items_mut()[0].dirty.consume();
        assert_eq!(scene.item(item).unwrap().dirty_frames(), 1);

        scene.set_item_world(item, Mat4::translation(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(scene.item(item).unwrap().dirty_frames(), 3);

        for material in scene.materials_mut() {
            material.dirty.consume();
        }
        scene.update_material(material, |m| m.roughness = 0.5).unwrap();
        assert_eq!(scene.material(material).unwrap().dirty_frames(), 3);
    }

    #[test]
    fn test_missing_submesh_and_pipeline() {
        let (mut scene, geometry, material) = scene();

        assert!(matches!(
            scene.add_render_item(RenderItemDesc::new(geometry, "sphere", material)),
            Err(RenderError::MissingResource { kind: "submesh", .. })
        ));
        assert!(matches!(
            scene.layer_pipeline(RenderLayer::AlphaTested),
            Err(RenderError::MissingPipeline(RenderLayer::AlphaTested))
        ));

        let pipeline = scene.add_pipeline(PipelineState::alpha_tested("alpha")).unwrap();
        scene.bind_layer_pipeline(RenderLayer::AlphaTested, pipeline).unwrap();
        assert_eq!(scene.layer_pipeline(RenderLayer::AlphaTested).unwrap(), pipeline);
    }

    #[test]
    fn test_texture_slots_are_bounded_by_heap() {
        let mut scene = SceneContext::new(3, heap(2));
        let a = scene.add_texture("a").unwrap();
        let b = scene.add_texture("b").unwrap();
        assert_eq!(scene.texture(a).unwrap().descriptor_index, 0);
        assert_eq!(scene.texture(b).unwrap().descriptor_index, 1);

        assert!(matches!(
            scene.add_texture("c"),
            Err(RenderError::SlotOutOfRange { buffer: "descriptor heap", .. })
        ));
        assert!(matches!(
            scene.add_texture("a"),
            Err(RenderError::SlotOutOfRange { .. })
        ));
    }

    #[test]
    fn test_material_indices_follow_registration() {
        let (mut scene, _, first) = scene();
        let texture = scene.texture_id("bricks").unwrap();
        let second = scene
            .add_material("water", MaterialDesc::new(texture).with_roughness(0.0))
            .unwrap();

        assert_eq!(scene.material(first).unwrap().cb_index(), 0);
        assert_eq!(scene.material(second).unwrap().cb_index(), 1);
        assert!(matches!(
            scene.add_material("water", MaterialDesc::new(texture)),
            Err(RenderError::DuplicateResource { kind: "material", .. })
        ));
    }
}
