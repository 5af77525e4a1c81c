//! Frame cycle tests
//!
//! Multi-component scenarios that drive the frame ring, dirty propagation and
//! draw batching together. `doubles` holds a hand-driven fence and a device
//! that keeps every submission for inspection.



use crate::core::config::RendererConfig;
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::backend::GraphicsDevice;
use crate::render::geometry::{MeshGeometry, Vertex};
use crate::render::layer::RenderLayer;
use crate::render::material::MaterialDesc;
use crate::render::render_item::RenderItemDesc;
use crate::render::scene::{GeometryId, MaterialId, PipelineId, PipelineState, RenderItemId, SceneContext};

/// Handles of the shared test scene
pub(crate) struct TestScene {
    pub scene: SceneContext,
    pub geometry: GeometryId,
    pub materials: [MaterialId; 2],
    pub pipelines: [PipelineId; 4],
}

/// Two textures, two materials, a quad mesh and one pipeline per layer.
/// No render items yet.
pub(crate) fn test_scene(device: &mut dyn GraphicsDevice, frames: usize) -> TestScene {
    let heap = device.allocate_descriptor_heap(8).unwrap();
    let mut scene = SceneContext::new(frames, heap);

    let vertices = [
        Vertex::new([-1.0, 0.0, -1.0], [0.0, 1.0, 0.0], [0.0, 1.0]),
        Vertex::new([-1.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        Vertex::new([1.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
        Vertex::new([1.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 1.0]),
    ];
    let quad = MeshGeometry::upload(device, "quad", &vertices, &[0, 1, 2, 0, 2, 3]).unwrap();
    let geometry = scene.add_geometry(quad).unwrap();

    let grass = scene.add_texture("grass").unwrap();
    let water = scene.add_texture("water").unwrap();
    let materials = [
        scene.add_material("grass", MaterialDesc::new(grass)).unwrap(),
        scene.add_material("water", MaterialDesc::new(water).with_roughness(0.0)).unwrap(),
    ];

    let pipelines = [
        scene.add_pipeline(PipelineState::opaque("opaque")).unwrap(),
        scene.add_pipeline(PipelineState::alpha_tested("alpha_tested")).unwrap(),
        scene.add_pipeline(PipelineState::billboard("tree_sprites")).unwrap(),
        scene.add_pipeline(PipelineState::transparent("transparent")).unwrap(),
    ];
    for (layer, pipeline) in RenderLayer::DRAW_ORDER.iter().zip(pipelines) {
        scene.bind_layer_pipeline(*layer, pipeline).unwrap();
    }

    TestScene {
        scene,
        geometry,
        materials,
        pipelines,
    }
}

impl TestScene {
    /// Add a quad to `layer` at height `y`
    pub fn add_quad(&mut self, layer: RenderLayer, material: usize, y: f32) -> RenderItemId {
        let desc = RenderItemDesc::new(self.geometry, "quad", self.materials[material])
            .with_layer(layer)
            .with_world(Mat4::translation(0.0, y, 0.0));
        self.scene.add_render_item(desc).unwrap()
    }
}

/// Renderer config for `frames` slots and a single back buffer, so
/// recordings only differ by frame resource
pub(crate) fn config(frames: usize) -> RendererConfig {
    RendererConfig::new()
        .with_frame_resource_count(frames)
        .with_back_buffer_count(1)
}
