//! Demo scene construction
//!
//! Both scenes share the same skeleton: rolling hills, a simulated water
//! surface drawn from the dynamic vertex buffer, tree billboards, and one
//! pipeline per render layer. The castle scene adds walls, towers, a
//! translucent gate, a small hedge maze and a spinning diamond.

use std::str::FromStr;

use frame_engine::foundation::bounds::Aabb;
use frame_engine::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};
use frame_engine::render::{
    GraphicsDevice, Light, MaterialDesc, MaterialId, MeshGeometry, PipelineState, PrimitiveTopology,
    RenderItemDesc, RenderLayer, RenderResult, SceneContext,
};
use frame_engine::scene::{shapes, Spin, Waves};

use crate::error::AppError;

/// Which demo to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    /// Castle, maze and spinning diamond
    Castle,
    /// Hills, water, a wire crate and trees
    Billboards,
}

impl FromStr for SceneKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "castle" => Ok(Self::Castle),
            "billboards" => Ok(Self::Billboards),
            other => Err(AppError::UnknownScene(other.to_string())),
        }
    }
}

impl SceneKind {
    fn textures(self) -> &'static [&'static str] {
        match self {
            Self::Castle => &[
                "grassTex", "waterTex", "treeArrayTex", "wallTex", "stoneTex", "hedgeTex", "gateTex",
            ],
            Self::Billboards => &["grassTex", "waterTex", "fenceTex", "treeArrayTex"],
        }
    }
}

/// A built scene plus the state the frame loop animates
pub struct DemoScene {
    /// Registries and render items
    pub scene: SceneContext,
    /// Material whose texture scrolls
    pub water: MaterialId,
    /// Simulation feeding the water surface
    pub waves: Waves,
    /// Items spinning in place
    pub spins: Vec<Spin>,
    /// Scene lights
    pub lights: Vec<Light>,
    /// Ambient term
    pub ambient: Vec4,
}

impl DemoScene {
    /// Register every texture, material, mesh, pipeline and render item
    pub fn build(kind: SceneKind, device: &mut dyn GraphicsDevice, frame_resource_count: usize) -> Result<Self, AppError> {
        let textures = kind.textures();
        let heap = device.allocate_descriptor_heap(textures.len() as u32)?;
        let mut scene = SceneContext::new(frame_resource_count, heap);
        for name in textures {
            scene.add_texture(*name)?;
        }
        add_layer_pipelines(&mut scene)?;

        let waves = match kind {
            SceneKind::Castle => Waves::new(200, 200, 2.0, 0.03, 4.0, 0.2),
            SceneKind::Billboards => Waves::new(128, 128, 1.0, 0.03, 4.0, 0.2),
        };
        let water = add_terrain(&mut scene, device, &waves)?;
        add_trees(&mut scene, device)?;

        let mut spins = Vec::new();
        let (lights, ambient) = match kind {
            SceneKind::Castle => {
                spins.push(add_castle(&mut scene, device)?);
                (castle_lights(), Vec4::new(0.325, 0.325, 0.325, 1.0))
            }
            SceneKind::Billboards => {
                add_crate(&mut scene, device)?;
                (three_point_lights(), Vec4::new(0.25, 0.25, 0.35, 1.0))
            }
        };

        log::info!(
            "Built {:?} scene: {} render items, {} materials, {}x{} wave grid",
            kind,
            scene.item_count(),
            scene.material_count(),
            waves.row_count(),
            waves.column_count()
        );

        Ok(Self {
            scene,
            water,
            waves,
            spins,
            lights,
            ambient,
        })
    }
}

fn add_layer_pipelines(scene: &mut SceneContext) -> RenderResult<()> {
    let layers = [
        (RenderLayer::Opaque, PipelineState::opaque("opaque")),
        (RenderLayer::AlphaTested, PipelineState::alpha_tested("alphaTested")),
        (RenderLayer::Billboard, PipelineState::billboard("treeSprites")),
        (RenderLayer::Transparent, PipelineState::transparent("transparent")),
    ];
    for (layer, pipeline) in layers {
        let id = scene.add_pipeline(pipeline)?;
        scene.bind_layer_pipeline(layer, id)?;
    }
    Ok(())
}

fn material(
    scene: &mut SceneContext,
    name: &str,
    texture: &str,
    albedo: Vec4,
    fresnel: f32,
    roughness: f32,
) -> RenderResult<MaterialId> {
    let texture = scene.texture_id(texture)?;
    scene.add_material(
        name,
        MaterialDesc::new(texture)
            .with_albedo(albedo)
            .with_fresnel(Vec3::repeat(fresnel))
            .with_roughness(roughness),
    )
}

/// Hills and the water surface. Returns the water material.
fn add_terrain(scene: &mut SceneContext, device: &mut dyn GraphicsDevice, waves: &Waves) -> Result<MaterialId, AppError> {
    let grass = material(scene, "grass", "grassTex", Vec4::repeat(1.0), 0.01, 0.125)?;
    let water = material(scene, "water", "waterTex", Vec4::new(1.0, 1.0, 1.0, 0.5), 0.1, 0.0)?;
    let tiled = Mat4::scaling(5.0, 5.0, 1.0);

    let land = scene.add_geometry(shapes::hills(160.0, 160.0, 50, 50).upload(device, "landGeo")?)?;
    // Collide with a thin ground slab rather than the full height range of the hills
    scene.add_render_item(
        RenderItemDesc::new(land, "landGeo", grass)
            .with_tex_transform(tiled)
            .with_bounds(Aabb::from_center_extents(Vec3::zeros(), Vec3::new(80.0, 0.6, 80.0))),
    )?;

    let surface = scene.add_geometry(MeshGeometry::dynamic(device, "waterGeo", &waves.indices()?)?)?;
    scene.add_render_item(
        RenderItemDesc::new(surface, "waterGeo", water)
            .with_layer(RenderLayer::Transparent)
            .with_tex_transform(tiled),
    )?;
    Ok(water)
}

fn add_trees(scene: &mut SceneContext, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
    let trees = material(scene, "treeSprites", "treeArrayTex", Vec4::repeat(1.0), 0.01, 0.125)?;
    let (vertices, indices) = shapes::tree_sprites();
    let sprites = scene.add_geometry(MeshGeometry::upload(device, "treeSpritesGeo", &vertices, &indices)?)?;
    scene.add_render_item(
        RenderItemDesc::new(sprites, "treeSpritesGeo", trees)
            .with_layer(RenderLayer::Billboard)
            .with_topology(PrimitiveTopology::PointList),
    )?;
    Ok(())
}

fn add_crate(scene: &mut SceneContext, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
    let fence = material(scene, "wirefence", "fenceTex", Vec4::repeat(1.0), 0.02, 0.25)?;
    let cube = scene.add_geometry(shapes::cuboid(8.0, 8.0, 8.0).upload(device, "boxGeo")?)?;
    scene.add_render_item(
        RenderItemDesc::new(cube, "boxGeo", fence)
            .with_layer(RenderLayer::AlphaTested)
            .with_world(Mat4::translation(3.0, 2.0, -9.0)),
    )?;
    Ok(())
}

/// Castle walls, towers, gate, maze and the diamond. Returns the diamond's spin.
fn add_castle(scene: &mut SceneContext, device: &mut dyn GraphicsDevice) -> RenderResult<Spin> {
    const HALF: f32 = 34.0;

    let wall = material(scene, "wall", "wallTex", Vec4::repeat(1.0), 0.02, 0.125)?;
    let stone = material(scene, "stone", "stoneTex", Vec4::repeat(1.0), 0.02, 0.125)?;
    let hedge = material(scene, "hedge", "hedgeTex", Vec4::repeat(1.0), 0.01, 0.125)?;
    let gate = material(scene, "gate", "gateTex", Vec4::new(1.0, 1.0, 1.0, 0.6), 0.51, 0.02)?;
    let wall2 = material(scene, "wall2", "stoneTex", Vec4::repeat(1.0), 0.02, 0.125)?;

    let unit_box = scene.add_geometry(shapes::cuboid(1.0, 1.0, 1.0).upload(device, "boxGeo")?)?;
    let tower = scene.add_geometry(shapes::cylinder(1.0, 1.0, 1.0, 20, 1).upload(device, "towerGeo")?)?;
    let roof = scene.add_geometry(shapes::cylinder(1.0, 0.0, 1.0, 20, 1).upload(device, "towerTopGeo")?)?;
    let diamond = scene.add_geometry(shapes::diamond(1.0, 6).upload(device, "diamondGeo")?)?;

    let block = |sx: f32, sy: f32, sz: f32, x: f32, y: f32, z: f32| {
        Mat4::compose(&[Mat4::scaling(sx, sy, sz), Mat4::translation(x, y, z)])
    };

    // Curtain walls, leaving room for the gate in the south wall
    let walls = [
        block(2.0 * HALF, 20.0, 2.0, 0.0, 10.0, HALF),
        block(2.0, 20.0, 2.0 * HALF, -HALF, 10.0, 0.0),
        block(2.0, 20.0, 2.0 * HALF, HALF, 10.0, 0.0),
        block(HALF - 8.0, 20.0, 2.0, -(HALF + 8.0) * 0.5, 10.0, -HALF),
        block(HALF - 8.0, 20.0, 2.0, (HALF + 8.0) * 0.5, 10.0, -HALF),
    ];
    for world in walls {
        scene.add_render_item(RenderItemDesc::new(unit_box, "boxGeo", wall).with_world(world))?;
    }

    for (x, z) in [(-HALF, -HALF), (HALF, -HALF), (-HALF, HALF), (HALF, HALF)] {
        scene.add_render_item(
            RenderItemDesc::new(tower, "towerGeo", stone).with_world(block(6.0, 30.0, 6.0, x, 15.0, z)),
        )?;
        scene.add_render_item(
            RenderItemDesc::new(roof, "towerTopGeo", stone).with_world(block(8.0, 10.0, 8.0, x, 35.0, z)),
        )?;
    }

    scene.add_render_item(
        RenderItemDesc::new(unit_box, "boxGeo", gate)
            .with_layer(RenderLayer::Transparent)
            .with_world(block(16.0, 14.0, 1.0, 0.0, 7.0, -HALF)),
    )?;

    // Hedge maze in front of the gate, one cell per character
    const MAZE: [&str; 5] = ["##.####", "#...#.#", "#.#.#.#", "#.#...#", "###.###"];
    const CELL: f32 = 8.0;
    for (row, line) in MAZE.iter().enumerate() {
        for (col, cell) in line.chars().enumerate() {
            if cell != '#' {
                continue;
            }
            let x = (col as f32 - 3.0) * CELL;
            let z = -HALF - 20.0 - row as f32 * CELL;
            scene.add_render_item(
                RenderItemDesc::new(unit_box, "boxGeo", hedge)
                    .with_layer(RenderLayer::AlphaTested)
                    .with_world(block(CELL, 6.0, CELL, x, 3.0, z)),
            )?;
        }
    }

    let item = scene.add_render_item(
        RenderItemDesc::new(diamond, "diamondGeo", wall2)
            .with_layer(RenderLayer::AlphaTested)
            .with_tex_transform(Mat4::scaling(5.0, 10.0, 5.0)),
    )?;
    let spin = Spin::diamond(item);
    spin.apply(scene, 0.0)?;
    Ok(spin)
}

/// Key, fill and back light
fn three_point_lights() -> Vec<Light> {
    vec![
        Light::directional(Vec3::new(0.57735, -0.57735, 0.57735), Vec3::repeat(0.6)),
        Light::directional(Vec3::new(-0.57735, -0.57735, 0.57735), Vec3::repeat(0.3)),
        Light::directional(Vec3::new(0.0, -0.707, -0.707), Vec3::repeat(0.15)),
    ]
}

fn castle_lights() -> Vec<Light> {
    let torch = Vec3::new(255.0, 192.0, 203.0) / 4.0;
    let brazier = Vec3::new(1.0, 0.3, 0.0);
    let centre = Vec3::repeat(5.35);

    let mut lights = vec![Light::directional(Vec3::new(0.0, -0.27735, 0.57735), Vec3::new(0.3, 0.3, 0.5))];
    for (x, z) in [(-16.5, 16.5), (16.5, 16.5), (-16.5, -16.5), (16.5, -16.5)] {
        lights.push(Light::point(Vec3::new(x, 15.5, z), torch));
    }
    lights.push(Light::point(Vec3::new(0.0, 30.0, 0.0), centre));
    lights.push(Light::spot(Vec3::new(0.0, 45.0, 0.0), Vec3::new(0.0, -5.0, 0.0), centre, 0.95));
    for (x, z) in [(34.0, 34.0), (34.0, 4.0), (-34.0, 34.0), (-34.0, 4.0)] {
        lights.push(Light::point(Vec3::new(x, 10.0, z), brazier));
    }
    lights
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_engine::core::config::{RendererConfig, SimulationConfig};
    use frame_engine::foundation::math::constants::QUARTER_PI;
    use frame_engine::render::{SimulatedDevice, MAX_LIGHTS};
    use frame_engine::scene::{collision, try_move, Camera, CameraMove};

    fn build(kind: SceneKind) -> DemoScene {
        let config = RendererConfig::default();
        let mut device = SimulatedDevice::new(&config, &SimulationConfig::default()).unwrap();
        DemoScene::build(kind, &mut device, config.frame_resource_count).unwrap()
    }

    #[test]
    fn test_scene_names_parse() {
        assert_eq!("castle".parse::<SceneKind>().unwrap(), SceneKind::Castle);
        assert_eq!("billboards".parse::<SceneKind>().unwrap(), SceneKind::Billboards);
        assert!(matches!("maze".parse::<SceneKind>(), Err(AppError::UnknownScene(_))));
    }

    #[test]
    fn test_castle_populates_every_layer() {
        let demo = build(SceneKind::Castle);

        for layer in RenderLayer::DRAW_ORDER {
            assert!(!demo.scene.layer_items(layer).is_empty(), "{:?} is empty", layer);
        }
        assert_eq!(demo.spins.len(), 1);
        assert!(demo.lights.len() <= MAX_LIGHTS);
    }

    #[test]
    fn test_diamond_is_alpha_tested_wall2() {
        let demo = build(SceneKind::Castle);
        let diamond = demo.spins[0].item;
        let item = demo.scene.item(diamond).unwrap();

        assert_eq!(item.layer(), RenderLayer::AlphaTested);
        assert_eq!(item.material, demo.scene.material_id("wall2").unwrap());
        assert_eq!(item.tex_transform, Mat4::scaling(5.0, 10.0, 5.0));
        assert!(demo.scene.layer_items(RenderLayer::AlphaTested).contains(&diamond));
        assert!(demo.scene.material_id("diamond").is_err());
    }

    #[test]
    fn test_castle_walls_block_camera() {
        let demo = build(SceneKind::Castle);

        // Standing above the hills, the ground slab is out of the way
        let mut camera = Camera::new(Vec3::new(0.0, 30.0, -155.0), QUARTER_PI, 1.0, 1.0, 1000.0);
        camera.look_at(Vec3::new(0.0, 10.0, 0.0));
        for movement in CameraMove::ALL {
            assert!(!collision::is_blocked(&demo.scene, &camera, movement), "{:?}", movement);
        }

        // Inside the courtyard, walking east stops short of the east wall
        let mut camera = Camera::new(Vec3::new(0.0, 5.0, 0.0), QUARTER_PI, 1.0, 1.0, 1000.0);
        camera.look_at(Vec3::new(10.0, 5.0, 0.0));
        let mut steps = 0;
        while try_move(&demo.scene, &mut camera, CameraMove::Forward, 0.02) {
            steps += 1;
            assert!(steps < 100);
        }
        let x = camera.position().x;
        assert!(x > 33.0 - collision::HIT_DISTANCE - 1.0 && x < 33.0, "stopped at {}", x);
    }

    #[test]
    fn test_billboards_scene_has_no_animated_items() {
        let demo = build(SceneKind::Billboards);

        assert!(demo.spins.is_empty());
        assert_eq!(demo.scene.layer_items(RenderLayer::Billboard).len(), 1);
        assert_eq!(demo.scene.layer_items(RenderLayer::AlphaTested).len(), 1);
        assert_eq!(demo.scene.material_id("water").unwrap(), demo.water);
    }
}
