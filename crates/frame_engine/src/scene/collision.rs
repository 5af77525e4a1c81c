//! Camera collision against opaque geometry
//!
//! Before a walk or strafe, a ray is cast from the camera along the move
//! direction against the world bounds of every Opaque render item. The move
//! is refused when a box is closer than [`HIT_DISTANCE`]. Vertical moves and
//! rotations are never blocked.

use crate::foundation::math::Vec3;
use crate::render::layer::RenderLayer;
use crate::render::scene::SceneContext;
use crate::scene::camera::Camera;

/// Closest an opaque box may be along the move direction
pub const HIT_DISTANCE: f32 = 7.0;

/// Walk speed in world units per second
pub const WALK_SPEED: f32 = 45.0;

/// Strafe speed in world units per second
pub const STRAFE_SPEED: f32 = 25.0;

/// Planar camera move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMove {
    /// Along the look vector
    Forward,
    /// Against the look vector
    Back,
    /// Against the right vector
    Left,
    /// Along the right vector
    Right,
}

impl CameraMove {
    /// All four moves
    pub const ALL: [CameraMove; 4] = [Self::Forward, Self::Back, Self::Left, Self::Right];

    /// Unit direction of the move for `camera`
    pub fn direction(self, camera: &Camera) -> Vec3 {
        match self {
            Self::Forward => camera.look(),
            Self::Back => -camera.look(),
            Self::Left => -camera.right(),
            Self::Right => camera.right(),
        }
    }

    /// Speed in world units per second
    pub fn speed(self) -> f32 {
        match self {
            Self::Forward | Self::Back => WALK_SPEED,
            Self::Left | Self::Right => STRAFE_SPEED,
        }
    }
}

/// Distance to the nearest opaque box hit by a ray from `origin`
pub fn nearest_opaque_hit(scene: &SceneContext, origin: Vec3, direction: Vec3) -> Option<f32> {
    scene
        .layer_items(RenderLayer::Opaque)
        .iter()
        .filter_map(|&id| scene.item(id).ok()?.bounds())
        .filter_map(|bounds| bounds.intersect_ray(origin, direction))
        .min_by(f32::total_cmp)
}

/// Whether an opaque box is within [`HIT_DISTANCE`] along `movement`
pub fn is_blocked(scene: &SceneContext, camera: &Camera, movement: CameraMove) -> bool {
    nearest_opaque_hit(scene, camera.position(), movement.direction(camera))
        .is_some_and(|distance| distance < HIT_DISTANCE)
}

/// Move the camera for `dt` seconds unless the move is blocked.
/// Returns whether the camera moved.
pub fn try_move(scene: &SceneContext, camera: &mut Camera, movement: CameraMove, dt: f32) -> bool {
    if is_blocked(scene, camera, movement) {
        log::trace!("Camera {:?} blocked at {:?}", movement, camera.position());
        return false;
    }

    let distance = movement.speed() * dt;
    match movement {
        CameraMove::Forward => camera.walk(distance),
        CameraMove::Back => camera.walk(-distance),
        CameraMove::Left => camera.strafe(-distance),
        CameraMove::Right => camera.strafe(distance),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::bounds::Aabb;
    use crate::foundation::math::{constants::QUARTER_PI, Mat4, Mat4Ext};
    use crate::render::backend::{DescriptorHandle, DescriptorHeap, GpuAddress};
    use crate::render::geometry::{IndexBufferView, IndexFormat, MeshGeometry, VertexSource};
    use crate::render::material::MaterialDesc;
    use crate::render::render_item::RenderItemDesc;
    use approx::assert_relative_eq;

    /// A 2x16x50 wall centred at x = 25, plus the same wall on the
    /// transparent layer at x = -25
    fn walled_scene() -> SceneContext {
        let heap = DescriptorHeap {
            gpu_start: DescriptorHandle(0),
            increment: 32,
            capacity: 1,
        };
        let mut scene = SceneContext::new(3, heap);
        let texture = scene.add_texture("wall").unwrap();
        let material = scene.add_material("wall", MaterialDesc::new(texture)).unwrap();

        let mut mesh = MeshGeometry::new(
            "wall",
            VertexSource::Dynamic,
            IndexBufferView {
                address: GpuAddress(0),
                size_in_bytes: 72,
                format: IndexFormat::U16,
            },
        );
        mesh.set_bounds("wall", Aabb::from_center_extents(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5)));
        let geometry = scene.add_geometry(mesh).unwrap();

        let scale = Mat4::scaling(2.0, 16.0, 50.0);
        for (x, layer) in [(25.0, RenderLayer::Opaque), (-25.0, RenderLayer::Transparent)] {
            let world = Mat4::compose(&[scale, Mat4::translation(x, 8.0, 0.0)]);
            scene
                .add_render_item(RenderItemDesc::new(geometry, "wall", material).with_layer(layer).with_world(world))
                .unwrap();
        }
        scene
    }

    /// Camera at `x` looking down +X
    fn camera_at(x: f32) -> Camera {
        let mut camera = Camera::new(Vec3::new(x, 5.0, 0.0), QUARTER_PI, 1.0, 1.0, 1000.0);
        camera.look_at(Vec3::new(x + 10.0, 5.0, 0.0));
        camera
    }

    #[test]
    fn test_item_bounds_follow_world_transform() {
        let scene = walled_scene();
        let wall = scene.items()[0].bounds().unwrap();

        assert_relative_eq!(wall.min, Vec3::new(24.0, 0.0, -25.0), epsilon = 1e-4);
        assert_relative_eq!(wall.max, Vec3::new(26.0, 16.0, 25.0), epsilon = 1e-4);
    }

    #[test]
    fn test_nearest_hit_ignores_non_opaque_layers() {
        let scene = walled_scene();

        let hit = nearest_opaque_hit(&scene, Vec3::new(0.0, 5.0, 0.0), Vec3::x()).unwrap();
        assert_relative_eq!(hit, 24.0, epsilon = 1e-4);
        assert!(nearest_opaque_hit(&scene, Vec3::new(0.0, 5.0, 0.0), -Vec3::x()).is_none());
    }

    #[test]
    fn test_walk_into_wall_is_blocked() {
        let scene = walled_scene();
        let mut camera = camera_at(20.0);

        assert!(is_blocked(&scene, &camera, CameraMove::Forward));
        assert!(!try_move(&scene, &mut camera, CameraMove::Forward, 0.1));
        assert_relative_eq!(camera.position().x, 20.0);

        // Backing away and strafing along the wall stay free
        assert!(try_move(&scene, &mut camera, CameraMove::Back, 0.1));
        assert_relative_eq!(camera.position().x, 15.5, epsilon = 1e-4);
        assert!(try_move(&scene, &mut camera, CameraMove::Left, 0.1));
        assert_relative_eq!(camera.position().z, 2.5, epsilon = 1e-4);
    }

    #[test]
    fn test_free_walk_until_hit_distance() {
        let scene = walled_scene();
        let mut camera = camera_at(0.0);

        let mut steps = 0;
        while try_move(&scene, &mut camera, CameraMove::Forward, 0.02) {
            steps += 1;
            assert!(steps < 100);
        }

        // Stops with the wall face (x = 24) inside the hit distance
        let gap = 24.0 - camera.position().x;
        assert!(gap < HIT_DISTANCE && gap >= HIT_DISTANCE - WALK_SPEED * 0.02, "gap {}", gap);
    }

    #[test]
    fn test_transparent_wall_does_not_block() {
        let scene = walled_scene();
        let mut camera = camera_at(-20.0);
        camera.look_at(Vec3::new(-30.0, 5.0, 0.0));

        assert!(!is_blocked(&scene, &camera, CameraMove::Forward));
        assert!(try_move(&scene, &mut camera, CameraMove::Forward, 0.1));
    }
}
