//! Per-frame scene animation
//!
//! Both animations go through [`SceneContext`] mutators, so every change
//! restarts dirty propagation for the touched material or render item.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec2, Vec3};
use crate::render::error::RenderResult;
use crate::render::scene::{MaterialId, RenderItemId, SceneContext};

/// Texture scroll speed of the water material, in texture units per second
pub const WATER_SCROLL: Vec2 = Vec2::new(0.1, 0.02);

/// Move a material's texture offset by `velocity * dt`, wrapping into `[0, 1)`.
/// Returns the new offset.
pub fn scroll_material(
    scene: &mut SceneContext,
    material: MaterialId,
    velocity: Vec2,
    dt: f32,
) -> RenderResult<Vec2> {
    let mut offset = Vec2::zeros();
    scene.update_material(material, |m| {
        let u = utils::wrap_unit(m.mat_transform[(0, 3)] + velocity.x * dt);
        let v = utils::wrap_unit(m.mat_transform[(1, 3)] + velocity.y * dt);
        m.mat_transform[(0, 3)] = u;
        m.mat_transform[(1, 3)] = v;
        offset = Vec2::new(u, v);
    })?;
    Ok(offset)
}

/// An item spinning around its local Y axis at a fixed height
#[derive(Debug, Clone, Copy)]
pub struct Spin {
    /// Animated item
    pub item: RenderItemId,
    /// Uniform scale
    pub scale: f32,
    /// Angular speed
    pub degrees_per_second: f32,
    /// Angle at time zero
    pub phase_degrees: f32,
    /// Translation applied after rotating
    pub offset: Vec3,
}

impl Spin {
    /// The castle's floating diamond
    pub fn diamond(item: RenderItemId) -> Self {
        Self {
            item,
            scale: 10.0,
            degrees_per_second: 20.0,
            phase_degrees: 45.0,
            offset: Vec3::new(0.0, 34.0, 0.0),
        }
    }

    /// World transform at `total_time` seconds
    pub fn transform(&self, total_time: f32) -> Mat4 {
        let angle = utils::deg_to_rad(self.degrees_per_second * total_time + self.phase_degrees);
        Mat4::compose(&[
            Mat4::scaling(self.scale, self.scale, self.scale),
            Mat4::rotation_y(angle),
            Mat4::translation(self.offset.x, self.offset.y, self.offset.z),
        ])
    }

    /// Write the transform for `total_time` into the scene
    pub fn apply(&self, scene: &mut SceneContext, total_time: f32) -> RenderResult<()> {
        scene.set_item_world(self.item, self.transform(total_time))
    }
}
