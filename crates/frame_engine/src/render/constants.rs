//! Constant buffer layouts
//!
//! These structs are copied byte for byte into upload buffers, so they are
//! `#[repr(C)]`, padding-free and [`Pod`]. Matrices are stored with
//! [`shader_matrix`] so every constant type shares one upload convention.

// `derive(Pod)` expands to `unsafe impl`
#![allow(unsafe_code)]

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{shader_matrix, Mat4, ShaderMatrix, Vec3, Vec4};

/// Maximum lights in a pass
pub const MAX_LIGHTS: usize = 16;

/// Per-object constants
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    /// Object-to-world transform
    pub world: ShaderMatrix,
    /// Texture coordinate transform
    pub tex_transform: ShaderMatrix,
}

impl ObjectConstants {
    /// Build from CPU-side transforms
    pub fn new(world: &Mat4, tex_transform: &Mat4) -> Self {
        Self {
            world: shader_matrix(world),
            tex_transform: shader_matrix(tex_transform),
        }
    }
}

/// Per-material constants
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialConstants {
    /// Diffuse albedo (RGBA)
    pub diffuse_albedo: [f32; 4],
    /// Fresnel reflectance at normal incidence
    pub fresnel_r0: [f32; 3],
    /// Surface roughness in `[0, 1]`
    pub roughness: f32,
    /// Texture coordinate transform applied on top of the object's
    pub mat_transform: ShaderMatrix,
}

/// Light description shared by directional, point and spot lights
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Light {
    /// Light colour and intensity
    pub strength: [f32; 3],
    /// Distance where attenuation starts (point/spot)
    pub falloff_start: f32,
    /// Direction (directional/spot)
    pub direction: [f32; 3],
    /// Distance where the light reaches zero (point/spot)
    pub falloff_end: f32,
    /// World position (point/spot)
    pub position: [f32; 3],
    /// Spot cone exponent
    pub spot_power: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            strength: [0.5, 0.5, 0.5],
            falloff_start: 1.0,
            direction: [0.0, -1.0, 0.0],
            falloff_end: 10.0,
            position: [0.0, 0.0, 0.0],
            spot_power: 64.0,
        }
    }
}

impl Light {
    /// Directional light
    pub fn directional(direction: Vec3, strength: Vec3) -> Self {
        Self {
            direction: direction.into(),
            strength: strength.into(),
            ..Self::default()
        }
    }

    /// Point light
    pub fn point(position: Vec3, strength: Vec3) -> Self {
        Self {
            position: position.into(),
            strength: strength.into(),
            ..Self::default()
        }
    }

    /// Spot light
    pub fn spot(position: Vec3, direction: Vec3, strength: Vec3, spot_power: f32) -> Self {
        Self {
            position: position.into(),
            direction: direction.into(),
            strength: strength.into(),
            spot_power,
            ..Self::default()
        }
    }
}

/// Per-pass constants, rewritten every frame
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PassConstants {
    /// World-to-view
    pub view: ShaderMatrix,
    /// View-to-world
    pub inv_view: ShaderMatrix,
    /// View-to-clip
    pub proj: ShaderMatrix,
    /// Clip-to-view
    pub inv_proj: ShaderMatrix,
    /// World-to-clip
    pub view_proj: ShaderMatrix,
    /// Clip-to-world
    pub inv_view_proj: ShaderMatrix,
    /// Camera position in world space
    pub eye_position: [f32; 3],
    /// Padding to a 16-byte boundary
    pub _pad0: f32,
    /// Render target size in pixels
    pub render_target_size: [f32; 2],
    /// Reciprocal render target size
    pub inv_render_target_size: [f32; 2],
    /// Near plane distance
    pub near_z: f32,
    /// Far plane distance
    pub far_z: f32,
    /// Seconds since start
    pub total_time: f32,
    /// Seconds since last frame
    pub delta_time: f32,
    /// Ambient light colour
    pub ambient_light: [f32; 4],
    /// Light list; unused entries have zero strength
    pub lights: [Light; MAX_LIGHTS],
}

impl Default for PassConstants {
    fn default() -> Self {
        let identity = shader_matrix(&Mat4::identity());
        Self {
            view: identity,
            inv_view: identity,
            proj: identity,
            inv_proj: identity,
            view_proj: identity,
            inv_view_proj: identity,
            ..Zeroable::zeroed()
        }
    }
}

impl PassConstants {
    /// Camera matrices and viewport. Non-invertible matrices fall back to identity.
    pub fn from_camera(view: &Mat4, proj: &Mat4, eye: Vec3, viewport: (u32, u32), near: f32, far: f32) -> Self {
        let view_proj = proj * view;
        let invert = |m: &Mat4| m.try_inverse().unwrap_or_else(Mat4::identity);
        let (width, height) = (viewport.0 as f32, viewport.1 as f32);

        Self {
            view: shader_matrix(view),
            inv_view: shader_matrix(&invert(view)),
            proj: shader_matrix(proj),
            inv_proj: shader_matrix(&invert(proj)),
            view_proj: shader_matrix(&view_proj),
            inv_view_proj: shader_matrix(&invert(&view_proj)),
            eye_position: eye.into(),
            render_target_size: [width, height],
            inv_render_target_size: [1.0 / width, 1.0 / height],
            near_z: near,
            far_z: far,
            ..Self::default()
        }
    }

    /// Set frame timing
    pub fn with_time(mut self, total_time: f32, delta_time: f32) -> Self {
        self.total_time = total_time;
        self.delta_time = delta_time;
        self
    }

    /// Set the ambient term
    pub fn with_ambient(mut self, ambient: Vec4) -> Self {
        self.ambient_light = ambient.into();
        self
    }

    /// Copy up to [`MAX_LIGHTS`] lights; the rest are switched off
    pub fn with_lights(mut self, lights: &[Light]) -> Self {
        let off = Light {
            strength: [0.0; 3],
            ..Light::default()
        };
        self.lights = [off; MAX_LIGHTS];
        if lights.len() > MAX_LIGHTS {
            log::warn!("{} lights supplied, only the first {} are used", lights.len(), MAX_LIGHTS);
        }
        for (slot, light) in self.lights.iter_mut().zip(lights) {
            *slot = *light;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;

    #[test]
    fn test_layouts_have_no_hidden_padding() {
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 128);
        assert_eq!(std::mem::size_of::<MaterialConstants>(), 96);
        assert_eq!(std::mem::size_of::<Light>(), 48);
        assert_eq!(std::mem::size_of::<PassConstants>(), 384 + 64 + 48 * MAX_LIGHTS);
    }

    #[test]
    fn test_object_constants_use_shader_layout() {
        let world = Mat4::translation(4.0, 5.0, 6.0);
        let constants = ObjectConstants::new(&world, &Mat4::identity());

        assert_eq!(constants.world[0][3], 4.0);
        assert_eq!(constants.world[1][3], 5.0);
        assert_eq!(constants.world[2][3], 6.0);
    }

    #[test]
    fn test_pass_constants_viewport_and_lights() {
        let pass = PassConstants::from_camera(
            &Mat4::identity(),
            &Mat4::identity(),
            Vec3::new(1.0, 2.0, 3.0),
            (800, 600),
            1.0,
            1000.0,
        )
        .with_lights(&[Light::directional(Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.3, 0.3, 0.5))]);

        assert_eq!(pass.render_target_size, [800.0, 600.0]);
        assert_eq!(pass.inv_render_target_size, [1.0 / 800.0, 1.0 / 600.0]);
        assert_eq!(pass.eye_position, [1.0, 2.0, 3.0]);
        assert_eq!(pass.lights[0].strength, [0.3, 0.3, 0.5]);
        assert_eq!(pass.lights[1].strength, [0.0, 0.0, 0.0]);
    }
}
