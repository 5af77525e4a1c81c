//! Materials and textures
//!
//! A material is a small block of shading parameters plus a reference to its
//! diffuse texture. Textures are registered as descriptor heap slots only;
//! decoding image files happens outside this crate.

use crate::foundation::math::{shader_matrix, Mat4, Vec3, Vec4};
use crate::render::constants::MaterialConstants;
use crate::render::dirty::DirtyCounter;
use crate::render::scene::TextureId;

/// A shader-visible texture slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Registry name
    pub name: String,
    /// Index of the texture's SRV in the descriptor heap
    pub descriptor_index: u32,
}

/// Shading parameters shared by render items.
///
/// Fields are read-only outside the crate; changes go through
/// [`SceneContext::update_material`](crate::render::scene::SceneContext::update_material)
/// so every change restarts dirty propagation.
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    cb_index: usize,
    params: MaterialDesc,
    pub(crate) dirty: DirtyCounter,
}

impl Material {
    pub(crate) fn new(name: String, cb_index: usize, params: MaterialDesc, frames: usize) -> Self {
        Self {
            name,
            cb_index,
            params,
            dirty: DirtyCounter::new(frames),
        }
    }

    /// Registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element of the material constant buffer this material occupies
    pub fn cb_index(&self) -> usize {
        self.cb_index
    }

    /// Diffuse texture
    pub fn diffuse_texture(&self) -> TextureId {
        self.params.diffuse_texture
    }

    /// Texture coordinate transform
    pub fn mat_transform(&self) -> &Mat4 {
        &self.params.mat_transform
    }

    /// Current shading parameters
    pub fn params(&self) -> &MaterialDesc {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut MaterialDesc {
        &mut self.params
    }

    /// Shading parameters ready for upload
    pub fn constants(&self) -> MaterialConstants {
        MaterialConstants {
            diffuse_albedo: self.params.diffuse_albedo.into(),
            fresnel_r0: self.params.fresnel_r0.into(),
            roughness: self.params.roughness,
            mat_transform: shader_matrix(&self.params.mat_transform),
        }
    }

    /// Frame resources still holding stale constants
    pub fn dirty_frames(&self) -> usize {
        self.dirty.remaining()
    }
}

/// Parameters of a material, given at registration and edited through
/// [`SceneContext::update_material`](crate::render::scene::SceneContext::update_material)
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDesc {
    /// Diffuse texture
    pub diffuse_texture: TextureId,
    /// Diffuse albedo (RGBA)
    pub diffuse_albedo: Vec4,
    /// Fresnel reflectance at normal incidence
    pub fresnel_r0: Vec3,
    /// Surface roughness
    pub roughness: f32,
    /// Texture coordinate transform
    pub mat_transform: Mat4,
}

impl MaterialDesc {
    /// White, fairly rough dielectric using `texture`
    pub fn new(texture: TextureId) -> Self {
        Self {
            diffuse_texture: texture,
            diffuse_albedo: Vec4::new(1.0, 1.0, 1.0, 1.0),
            fresnel_r0: Vec3::new(0.01, 0.01, 0.01),
            roughness: 0.125,
            mat_transform: Mat4::identity(),
        }
    }

    /// Set the diffuse albedo
    pub fn with_albedo(mut self, albedo: Vec4) -> Self {
        self.diffuse_albedo = albedo;
        self
    }

    /// Set Fresnel R0
    pub fn with_fresnel(mut self, fresnel_r0: Vec3) -> Self {
        self.fresnel_r0 = fresnel_r0;
        self
    }

    /// Set roughness
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Set the texture coordinate transform
    pub fn with_mat_transform(mut self, mat_transform: Mat4) -> Self {
        self.mat_transform = mat_transform;
        self
    }
}
