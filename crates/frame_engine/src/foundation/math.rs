//! Math utilities and types
//!
//! Provides the fundamental math types used by the frame engine. CPU-side
//! matrices follow the `nalgebra` column-vector convention (`p' = M * p`).
//! Everything that lands in a GPU-visible buffer goes through
//! [`shader_matrix`], which is the single place the upload layout is decided.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Matrix layout written into constant buffers
pub type ShaderMatrix = [[f32; 4]; 4];

/// Convert a CPU matrix into the layout the shaders read.
///
/// The rows of `m` are stored one after another. Shaders multiply row vectors
/// (`mul(v, M)`) against a column-major packed matrix, so this is the
/// transposed layout relative to `nalgebra`'s own column-major storage.
pub fn shader_matrix(m: &Mat4) -> ShaderMatrix {
    m.transpose().into()
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Pi / 4
    pub const QUARTER_PI: f32 = PI * 0.25;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Wrap a texture coordinate offset back into `[0, 1)`
    pub fn wrap_unit(value: f32) -> f32 {
        if value >= 1.0 {
            value - 1.0
        } else {
            value
        }
    }
}

/// Extension trait for Mat4 with the transform builders the scenes need
pub trait Mat4Ext {
    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a non-uniform scaling matrix
    fn scaling(x: f32, y: f32, z: f32) -> Mat4;

    /// Create a translation matrix
    fn translation(x: f32, y: f32, z: f32) -> Mat4;

    /// Left-handed perspective projection with depth mapped to `[0, 1]`
    fn perspective_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Left-handed view matrix looking from `eye` towards `target`
    fn view_lh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Compose transforms in the order they are applied to a point.
    ///
    /// `compose(&[scale, rotate, translate])` scales first, then rotates, then
    /// translates, matching the way scene code reads left to right.
    fn compose(steps: &[Mat4]) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn scaling(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_nonuniform_scaling(&Vec3::new(x, y, z))
    }

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    fn perspective_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let y_scale = 1.0 / (fov_y * 0.5).tan();
        let x_scale = y_scale / aspect;
        let range = far / (far - near);

        let mut result = Mat4::zeros();
        result[(0, 0)] = x_scale;
        result[(1, 1)] = y_scale;
        result[(2, 2)] = range;
        result[(2, 3)] = -near * range;
        result[(3, 2)] = 1.0;
        result
    }

    fn view_lh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = up.cross(&forward).normalize();
        let camera_up = forward.cross(&right);

        Mat4::new(
            right.x, right.y, right.z, -right.dot(&eye),
            camera_up.x, camera_up.y, camera_up.z, -camera_up.dot(&eye),
            forward.x, forward.y, forward.z, -forward.dot(&eye),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn compose(steps: &[Mat4]) -> Mat4 {
        steps.iter().fold(Mat4::identity(), |acc, step| step * acc)
    }
}
