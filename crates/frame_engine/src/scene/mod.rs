//! Scene-side helpers that drive the renderer
//!
//! The renderer only knows about render items, materials and layers. This
//! module holds the pieces a demo needs on top of that: a camera that
//! produces pass constants, the wave simulation feeding the dynamic vertex
//! buffer, procedural meshes, the per-frame animations, and camera moves
//! that stop short of opaque geometry.

pub mod animation;
pub mod camera;
pub mod collision;
pub mod shapes;
pub mod waves;

pub use animation::{scroll_material, Spin, WATER_SCROLL};
pub use camera::Camera;
pub use collision::{try_move, CameraMove};
pub use shapes::MeshData;
pub use waves::{WaveError, Waves};
