//! Mesh geometry and vertex formats
//!
//! Geometry is registered once at startup. A mesh owns one vertex buffer and
//! one index buffer and names the sub-ranges ("submeshes") that render items
//! draw. Meshes whose vertices are rewritten every frame (the wave grid) use
//! [`VertexSource::Dynamic`]: the draw pass binds the current frame
//! resource's dynamic vertex buffer instead of a fixed view.

// `derive(Pod)` expands to `unsafe impl`
#![allow(unsafe_code)]

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::foundation::bounds::Aabb;
use crate::render::backend::{GpuAddress, GraphicsDevice};
use crate::render::error::{RenderError, RenderResult};

/// Standard lit, textured vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, tex_coord }
    }
}

/// Point-sprite vertex expanded into a camera-facing quad by the geometry shader
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SpriteVertex {
    /// World-space centre of the sprite's base
    pub position: [f32; 3],
    /// Width and height of the quad
    pub size: [f32; 2],
}

/// Primitive assembly mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Independent triangles
    #[default]
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Independent points (billboard sprites)
    PointList,
    /// Independent lines
    LineList,
}

/// Index element width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

/// Vertex buffer binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferView {
    /// Start of the buffer
    pub address: GpuAddress,
    /// Total size in bytes
    pub size_in_bytes: u32,
    /// Bytes per vertex
    pub stride: u32,
}

/// Index buffer binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferView {
    /// Start of the buffer
    pub address: GpuAddress,
    /// Total size in bytes
    pub size_in_bytes: u32,
    /// Index width
    pub format: IndexFormat,
}

/// Draw arguments of a named sub-range of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubmeshGeometry {
    /// Number of indices to draw
    pub index_count: u32,
    /// First index in the index buffer
    pub start_index: u32,
    /// Value added to each index before fetching the vertex
    pub base_vertex: i32,
}

/// Where a mesh's vertices come from at draw time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexSource {
    /// Fixed buffer written once at load
    Static(VertexBufferView),
    /// The current frame resource's dynamic vertex buffer
    Dynamic,
}

/// A vertex/index buffer pair with named draw ranges
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    /// Registry name
    pub name: String,
    /// Vertex buffer binding
    pub vertex_source: VertexSource,
    /// Index buffer binding
    pub index_buffer: IndexBufferView,
    submeshes: HashMap<String, SubmeshGeometry>,
    bounds: HashMap<String, Aabb>,
}

impl MeshGeometry {
    /// Upload static vertices and 16-bit indices as a single-submesh mesh
    pub fn upload<V: Pod>(
        device: &mut dyn GraphicsDevice,
        name: impl Into<String>,
        vertices: &[V],
        indices: &[u16],
    ) -> RenderResult<Self> {
        let vertex_buffer = Self::upload_vertices(device, vertices)?;
        Self::with_vertex_source(device, name, VertexSource::Static(vertex_buffer), indices)
    }

    /// Create a mesh whose vertices live in the per-frame dynamic buffer
    pub fn dynamic(
        device: &mut dyn GraphicsDevice,
        name: impl Into<String>,
        indices: &[u16],
    ) -> RenderResult<Self> {
        Self::with_vertex_source(device, name, VertexSource::Dynamic, indices)
    }

    fn with_vertex_source(
        device: &mut dyn GraphicsDevice,
        name: impl Into<String>,
        vertex_source: VertexSource,
        indices: &[u16],
    ) -> RenderResult<Self> {
        let index_bytes = std::mem::size_of_val(indices) as u64;
        let address = device.allocate_upload_heap(index_bytes)?;
        let mesh = Self::new(
            name,
            vertex_source,
            IndexBufferView {
                address,
                size_in_bytes: index_bytes as u32,
                format: IndexFormat::U16,
            },
        );

        log::debug!("Uploaded geometry '{}' ({} indices)", mesh.name, indices.len());
        Ok(mesh)
    }

    /// Wrap buffers that already live on the device. The whole index buffer
    /// becomes a submesh named after the mesh.
    pub fn new(name: impl Into<String>, vertex_source: VertexSource, index_buffer: IndexBufferView) -> Self {
        let name = name.into();
        let index_size = match index_buffer.format {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        };

        let mut submeshes = HashMap::new();
        submeshes.insert(
            name.clone(),
            SubmeshGeometry {
                index_count: index_buffer.size_in_bytes / index_size,
                start_index: 0,
                base_vertex: 0,
            },
        );

        Self {
            name,
            vertex_source,
            index_buffer,
            submeshes,
            bounds: HashMap::new(),
        }
    }

    fn upload_vertices<V: Pod>(
        device: &mut dyn GraphicsDevice,
        vertices: &[V],
    ) -> RenderResult<VertexBufferView> {
        let byte_size = std::mem::size_of_val(vertices) as u64;
        let address = device.allocate_upload_heap(byte_size)?;
        Ok(VertexBufferView {
            address,
            size_in_bytes: byte_size as u32,
            stride: std::mem::size_of::<V>() as u32,
        })
    }

    /// Name an additional sub-range of the mesh
    pub fn add_submesh(&mut self, name: impl Into<String>, submesh: SubmeshGeometry) {
        self.submeshes.insert(name.into(), submesh);
    }

    /// Record the object-space bounds of a submesh
    pub fn set_bounds(&mut self, submesh: impl Into<String>, bounds: Aabb) {
        self.bounds.insert(submesh.into(), bounds);
    }

    /// Object-space bounds of a submesh, if known
    pub fn bounds(&self, submesh: &str) -> Option<Aabb> {
        self.bounds.get(submesh).copied()
    }

    /// Draw arguments of a named sub-range
    pub fn draw_args(&self, submesh: &str) -> RenderResult<SubmeshGeometry> {
        self.submeshes
            .get(submesh)
            .copied()
            .ok_or_else(|| RenderError::MissingResource {
                kind: "submesh",
                name: format!("{}/{}", self.name, submesh),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_view(count: u32) -> IndexBufferView {
        IndexBufferView {
            address: GpuAddress(0x2000),
            size_in_bytes: count * 2,
            format: IndexFormat::U16,
        }
    }

    #[test]
    fn test_whole_mesh_is_a_submesh() {
        let mesh = MeshGeometry::new("box", VertexSource::Dynamic, index_view(36));

        let args = mesh.draw_args("box").unwrap();
        assert_eq!(args.index_count, 36);
        assert_eq!(args.start_index, 0);
    }

    #[test]
    fn test_named_submeshes() {
        let mut mesh = MeshGeometry::new("shapes", VertexSource::Dynamic, index_view(60));
        mesh.add_submesh(
            "cylinder",
            SubmeshGeometry { index_count: 24, start_index: 36, base_vertex: 24 },
        );

        assert_eq!(mesh.draw_args("cylinder").unwrap().base_vertex, 24);
        assert!(mesh.bounds("cylinder").is_none());
        assert!(matches!(
            mesh.draw_args("sphere"),
            Err(RenderError::MissingResource { kind: "submesh", .. })
        ));
    }
}
