//! Procedural meshes for the demo scenes
//!
//! Every generator returns [`MeshData`] with 16-bit indices, ready for
//! [`MeshGeometry::upload`]. Meshes are centred on the origin and wound
//! clockwise when seen from outside (the left-handed front face).

use crate::foundation::bounds::Aabb;
use crate::foundation::math::{constants::PI, Vec3};
use crate::render::backend::GraphicsDevice;
use crate::render::error::RenderResult;
use crate::render::geometry::{MeshGeometry, SpriteVertex, Vertex};

/// CPU-side vertices and indices of a generated mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Triangle-list indices
    pub indices: Vec<u16>,
}

impl MeshData {
    /// Upload as a static single-submesh geometry. The submesh carries the
    /// bounds of the vertices.
    pub fn upload(&self, device: &mut dyn GraphicsDevice, name: &str) -> RenderResult<MeshGeometry> {
        let mut mesh = MeshGeometry::upload(device, name, &self.vertices, &self.indices)?;
        if let Some(bounds) = self.bounds() {
            mesh.set_bounds(name, bounds);
        }
        Ok(mesh)
    }

    /// Object-space bounds of the vertices
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, tex_coord: [f32; 2]) -> u16 {
        let index = self.vertices.len() as u16;
        self.vertices.push(Vertex::new(position.into(), normal.into(), tex_coord));
        index
    }
}

/// Axis-aligned box with one quad per face, so every face has its own
/// normals and a full `[0, 1]` texture.
pub fn cuboid(width: f32, height: f32, depth: f32) -> MeshData {
    let (w, h, d) = (width * 0.5, height * 0.5, depth * 0.5);
    let faces = [
        // Front (-z)
        ([[-w, -h, -d], [-w, h, -d], [w, h, -d], [w, -h, -d]], [0.0, 0.0, -1.0]),
        // Back (+z)
        ([[w, -h, d], [w, h, d], [-w, h, d], [-w, -h, d]], [0.0, 0.0, 1.0]),
        // Top
        ([[-w, h, -d], [-w, h, d], [w, h, d], [w, h, -d]], [0.0, 1.0, 0.0]),
        // Bottom
        ([[-w, -h, d], [-w, -h, -d], [w, -h, -d], [w, -h, d]], [0.0, -1.0, 0.0]),
        // Left
        ([[-w, -h, d], [-w, h, d], [-w, h, -d], [-w, -h, -d]], [-1.0, 0.0, 0.0]),
        // Right
        ([[w, -h, -d], [w, h, -d], [w, h, d], [w, -h, d]], [1.0, 0.0, 0.0]),
    ];
    let corners_uv = [[0.0, 1.0], [0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];

    let mut mesh = MeshData::default();
    for (corners, normal) in faces {
        let base = mesh.vertices.len() as u16;
        for (corner, uv) in corners.iter().zip(corners_uv) {
            mesh.vertices.push(Vertex::new(*corner, normal, uv));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Flat `rows` x `cols` grid in the XZ plane
pub fn grid(width: f32, depth: f32, rows: u16, cols: u16) -> MeshData {
    let dx = width / (cols.max(2) - 1) as f32;
    let dz = depth / (rows.max(2) - 1) as f32;
    let du = 1.0 / (cols.max(2) - 1) as f32;
    let dv = 1.0 / (rows.max(2) - 1) as f32;

    let mut mesh = MeshData::default();
    for i in 0..rows {
        let z = depth * 0.5 - i as f32 * dz;
        for j in 0..cols {
            let x = -width * 0.5 + j as f32 * dx;
            mesh.push_vertex(Vec3::new(x, 0.0, z), Vec3::y(), [j as f32 * du, i as f32 * dv]);
        }
    }

    for i in 0..rows.saturating_sub(1) {
        for j in 0..cols.saturating_sub(1) {
            let a = i * cols + j;
            let b = a + 1;
            let c = a + cols;
            let d = c + 1;
            mesh.indices.extend_from_slice(&[a, b, c, c, b, d]);
        }
    }
    mesh
}

/// Height of the rolling terrain at `(x, z)`
pub fn hills_height(x: f32, z: f32) -> f32 {
    0.3 * (z * (0.1 * x).sin() + x * (0.1 * z).cos())
}

/// Unit normal of [`hills_height`] at `(x, z)`
pub fn hills_normal(x: f32, z: f32) -> Vec3 {
    Vec3::new(
        -0.03 * z * (0.1 * x).cos() - 0.3 * (0.1 * z).cos(),
        1.0,
        -0.3 * (0.1 * x).sin() + 0.03 * x * (0.1 * z).sin(),
    )
    .normalize()
}

/// A grid displaced into rolling hills
pub fn hills(width: f32, depth: f32, rows: u16, cols: u16) -> MeshData {
    let mut mesh = grid(width, depth, rows, cols);
    for vertex in &mut mesh.vertices {
        let [x, _, z] = vertex.position;
        vertex.position[1] = hills_height(x, z);
        vertex.normal = hills_normal(x, z).into();
    }
    mesh
}

/// Capped cylinder (or truncated cone) standing on y = -height/2
pub fn cylinder(bottom_radius: f32, top_radius: f32, height: f32, slices: u16, stacks: u16) -> MeshData {
    let slices = slices.max(3);
    let stacks = stacks.max(1);
    let stack_height = height / stacks as f32;
    let radius_step = (top_radius - bottom_radius) / stacks as f32;
    let d_theta = 2.0 * PI / slices as f32;

    let mut mesh = MeshData::default();
    // Side rings repeat the first vertex so the seam gets its own texture u
    for i in 0..=stacks {
        let y = -0.5 * height + i as f32 * stack_height;
        let r = bottom_radius + i as f32 * radius_step;
        for j in 0..=slices {
            let (s, c) = (j as f32 * d_theta).sin_cos();
            let tangent = Vec3::new(-s, 0.0, c);
            let bitangent = Vec3::new(bottom_radius - top_radius, -height, 0.0);
            let bitangent = Vec3::new(bitangent.x * c, bitangent.y, bitangent.x * s);
            let normal = tangent.cross(&bitangent).normalize();
            mesh.push_vertex(
                Vec3::new(r * c, y, r * s),
                normal,
                [j as f32 / slices as f32, 1.0 - i as f32 / stacks as f32],
            );
        }
    }

    let ring = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            mesh.indices.extend_from_slice(&[
                i * ring + j,
                (i + 1) * ring + j,
                (i + 1) * ring + j + 1,
                i * ring + j,
                (i + 1) * ring + j + 1,
                i * ring + j + 1,
            ]);
        }
    }

    // A cone's apex needs no cap
    if top_radius > 0.0 {
        cylinder_cap(&mut mesh, top_radius, 0.5 * height, slices, true);
    }
    if bottom_radius > 0.0 {
        cylinder_cap(&mut mesh, bottom_radius, -0.5 * height, slices, false);
    }
    mesh
}

fn cylinder_cap(mesh: &mut MeshData, radius: f32, y: f32, slices: u16, top: bool) {
    let normal = if top { Vec3::y() } else { -Vec3::y() };
    let d_theta = 2.0 * PI / slices as f32;
    let base = mesh.vertices.len() as u16;

    for j in 0..=slices {
        let (s, c) = (j as f32 * d_theta).sin_cos();
        let (x, z) = (radius * c, radius * s);
        mesh.push_vertex(Vec3::new(x, y, z), normal, [x / radius * 0.5 + 0.5, z / radius * 0.5 + 0.5]);
    }
    let centre = mesh.push_vertex(Vec3::new(0.0, y, 0.0), normal, [0.5, 0.5]);

    for j in 0..slices {
        if top {
            mesh.indices.extend_from_slice(&[centre, base + j + 1, base + j]);
        } else {
            mesh.indices.extend_from_slice(&[centre, base + j, base + j + 1]);
        }
    }
}

/// Faceted gem: a crown ring at y = 0 between a short top apex and a long
/// bottom apex. Each facet has its own flat normal.
pub fn diamond(radius: f32, facets: u16) -> MeshData {
    let facets = facets.max(3);
    let top = Vec3::new(0.0, 0.5 * radius, 0.0);
    let bottom = Vec3::new(0.0, -1.5 * radius, 0.0);
    let d_theta = 2.0 * PI / facets as f32;
    let ring = |j: u16| {
        let (s, c) = (j as f32 * d_theta).sin_cos();
        Vec3::new(radius * c, 0.0, radius * s)
    };

    let mut mesh = MeshData::default();
    let mut facet = |a: Vec3, b: Vec3, c: Vec3| {
        let normal = (b - a).cross(&(c - a)).normalize();
        let i0 = mesh.push_vertex(a, normal, [0.5, 0.0]);
        let i1 = mesh.push_vertex(b, normal, [0.0, 1.0]);
        let i2 = mesh.push_vertex(c, normal, [1.0, 1.0]);
        mesh.indices.extend_from_slice(&[i0, i1, i2]);
    };

    for j in 0..facets {
        let (p0, p1) = (ring(j), ring(j + 1));
        facet(top, p1, p0);
        facet(bottom, p0, p1);
    }
    mesh
}

/// Tree billboards around the castle grounds
pub fn tree_sprites() -> (Vec<SpriteVertex>, Vec<u16>) {
    const POSITIONS: [[f32; 2]; 14] = [
        [-140.0, -140.0],
        [140.0, -140.0],
        [140.0, 140.0],
        [-140.0, 140.0],
        [-140.0, 30.0],
        [140.0, 30.0],
        [-140.0, -60.0],
        [140.0, -60.0],
        [20.0, 110.0],
        [-20.0, 120.0],
        [40.0, 120.0],
        [-40.0, 110.0],
        [60.0, 100.0],
        [-60.0, 120.0],
    ];

    let vertices = POSITIONS
        .iter()
        .map(|[x, z]| SpriteVertex {
            position: [*x, 10.5, *z],
            size: [20.0, 20.0],
        })
        .collect();
    let indices = (0..POSITIONS.len() as u16).collect();
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face_normal(mesh: &MeshData, triangle: usize) -> Vec3 {
        let p = |k: usize| Vec3::from(mesh.vertices[mesh.indices[triangle * 3 + k] as usize].position);
        let (a, b, c) = (p(0), p(1), p(2));
        (b - a).cross(&(c - a))
    }

    #[test]
    fn test_cuboid_faces_point_outwards() {
        let mesh = cuboid(2.0, 4.0, 6.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);

        for triangle in 0..12 {
            let winding = face_normal(&mesh, triangle).normalize();
            let normal = Vec3::from(mesh.vertices[mesh.indices[triangle * 3] as usize].normal);
            assert_relative_eq!(winding, normal, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_cuboid_bounds_match_dimensions() {
        let bounds = cuboid(2.0, 4.0, 6.0).bounds().unwrap();

        assert_relative_eq!(bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_relative_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
        assert!(MeshData::default().bounds().is_none());
    }

    #[test]
    fn test_grid_extent_and_indices() {
        let mesh = grid(10.0, 20.0, 3, 5);
        assert_eq!(mesh.vertices.len(), 15);
        assert_eq!(mesh.indices.len(), 2 * 4 * 6);
        assert_eq!(mesh.vertices[0].position, [-5.0, 0.0, 10.0]);
        assert_eq!(mesh.vertices[14].position, [5.0, 0.0, -10.0]);
        assert_eq!(mesh.vertices[14].tex_coord, [1.0, 1.0]);
    }

    #[test]
    fn test_hills_normal_matches_slope() {
        let (x, z) = (12.0, -7.0);
        let h = 1e-2;
        let dx = (hills_height(x + h, z) - hills_height(x - h, z)) / (2.0 * h);
        let dz = (hills_height(x, z + h) - hills_height(x, z - h)) / (2.0 * h);
        let expected = Vec3::new(-dx, 1.0, -dz).normalize();

        assert_relative_eq!(hills_normal(x, z), expected, epsilon = 1e-3);

        let terrain = hills(50.0, 50.0, 4, 4);
        let [vx, vy, vz] = terrain.vertices[5].position;
        assert_relative_eq!(vy, hills_height(vx, vz));
    }

    #[test]
    fn test_cylinder_counts_and_caps() {
        let mesh = cylinder(1.0, 0.5, 3.0, 8, 2);
        // Three side rings of nine, then two caps of nine plus a centre
        assert_eq!(mesh.vertices.len(), 3 * 9 + 2 * 10);
        assert_eq!(mesh.indices.len(), 2 * 8 * 6 + 2 * 8 * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));

        let top = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert_relative_eq!(top, 1.5);
    }

    #[test]
    fn test_cone_has_only_a_base_cap() {
        let mesh = cylinder(1.0, 0.0, 2.0, 6, 1);
        assert_eq!(mesh.vertices.len(), 2 * 7 + 8);
        assert!(mesh
            .vertices
            .iter()
            .all(|v| v.tex_coord.iter().all(|t| t.is_finite())));
    }

    #[test]
    fn test_diamond_facets_are_flat_shaded() {
        let mesh = diamond(1.0, 6);
        assert_eq!(mesh.indices.len(), 6 * 2 * 3);

        for triangle in 0..12 {
            let normal = Vec3::from(mesh.vertices[mesh.indices[triangle * 3] as usize].normal);
            let winding = face_normal(&mesh, triangle).normalize();
            assert_relative_eq!(winding, normal, epsilon = 1e-5);

            let corner = Vec3::from(mesh.vertices[mesh.indices[triangle * 3 + 1] as usize].position);
            assert!(normal.dot(&corner) > 0.0, "facet {} faces inwards", triangle);
        }
    }

    #[test]
    fn test_tree_sprites_are_point_list() {
        let (vertices, indices) = tree_sprites();
        assert_eq!(vertices.len(), 14);
        assert_eq!(indices, (0..14).collect::<Vec<u16>>());
        assert!(vertices.iter().all(|v| v.size == [20.0, 20.0]));
    }
}
