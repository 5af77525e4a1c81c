//! Wave simulation
//!
//! Solves the damped 2D wave equation on a regular grid with an explicit
//! finite-difference scheme. Heights live in two buffers (previous and
//! current solution) that swap every simulation step. Boundary cells are held
//! at zero.

use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::render::geometry::Vertex;

/// Errors from wave grid operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaveError {
    /// Disturbance too close to the boundary
    #[error("Cell ({row}, {col}) is not an interior cell of a {rows}x{cols} grid")]
    NotInterior {
        /// Requested row
        row: usize,
        /// Requested column
        col: usize,
        /// Grid rows
        rows: usize,
        /// Grid columns
        cols: usize,
    },

    /// The grid cannot be indexed with 16-bit indices
    #[error("{0} vertices do not fit 16-bit indices")]
    TooManyVertices(usize),
}

/// Height-field wave simulation
#[derive(Debug, Clone)]
pub struct Waves {
    rows: usize,
    cols: usize,
    spatial_step: f32,
    time_step: f32,
    k1: f32,
    k2: f32,
    k3: f32,
    accumulated: f32,
    prev: Vec<Vec3>,
    curr: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
}

impl Waves {
    /// Flat `rows` x `cols` grid with cell size `dx`, simulated at fixed step
    /// `dt` with wave `speed` and `damping`
    pub fn new(rows: usize, cols: usize, dx: f32, dt: f32, speed: f32, damping: f32) -> Self {
        let d = damping * dt + 2.0;
        let e = (speed * speed) * (dt * dt) / (dx * dx);

        let half_width = (cols as f32 - 1.0) * dx * 0.5;
        let half_depth = (rows as f32 - 1.0) * dx * 0.5;
        let mut grid = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            let z = half_depth - i as f32 * dx;
            for j in 0..cols {
                let x = -half_width + j as f32 * dx;
                grid.push(Vec3::new(x, 0.0, z));
            }
        }

        Self {
            rows,
            cols,
            spatial_step: dx,
            time_step: dt,
            k1: (damping * dt - 2.0) / d,
            k2: (4.0 - 8.0 * e) / d,
            k3: (2.0 * e) / d,
            accumulated: 0.0,
            prev: grid.clone(),
            curr: grid,
            normals: vec![Vec3::y(); rows * cols],
            tangents: vec![Vec3::x(); rows * cols],
        }
    }

    /// Grid rows
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Grid columns
    pub fn column_count(&self) -> usize {
        self.cols
    }

    /// Number of grid vertices
    pub fn vertex_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Number of triangles in the grid mesh
    pub fn triangle_count(&self) -> usize {
        self.rows.saturating_sub(1) * self.cols.saturating_sub(1) * 2
    }

    /// Extent along x
    pub fn width(&self) -> f32 {
        self.cols as f32 * self.spatial_step
    }

    /// Extent along z
    pub fn depth(&self) -> f32 {
        self.rows as f32 * self.spatial_step
    }

    /// Position of vertex `index`
    pub fn position(&self, index: usize) -> Vec3 {
        self.curr[index]
    }

    /// Normal of vertex `index`
    pub fn normal(&self, index: usize) -> Vec3 {
        self.normals[index]
    }

    /// Tangent along +x of vertex `index`
    pub fn tangent_x(&self, index: usize) -> Vec3 {
        self.tangents[index]
    }

    /// Accumulate `dt` and run a simulation step once a full time step has
    /// passed. Returns whether a step ran.
    pub fn update(&mut self, dt: f32) -> bool {
        self.accumulated += dt;
        if self.accumulated < self.time_step {
            return false;
        }

        let n = self.cols;
        for i in 1..self.rows.saturating_sub(1) {
            for j in 1..n.saturating_sub(1) {
                let neighbours = self.curr[(i + 1) * n + j].y
                    + self.curr[(i - 1) * n + j].y
                    + self.curr[i * n + j + 1].y
                    + self.curr[i * n + j - 1].y;
                let next = self.k1 * self.prev[i * n + j].y + self.k2 * self.curr[i * n + j].y + self.k3 * neighbours;
                self.prev[i * n + j].y = next;
            }
        }

        // The freshly computed solution becomes current
        std::mem::swap(&mut self.prev, &mut self.curr);
        self.accumulated = 0.0;
        self.update_normals();
        true
    }

    fn update_normals(&mut self) {
        let n = self.cols;
        let two_dx = 2.0 * self.spatial_step;
        for i in 1..self.rows.saturating_sub(1) {
            for j in 1..n.saturating_sub(1) {
                let left = self.curr[i * n + j - 1].y;
                let right = self.curr[i * n + j + 1].y;
                let top = self.curr[(i - 1) * n + j].y;
                let bottom = self.curr[(i + 1) * n + j].y;

                self.normals[i * n + j] = Vec3::new(left - right, two_dx, bottom - top).normalize();
                self.tangents[i * n + j] = Vec3::new(two_dx, right - left, 0.0).normalize();
            }
        }
    }

    /// Raise cell `(row, col)` by `magnitude` and its four neighbours by half
    /// that. Cells within two of the boundary are rejected.
    pub fn disturb(&mut self, row: usize, col: usize, magnitude: f32) -> Result<(), WaveError> {
        if row <= 1 || row + 2 >= self.rows || col <= 1 || col + 2 >= self.cols {
            return Err(WaveError::NotInterior {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }

        let n = self.cols;
        let half = 0.5 * magnitude;
        self.curr[row * n + col].y += magnitude;
        self.curr[row * n + col + 1].y += half;
        self.curr[row * n + col - 1].y += half;
        self.curr[(row + 1) * n + col].y += half;
        self.curr[(row - 1) * n + col].y += half;
        Ok(())
    }

    /// Current surface as vertices. Texture coordinates map the grid's
    /// `[-w/2, w/2]` extent onto `[0, 1]`.
    pub fn vertices(&self) -> Vec<Vertex> {
        let (width, depth) = (self.width(), self.depth());
        self.curr
            .iter()
            .zip(&self.normals)
            .map(|(position, normal)| {
                Vertex::new(
                    (*position).into(),
                    (*normal).into(),
                    [0.5 + position.x / width, 0.5 - position.z / depth],
                )
            })
            .collect()
    }

    /// Triangle-list indices of the grid
    pub fn indices(&self) -> Result<Vec<u16>, WaveError> {
        let count = self.vertex_count();
        if count > usize::from(u16::MAX) + 1 {
            return Err(WaveError::TooManyVertices(count));
        }

        let n = self.cols;
        let mut indices = Vec::with_capacity(self.triangle_count() * 3);
        for i in 0..self.rows.saturating_sub(1) {
            for j in 0..n.saturating_sub(1) {
                let a = (i * n + j) as u16;
                let b = (i * n + j + 1) as u16;
                let c = ((i + 1) * n + j) as u16;
                let d = ((i + 1) * n + j + 1) as u16;
                indices.extend_from_slice(&[a, b, c, c, b, d]);
            }
        }
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_grid_layout() {
        let waves = Waves::new(4, 5, 2.0, 0.03, 4.0, 0.2);

        assert_eq!(waves.vertex_count(), 20);
        assert_eq!(waves.triangle_count(), 24);
        assert_eq!(waves.indices().unwrap().len(), 72);
        assert_relative_eq!(waves.position(0), Vec3::new(-4.0, 0.0, 3.0));
        assert_relative_eq!(waves.position(19), Vec3::new(4.0, 0.0, -3.0));
        assert_eq!(waves.width(), 10.0);
        assert_eq!(waves.depth(), 8.0);
    }

    #[test]
    fn test_update_waits_for_full_time_step() {
        let mut waves = Waves::new(10, 10, 1.0, 0.03, 4.0, 0.2);

        assert!(!waves.update(0.01));
        assert!(!waves.update(0.01));
        assert!(waves.update(0.015));
        assert!(!waves.update(0.01));
    }

    #[test]
    fn test_disturbance_spreads_and_decays() {
        let mut waves = Waves::new(20, 20, 1.0, 0.03, 4.0, 0.2);
        waves.disturb(10, 10, 1.0).unwrap();
        let centre = 10 * 20 + 10;
        assert_eq!(waves.position(centre).y, 1.0);
        assert_eq!(waves.position(centre + 1).y, 0.5);

        for _ in 0..3 {
            waves.update(0.03);
        }
        assert!(waves.position(centre + 3).y.abs() > 0.0);

        for _ in 0..2000 {
            waves.update(0.03);
        }
        let peak = (0..waves.vertex_count())
            .map(|i| waves.position(i).y.abs())
            .fold(0.0, f32::max);
        assert!(peak < 0.05, "peak height {} did not decay", peak);
    }

    #[test]
    fn test_boundary_disturbance_is_rejected() {
        let mut waves = Waves::new(10, 10, 1.0, 0.03, 4.0, 0.2);

        assert!(waves.disturb(1, 5, 1.0).is_err());
        assert!(waves.disturb(5, 8, 1.0).is_err());
        assert!(waves.disturb(2, 7, 1.0).is_ok());
        assert_eq!(
            waves.disturb(0, 0, 1.0),
            Err(WaveError::NotInterior { row: 0, col: 0, rows: 10, cols: 10 })
        );
    }

    #[test]
    fn test_normals_tilt_away_from_crest() {
        let mut waves = Waves::new(12, 12, 1.0, 0.03, 4.0, 0.2);
        waves.disturb(6, 6, 1.0).unwrap();
        waves.update(0.03);

        // Right of the crest the surface slopes down towards +x
        let normal = waves.normal(6 * 12 + 7);
        assert!(normal.x > 0.0);
        assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_vertex_tex_coords_span_unit_square() {
        let waves = Waves::new(3, 3, 1.0, 0.03, 4.0, 0.2);
        let vertices = waves.vertices();

        assert_eq!(vertices.len(), 9);
        assert_relative_eq!(vertices[4].tex_coord[0], 0.5);
        assert_relative_eq!(vertices[4].tex_coord[1], 0.5);
        assert!(vertices[0].tex_coord[0] < vertices[2].tex_coord[0]);
        assert!(vertices[0].tex_coord[1] < vertices[6].tex_coord[1]);
    }

    #[test]
    fn test_large_grid_still_fits_u16() {
        let waves = Waves::new(200, 200, 2.0, 0.03, 4.0, 0.2);
        assert_eq!(waves.indices().unwrap().len(), 199 * 199 * 6);

        let too_big = Waves::new(300, 300, 1.0, 0.03, 4.0, 0.2);
        assert_eq!(too_big.indices(), Err(WaveError::TooManyVertices(90_000)));
    }
}
