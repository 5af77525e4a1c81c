//! Axis-aligned bounding boxes
//!
//! Boxes are computed once per submesh from its vertex positions and carried
//! into world space by the owning render item's transform. The ray test is
//! the slab method; it reports the entry distance, or zero when the origin
//! is already inside.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from its corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box centred at `center` with half-sizes `extents`
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point. `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |bounds, p| Self {
            min: bounds.min.inf(&p),
            max: bounds.max.sup(&p),
        }))
    }

    /// Centre point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-sizes
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Whether `point` lies inside or on the box
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Box enclosing this one after `transform` (all eight corners transformed)
    pub fn transformed(&self, transform: &Mat4) -> Self {
        let corners = (0..8).map(|i| {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            transform.transform_point(&corner).coords
        });
        // Eight corners are always present
        Self::from_points(corners).unwrap_or(*self)
    }

    /// Distance along `direction` to where the ray enters the box.
    ///
    /// `direction` need not be normalized; the distance is in units of its
    /// length. Returns `Some(0.0)` when `origin` is inside.
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let (o, d) = (origin[axis], direction[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d == 0.0 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let (t1, t2) = ((lo - o) * inv, (hi - o) * inv);
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_from_points() {
        let bounds = Aabb::from_points([
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-3.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
        ])
        .unwrap();

        assert_eq!(bounds.min, Vec3::new(-3.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 4.0, 2.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_transformed_follows_scale_and_translation() {
        let world = Mat4::compose(&[Mat4::scaling(2.0, 4.0, 2.0), Mat4::translation(25.0, 7.5, 0.0)]);
        let bounds = unit_box().transformed(&world);

        assert_relative_eq!(bounds.center(), Vec3::new(25.0, 7.5, 0.0), epsilon = 1e-5);
        assert_relative_eq!(bounds.extents(), Vec3::new(2.0, 4.0, 2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_transformed_rotation_grows_box() {
        let bounds = unit_box().transformed(&Mat4::rotation_y(std::f32::consts::FRAC_PI_4));

        assert_relative_eq!(bounds.extents().x, std::f32::consts::SQRT_2, epsilon = 1e-5);
        assert_relative_eq!(bounds.extents().y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_entry_distance() {
        let bounds = unit_box();

        let hit = bounds.intersect_ray(Vec3::new(0.0, 0.0, -5.0), Vec3::z()).unwrap();
        assert_relative_eq!(hit, 4.0);
        assert!(bounds.intersect_ray(Vec3::new(0.0, 0.0, -5.0), -Vec3::z()).is_none());
        assert!(bounds.intersect_ray(Vec3::new(0.0, 3.0, -5.0), Vec3::z()).is_none());
    }

    #[test]
    fn test_ray_from_inside_hits_at_zero() {
        assert_eq!(unit_box().intersect_ray(Vec3::new(0.5, 0.0, 0.0), Vec3::x()), Some(0.0));
        assert!(unit_box().contains_point(Vec3::new(0.5, 0.0, 0.0)));
    }
}
