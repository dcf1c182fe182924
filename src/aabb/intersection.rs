use nalgebra::Point;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::{BHValue, ContainsPoint, RayHit};
use crate::ray::Ray;

/// A trait implemented by things that may or may not intersect an AABB and, by extension,
/// things that can be used to traverse a BVH.
pub trait IntersectsAabb<T: BHValue, const D: usize> {
    /// Returns whether this object intersects an [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::{Aabb, IntersectsAabb};
    /// use nalgebra::Point3;
    ///
    /// struct XyPlane;
    ///
    /// impl IntersectsAabb<f32, 3> for XyPlane {
    ///     fn intersects_aabb(&self, aabb: &Aabb<f32, 3>) -> bool {
    ///         aabb.min[2] <= 0.0 && aabb.max[2] >= 0.0
    ///     }
    /// }
    ///
    /// let xy_plane = XyPlane;
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert!(xy_plane.intersects_aabb(&aabb));
    /// ```
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool;
}

impl<T: BHValue, const D: usize> IntersectsAabb<T, D> for Aabb<T, D> {
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        for i in 0..D {
            if self.max[i] < aabb.min[i] || aabb.max[i] < self.min[i] {
                return false;
            }
        }
        true
    }
}

impl<T: BHValue, const D: usize> IntersectsAabb<T, D> for Point<T, D> {
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        aabb.contains(self)
    }
}

/// An [`Aabb`] used as a primitive is hit where the ray first crosses its surface. If the
/// ray starts inside the box, that is where it leaves it.
impl<T: BHValue, const D: usize> RayHit<T, D> for Aabb<T, D> {
    fn ray_hit(&self, ray: &Ray<T, D>) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let (entry, exit) = ray.intersection_interval(self)?;
        if entry >= T::zero() {
            Some(entry)
        } else {
            Some(exit)
        }
    }
}

impl<T: BHValue, const D: usize> ContainsPoint<T, D> for Aabb<T, D> {
    fn contains_point(&self, point: &Point<T, D>) -> bool {
        self.contains(point)
    }
}
