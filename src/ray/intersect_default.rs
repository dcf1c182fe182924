//! This file contains the generic slab test behind [`RayIntersection`].

use super::Ray;
use crate::aabb::Aabb;
use crate::bounding_hierarchy::BHValue;
use crate::utils::{fast_max, fast_min};

/// The [`RayIntersection`] trait computes the parametric interval in which a ray overlaps
/// an [`Aabb`], using the ray's cached inverse direction.
pub trait RayIntersection<T: BHValue, const D: usize> {
    /// Returns `(t_min, t_max)`, the parametric distances at which the ray enters and leaves
    /// the slabs of `aabb`. The ray misses if `t_max < max(t_min, 0)`.
    fn slab_interval(&self, aabb: &Aabb<T, D>) -> (T, T);

    /// Returns true if the ray hits `aabb` in front of (or at) its origin.
    /// Boxes without depth along the ray count as hit.
    fn ray_intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        let (t_min, t_max) = self.slab_interval(aabb);
        t_max >= fast_max(t_min, T::zero())
    }
}

impl<T: BHValue, const D: usize> RayIntersection<T, D> for Ray<T, D> {
    fn slab_interval(&self, aabb: &Aabb<T, D>) -> (T, T) {
        let mut t_min = T::neg_infinity();
        let mut t_max = T::infinity();
        for i in 0..D {
            // Parallel to the slab: the ray is inside it everywhere or nowhere. The product
            // below would be `0 * inf` for an origin on the bound.
            if self.direction[i] == T::zero() {
                if self.origin[i] < aabb.min[i] || self.origin[i] > aabb.max[i] {
                    return (T::infinity(), T::neg_infinity());
                }
                continue;
            }

            let mut near = (aabb.min[i] - self.origin[i]) * self.inv_direction[i];
            let mut far = (aabb.max[i] - self.origin[i]) * self.inv_direction[i];
            if self.inv_direction[i] < T::zero() {
                std::mem::swap(&mut near, &mut far);
            }
            t_min = fast_max(t_min, near);
            t_max = fast_min(t_max, far);
        }
        (t_min, t_max)
    }
}
