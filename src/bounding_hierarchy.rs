//! This module defines the scalar bound [`BHValue`] and the per-primitive predicates
//! the hierarchy delegates to once it has narrowed a query down to a leaf.

use nalgebra::{
    ClosedAddAssign, ClosedDivAssign, ClosedMulAssign, ClosedSubAssign, Point, Scalar,
    SimdPartialOrd,
};
use num_traits::{Float, FromPrimitive, ToPrimitive};
use std::fmt::Display;

use crate::ray::Ray;

/// Encapsulates the required traits for the value type used in the [`Bvh`].
///
/// Blanket implemented for every type that satisfies the bounds, in practice `f32` and `f64`.
///
/// [`Bvh`]: crate::bvh::Bvh
pub trait BHValue:
    Scalar
    + Copy
    + FromPrimitive
    + ToPrimitive
    + Float
    + ClosedSubAssign
    + ClosedAddAssign
    + ClosedMulAssign
    + ClosedDivAssign
    + SimdPartialOrd
    + Display
    + Send
    + Sync
{
}

impl<T> BHValue for T where
    T: Scalar
        + Copy
        + FromPrimitive
        + ToPrimitive
        + Float
        + ClosedSubAssign
        + ClosedAddAssign
        + ClosedMulAssign
        + ClosedDivAssign
        + SimdPartialOrd
        + Display
        + Send
        + Sync
{
}

/// A primitive which can be intersected by a [`Ray`].
pub trait RayHit<T: BHValue, const D: usize> {
    /// Returns the parametric distance along `ray` to the first intersection in front of
    /// the ray origin, or [`None`] if the ray misses.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use linear_bvh::bounding_hierarchy::RayHit;
    /// use linear_bvh::ray::Ray;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(2.0, -1.0, -1.0), Point3::new(4.0, 1.0, 1.0));
    /// let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
    ///
    /// assert_eq!(aabb.ray_hit(&ray), Some(2.0));
    /// ```
    fn ray_hit(&self, ray: &Ray<T, D>) -> Option<T>;
}

/// A primitive which can decide whether a point lies inside of it.
pub trait ContainsPoint<T: BHValue, const D: usize> {
    /// Returns true if `point` lies inside (or on the boundary of) this primitive.
    fn contains_point(&self, point: &Point<T, D>) -> bool;
}
