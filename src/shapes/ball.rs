//! Balls, including circles and spheres.

use nalgebra::{Point, SVector};

use crate::aabb::{Aabb, Bounded, IntersectsAabb};
use crate::bounding_hierarchy::{BHValue, ContainsPoint, RayHit};
use crate::ray::Ray;

/// In 2D, a circle. In 3D, a sphere. Usable both as a primitive and as a query for
/// [`Bvh::traverse`](crate::bvh::Bvh::traverse).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ball<T: BHValue, const D: usize> {
    /// The center of the ball.
    pub center: Point<T, D>,
    /// The radius of the ball.
    pub radius: T,
}

impl<T: BHValue, const D: usize> Ball<T, D> {
    /// Creates a [`Ball`] with the given `center` and `radius`.
    ///
    /// # Panics
    /// Panics, in debug mode, if the radius is negative.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::shapes::Ball;
    /// use nalgebra::Point3;
    ///
    /// let ball = Ball::new(Point3::new(1.0, 1.0, 1.0), 1.0);
    /// assert_eq!(ball.center, Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(ball.radius, 1.0)
    /// ```
    pub fn new(center: Point<T, D>, radius: T) -> Self {
        debug_assert!(radius >= T::zero());
        Self { center, radius }
    }

    /// Returns true if this [`Ball`] contains the [`Point`].
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::shapes::Ball;
    /// use nalgebra::Point3;
    ///
    /// let ball = Ball::new(Point3::new(1.0, 1.0, 1.0), 1.0);
    /// let point = Point3::new(1.25, 1.25, 1.25);
    ///
    /// assert!(ball.contains(&point));
    /// ```
    pub fn contains(&self, point: &Point<T, D>) -> bool {
        let offset = point - self.center;
        // Squaring the RHS is faster than computing the square root of the LHS.
        offset.dot(&offset) <= self.radius * self.radius
    }
}

impl<T: BHValue, const D: usize> Bounded<T, D> for Ball<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        let half_size = SVector::<T, D>::from_element(self.radius);
        Aabb::with_bounds(self.center - half_size, self.center + half_size)
    }
}

impl<T: BHValue, const D: usize> IntersectsAabb<T, D> for Ball<T, D> {
    /// Returns true if this [`Ball`] intersects the [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::{Aabb, IntersectsAabb};
    /// use linear_bvh::shapes::Ball;
    /// use nalgebra::Point3;
    ///
    /// let ball = Ball::new(Point3::new(1.0, 1.0, 1.0), 1.0);
    /// let aabb = Aabb::with_bounds(Point3::new(1.25, 1.25, 1.25), Point3::new(3.0, 3.0, 3.0));
    ///
    /// assert!(ball.intersects_aabb(&aabb));
    /// ```
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        // https://gamemath.com/book/geomtests.html#intersection_sphere_aabb
        aabb.distance_squared(&self.center) <= self.radius * self.radius
    }
}

impl<T: BHValue, const D: usize> ContainsPoint<T, D> for Ball<T, D> {
    fn contains_point(&self, point: &Point<T, D>) -> bool {
        self.contains(point)
    }
}

impl<T: BHValue, const D: usize> RayHit<T, D> for Ball<T, D> {
    /// The first crossing of the surface in front of the ray origin. From inside the ball that
    /// is where the ray leaves it.
    fn ray_hit(&self, ray: &Ray<T, D>) -> Option<T> {
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(&ray.direction);
        let half_b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant < T::zero() {
            return None;
        }

        let sqrtd = discriminant.sqrt();
        let near = (-half_b - sqrtd) / a;
        if near >= T::zero() {
            return Some(near);
        }
        let far = (-half_b + sqrtd) / a;
        if far >= T::zero() {
            Some(far)
        } else {
            None
        }
    }
}
