//! This module defines a Triangle and its intersection algorithms

use nalgebra::{Point3, Vector3};

use crate::aabb::{Aabb, Bounded, IntersectsAabb};
use crate::bounding_hierarchy::{BHValue, RayHit};
use crate::ray::{Intersection, Ray};

/// A triangle in 3D. Both faces are hit by rays.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle<T: BHValue> {
    /// First point on the triangle
    pub a: Point3<T>,
    /// Second point on the triangle
    pub b: Point3<T>,
    /// Third point on the triangle
    pub c: Point3<T>,
    aabb: Aabb<T, 3>,
}

impl<T: BHValue> Triangle<T> {
    /// Creates a new triangle from its corners.
    pub fn new(a: Point3<T>, b: Point3<T>, c: Point3<T>) -> Triangle<T> {
        Triangle {
            a,
            b,
            c,
            aabb: Aabb::empty().grow(&a).grow(&b).grow(&c),
        }
    }

    /// Intersects the triangle with `ray`, see [`Ray::intersects_triangle`].
    pub fn intersect(&self, ray: &Ray<T, 3>) -> Intersection<T> {
        ray.intersects_triangle(&self.a, &self.b, &self.c)
    }

    /// The (not normalized) normal, following the right hand rule on `a`, `b`, `c`.
    pub fn normal(&self) -> Vector3<T> {
        (self.b - self.a).cross(&(self.c - self.a))
    }
}

impl<T: BHValue> Bounded<T, 3> for Triangle<T> {
    fn aabb(&self) -> Aabb<T, 3> {
        self.aabb
    }
}

impl<T: BHValue> RayHit<T, 3> for Triangle<T> {
    fn ray_hit(&self, ray: &Ray<T, 3>) -> Option<T> {
        self.intersect(ray).hit()
    }
}

impl<T: BHValue> IntersectsAabb<T, 3> for Triangle<T> {
    /// Separating axis test between the triangle and the box.
    fn intersects_aabb(&self, aabb: &Aabb<T, 3>) -> bool {
        let center = aabb.center();
        let two = T::one() + T::one();
        let extents = aabb.size().map(|x| x / two);

        let verts = [self.a - center, self.b - center, self.c - center];
        let edges = [
            verts[1] - verts[0],
            verts[2] - verts[1],
            verts[0] - verts[2],
        ];
        let box_normals = [Vector3::x(), Vector3::y(), Vector3::z()];

        let separated = |axis: Vector3<T>| {
            let p0 = verts[0].dot(&axis);
            let p1 = verts[1].dot(&axis);
            let p2 = verts[2].dot(&axis);
            let r = (0..3).fold(T::zero(), |r, i| {
                r + extents[i] * box_normals[i].dot(&axis).abs()
            });
            let max = p0.max(p1).max(p2);
            let min = p0.min(p1).min(p2);
            (-max).max(min) > r
        };

        for normal in &box_normals {
            for edge in &edges {
                if separated(normal.cross(edge)) {
                    return false;
                }
            }
        }
        if box_normals.iter().any(|normal| separated(*normal)) {
            return false;
        }
        !separated(edges[0].cross(&edges[1]))
    }
}
