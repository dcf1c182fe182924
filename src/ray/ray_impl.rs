//! This module defines a Ray structure and intersection algorithms
//! for axis aligned bounding boxes and triangles.

use nalgebra::{Point, SVector};

use super::intersect_default::RayIntersection;
use crate::aabb::{Aabb, IntersectsAabb};
use crate::bounding_hierarchy::BHValue;
use crate::utils::fast_max;

/// A struct which defines a ray and some of its cached values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray<T: BHValue, const D: usize> {
    /// The ray origin.
    pub origin: Point<T, D>,

    /// The ray direction. Always of unit length, so that parametric distances along the
    /// ray are euclidean distances.
    pub direction: SVector<T, D>,

    /// Inverse (1/x) ray direction. Cached for use in [`Aabb`] intersections.
    pub inv_direction: SVector<T, D>,
}

/// A struct which is returned by the [`Ray::intersects_triangle()`] method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection<T> {
    /// Distance from the ray origin to the intersection point.
    pub distance: T,

    /// U coordinate of the intersection.
    pub u: T,

    /// V coordinate of the intersection.
    pub v: T,
}

impl<T> Intersection<T> {
    /// Constructs an [`Intersection`]. `distance` should be set to positive infinity,
    /// if the intersection does not occur.
    pub fn new(distance: T, u: T, v: T) -> Intersection<T> {
        Intersection { distance, u, v }
    }
}

impl<T: BHValue> Intersection<T> {
    /// Returns the distance if the intersection occurred.
    pub fn hit(&self) -> Option<T> {
        if self.distance < T::infinity() {
            Some(self.distance)
        } else {
            None
        }
    }
}

impl<T: BHValue, const D: usize> Ray<T, D> {
    /// Creates a new [`Ray`] from an `origin` and a `direction`.
    /// `direction` will be normalized.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::ray::Ray;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let origin = Point3::new(0.0, 0.0, 0.0);
    /// let direction = Vector3::new(2.0, 0.0, 0.0);
    /// let ray = Ray::new(origin, direction);
    ///
    /// assert_eq!(ray.origin, origin);
    /// assert_eq!(ray.direction, Vector3::new(1.0, 0.0, 0.0));
    /// ```
    pub fn new(origin: Point<T, D>, direction: SVector<T, D>) -> Ray<T, D> {
        let length = direction.dot(&direction).sqrt();
        let direction = direction.map(|x| x / length);
        Ray {
            origin,
            direction,
            inv_direction: direction.map(|x| T::one() / x),
        }
    }

    /// Returns the point at parametric `distance` along the ray.
    pub fn at(&self, distance: T) -> Point<T, D> {
        self.origin + self.direction.map(|x| x * distance)
    }

    /// Returns, per axis, whether the ray direction is negative. Used during traversal to
    /// decide which child of a node lies nearer along the node's split axis.
    pub fn direction_is_negative(&self) -> [bool; D] {
        std::array::from_fn(|i| self.inv_direction[i] < T::zero())
    }

    /// Tests the intersection of a [`Ray`] with an [`Aabb`] using the optimized algorithm
    /// from [this paper](http://www.cs.utah.edu/~awilliam/box/box.pdf).
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use linear_bvh::ray::Ray;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let origin = Point3::new(0.0, 0.0, 0.0);
    /// let direction = Vector3::new(1.0, 0.0, 0.0);
    /// let ray = Ray::new(origin, direction);
    ///
    /// let point1 = Point3::new(99.9, -1.0, -1.0);
    /// let point2 = Point3::new(100.1, 1.0, 1.0);
    /// let aabb = Aabb::with_bounds(point1, point2);
    ///
    /// assert!(ray.intersects_aabb(&aabb));
    /// ```
    pub fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        self.ray_intersects_aabb(aabb)
    }

    /// Returns the parametric interval `(entry, exit)` in which the ray lies inside `aabb`,
    /// or [`None`] if the ray misses it. `entry` is negative if the origin lies inside.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use linear_bvh::ray::Ray;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, 2.0, -1.0), Point3::new(1.0, 5.0, 1.0));
    ///
    /// assert_eq!(ray.intersection_interval(&aabb), Some((2.0, 5.0)));
    /// ```
    pub fn intersection_interval(&self, aabb: &Aabb<T, D>) -> Option<(T, T)> {
        let (t_min, t_max) = self.slab_interval(aabb);
        if t_max >= fast_max(t_min, T::zero()) {
            Some((t_min, t_max))
        } else {
            None
        }
    }

    /// Returns the distance at which the ray enters `aabb`, clamped to zero when the origin
    /// lies inside, or [`None`] if the ray misses it.
    pub fn aabb_entry_distance(&self, aabb: &Aabb<T, D>) -> Option<T> {
        self.intersection_interval(aabb)
            .map(|(t_min, _)| fast_max(t_min, T::zero()))
    }
}

impl<T: BHValue> Ray<T, 3> {
    /// Implementation of the
    /// [Möller-Trumbore triangle/ray intersection algorithm](https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm).
    /// Returns the distance to the intersection, as well as
    /// the u and v coordinates of the intersection.
    /// The distance is set to +INFINITY if the ray does not intersect the triangle.
    /// Both faces of the triangle are hit.
    #[allow(clippy::many_single_char_names)]
    pub fn intersects_triangle(
        &self,
        a: &Point<T, 3>,
        b: &Point<T, 3>,
        c: &Point<T, 3>,
    ) -> Intersection<T> {
        let a_to_b = *b - *a;
        let a_to_c = *c - *a;

        // Begin calculating determinant - also used to calculate u parameter
        // u_vec lies in view plane
        // length of a_to_c in view_plane = |u_vec| = |a_to_c|*sin(a_to_c, dir)
        let u_vec = self.direction.cross(&a_to_c);

        // If determinant is near zero, ray lies in plane of triangle
        // The determinant corresponds to the parallelepiped volume:
        // det = 0 => [dir, a_to_b, a_to_c] not linearly independant
        let det = a_to_b.dot(&u_vec);
        if det.abs() < T::epsilon() {
            return Intersection::new(T::infinity(), T::zero(), T::zero());
        }

        let inv_det = T::one() / det;

        // Vector from point a to ray origin
        let a_to_origin = self.origin - *a;

        // Calculate u parameter
        let u = a_to_origin.dot(&u_vec) * inv_det;

        // Test bounds: u < 0 || u > 1 => outside of triangle
        if u < T::zero() || u > T::one() {
            return Intersection::new(T::infinity(), u, T::zero());
        }

        // Prepare to test v parameter
        let v_vec = a_to_origin.cross(&a_to_b);

        // Calculate v parameter and test bound
        let v = self.direction.dot(&v_vec) * inv_det;
        // The intersection lies outside of the triangle
        if v < T::zero() || u + v > T::one() {
            return Intersection::new(T::infinity(), u, v);
        }

        let dist = a_to_c.dot(&v_vec) * inv_det;

        if dist > T::epsilon() {
            Intersection::new(dist, u, v)
        } else {
            Intersection::new(T::infinity(), u, v)
        }
    }
}

impl<T: BHValue, const D: usize> IntersectsAabb<T, D> for Ray<T, D> {
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        self.ray_intersects_aabb(aabb)
    }
}

#[cfg(test)]
mod tests {
    use crate::testbase::{
        tuple_to_point, tuplevec_small_strategy, TAabb3, TPoint3, TRay3, TVector3, TupleVec,
    };
    use float_eq::assert_float_eq;
    use proptest::prelude::*;

    /// Generates a random [`Ray`] which points at at a random [`Aabb`].
    fn gen_ray_to_aabb(data: (TupleVec, TupleVec, TupleVec)) -> (TRay3, TAabb3) {
        // Generate a random `Aabb`
        let aabb = TAabb3::empty()
            .grow(&tuple_to_point(&data.0))
            .grow(&tuple_to_point(&data.1));

        // Get its center
        let center = aabb.center();

        // Generate random ray pointing at the center
        let pos = tuple_to_point(&data.2);
        let ray = TRay3::new(pos, center - pos);
        (ray, aabb)
    }

    /// Make sure a ray can intersect an AABB with no depth.
    #[test]
    fn ray_hits_zero_depth_aabb() {
        let origin = TPoint3::new(0.0, 0.0, 0.0);
        let direction = TVector3::new(0.0, 0.0, 1.0);
        let ray = TRay3::new(origin, direction);
        let min = TPoint3::new(-1.0, -1.0, 1.0);
        let max = TPoint3::new(1.0, 1.0, 1.0);
        let aabb = TAabb3::with_bounds(min, max);
        assert!(ray.intersects_aabb(&aabb));
        assert_eq!(ray.aabb_entry_distance(&aabb), Some(1.0));
    }

    #[test]
    fn ray_direction_is_normalized() {
        let ray = TRay3::new(TPoint3::new(1.0, 1.0, 1.0), TVector3::new(0.0, 3.0, 4.0));
        assert_float_eq!(ray.direction.norm(), 1.0, abs <= 1e-6);
        assert_float_eq!(ray.at(5.0).z, 5.0, abs <= 1e-5);
        assert_eq!(ray.direction_is_negative(), [false, false, false]);

        let backwards = TRay3::new(TPoint3::new(0.0, 0.0, 0.0), TVector3::new(-1.0, 0.0, 2.0));
        assert_eq!(backwards.direction_is_negative(), [true, false, false]);
    }

    #[test]
    fn entry_distance_is_zero_inside_box() {
        let aabb = TAabb3::with_bounds(TPoint3::new(-1.0, -1.0, -1.0), TPoint3::new(1.0, 1.0, 1.0));
        let ray = TRay3::new(TPoint3::new(0.0, 0.0, 0.0), TVector3::new(1.0, 1.0, 0.0));
        assert_eq!(ray.aabb_entry_distance(&aabb), Some(0.0));
    }

    #[test]
    fn ray_parallel_to_triangle_misses() {
        let a = TPoint3::new(0.0, 0.0, 0.0);
        let b = TPoint3::new(1.0, 0.0, 0.0);
        let c = TPoint3::new(0.0, 1.0, 0.0);
        let ray = TRay3::new(TPoint3::new(-1.0, 0.25, 0.0), TVector3::new(1.0, 0.0, 0.0));
        assert_eq!(ray.intersects_triangle(&a, &b, &c).hit(), None);
    }

    #[test]
    fn ray_hits_both_triangle_faces() {
        let a = TPoint3::new(0.0, 0.0, 0.0);
        let b = TPoint3::new(1.0, 0.0, 0.0);
        let c = TPoint3::new(0.0, 1.0, 0.0);

        let from_above = TRay3::new(TPoint3::new(0.25, 0.25, 2.0), TVector3::new(0.0, 0.0, -1.0));
        let from_below = TRay3::new(TPoint3::new(0.25, 0.25, -3.0), TVector3::new(0.0, 0.0, 1.0));

        assert_float_eq!(from_above.intersects_triangle(&a, &b, &c).distance, 2.0, abs <= 1e-6);
        assert_float_eq!(from_below.intersects_triangle(&a, &b, &c).distance, 3.0, abs <= 1e-6);
    }

    proptest! {
        // Test whether a `Ray` which points at the center of an `Aabb` intersects it.
        #[test]
        fn test_ray_points_at_aabb_center(data in (tuplevec_small_strategy(),
                                                   tuplevec_small_strategy(),
                                                   tuplevec_small_strategy())) {
            let (ray, aabb) = gen_ray_to_aabb(data);
            prop_assert!(ray.intersects_aabb(&aabb));
        }

        // Test whether a `Ray` which points away from the center of an `Aabb`
        // does not intersect it, unless its origin is inside the `Aabb`.
        #[test]
        fn test_ray_points_from_aabb_center(data in (tuplevec_small_strategy(),
                                                     tuplevec_small_strategy(),
                                                     tuplevec_small_strategy())) {
            let (mut ray, aabb) = gen_ray_to_aabb(data);

            // Invert the direction of the ray
            ray.direction = -ray.direction;
            ray.inv_direction = -ray.inv_direction;
            prop_assert!(!ray.intersects_aabb(&aabb) || aabb.contains(&ray.origin));
        }

        // Test whether a `Ray` which points at the center of an `Aabb` yields an interval
        // that is not entirely behind its origin.
        #[test]
        fn test_ray_interval_at_aabb_center(data in (tuplevec_small_strategy(),
                                                     tuplevec_small_strategy(),
                                                     tuplevec_small_strategy())) {
            let (ray, aabb) = gen_ray_to_aabb(data);
            let interval = ray.intersection_interval(&aabb);
            prop_assert!(interval.is_some());
            let (entry, exit) = interval.unwrap();
            prop_assert!(entry <= exit);
            prop_assert!(exit >= 0.0);
        }

        // Test whether a `Ray` aimed at an interior point of a triangle from either side
        // hits it at the expected distance.
        #[test]
        fn test_ray_hits_triangle(a in (-100i32..100, -100i32..100, -100i32..100),
                                  b in (-100i32..100, -100i32..100, -100i32..100),
                                  c in (-100i32..100, -100i32..100, -100i32..100),
                                  u in 5u32..45,
                                  v in 5u32..45,
                                  height in -10i32..10) {
            let to_point = |p: (i32, i32, i32)| TPoint3::new(p.0 as f32, p.1 as f32, p.2 as f32);
            let triangle = (to_point(a), to_point(b), to_point(c));
            let u_vec = triangle.1 - triangle.0;
            let v_vec = triangle.2 - triangle.0;
            let normal = u_vec.cross(&v_vec);
            prop_assume!(normal.norm() > 1.0 && height != 0);

            let unit_normal = normal / normal.norm();
            let point_on_triangle =
                triangle.0 + u_vec * (u as f32 / 100.0) + v_vec * (v as f32 / 100.0);
            let origin = point_on_triangle + unit_normal * height as f32;
            let ray = TRay3::new(origin, point_on_triangle - origin);

            let intersection = ray.intersects_triangle(&triangle.0, &triangle.1, &triangle.2);
            let expected = height.abs() as f32;
            prop_assert!((intersection.distance - expected).abs() <= 1e-3 * expected.max(1.0),
                         "distance {} expected {}", intersection.distance, expected);
        }
    }
}

#[cfg(all(feature = "bench", test))]
mod bench {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use test::{black_box, Bencher};

    use crate::testbase::{tuple_to_point, tuple_to_vector, TAabb3, TRay3, TupleVec};

    /// Generate a random deterministic `Ray`.
    fn random_ray(rng: &mut StdRng) -> TRay3 {
        let a = tuple_to_point(&rng.random::<TupleVec>());
        let b = tuple_to_vector(&rng.random::<TupleVec>());
        TRay3::new(a, b)
    }

    /// Generate a random deterministic `Aabb`.
    fn random_aabb(rng: &mut StdRng) -> TAabb3 {
        let a = tuple_to_point(&rng.random::<TupleVec>());
        let b = tuple_to_point(&rng.random::<TupleVec>());

        TAabb3::empty().grow(&a).grow(&b)
    }

    /// Generate the ray and boxes used for benchmarks.
    fn random_ray_and_boxes() -> (TRay3, Vec<TAabb3>) {
        let mut rng = StdRng::seed_from_u64(0);

        let ray = random_ray(&mut rng);
        let boxes = (0..1000).map(|_| random_aabb(&mut rng)).collect::<Vec<_>>();

        black_box((ray, boxes))
    }

    /// Benchmark for the slab test.
    #[bench]
    fn bench_intersects_aabb(b: &mut Bencher) {
        let (ray, boxes) = random_ray_and_boxes();

        b.iter(|| {
            for aabb in &boxes {
                black_box(ray.intersects_aabb(aabb));
            }
        });
    }
}
