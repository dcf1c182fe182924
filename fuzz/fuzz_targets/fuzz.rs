#![no_main]
use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use linear_bvh::aabb::{Aabb, Bounded};
use linear_bvh::bounding_hierarchy::{ContainsPoint, RayHit};
use linear_bvh::bvh::{BuildOptions, Bvh};
use linear_bvh::ray::Ray;
use nalgebra::{Point, SimdPartialOrd};
use ordered_float::NotNan;

type Float = f32;
const LIMIT: Float = 1_000_000.0;

fuzz_target!(|workload: Workload<3>| {
    workload.fuzz();
});

#[derive(Arbitrary)]
struct ArbitraryPoint<const D: usize> {
    coordinates: [NotNan<Float>; D],
}

impl<const D: usize> ArbitraryPoint<D> {
    fn point(&self) -> Point<Float, D> {
        Point::<_, D>::from_slice(&self.coordinates).map(|f| f.into_inner().clamp(-LIMIT, LIMIT))
    }
}

#[derive(Arbitrary)]
struct ArbitraryShape<const D: usize> {
    a: ArbitraryPoint<D>,
    b: ArbitraryPoint<D>,
}

impl<const D: usize> Debug for ArbitraryShape<D> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.aabb(), f)
    }
}

impl<const D: usize> Bounded<Float, D> for ArbitraryShape<D> {
    fn aabb(&self) -> Aabb<Float, D> {
        let a = self.a.point();
        let b = self.b.point();
        Aabb::with_bounds(a.simd_min(b), a.simd_max(b))
    }
}

impl<const D: usize> RayHit<Float, D> for ArbitraryShape<D> {
    fn ray_hit(&self, ray: &Ray<Float, D>) -> Option<Float> {
        self.aabb().ray_hit(ray)
    }
}

impl<const D: usize> ContainsPoint<Float, D> for ArbitraryShape<D> {
    fn contains_point(&self, point: &Point<Float, D>) -> bool {
        self.aabb().contains(point)
    }
}

#[derive(Arbitrary)]
struct ArbitraryRay<const D: usize> {
    origin: ArbitraryPoint<D>,
    destination: ArbitraryPoint<D>,
}

impl<const D: usize> Debug for ArbitraryRay<D> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.ray(), f)
    }
}

impl<const D: usize> ArbitraryRay<D> {
    fn ray(&self) -> Ray<Float, D> {
        // Double normalize helps when the first one encounters precision issues.
        let mut direction = (self.destination.point() - self.origin.point())
            .normalize()
            .normalize();
        // Ensure no degenerate direction.
        if direction.magnitude() < 0.5 || direction.iter().any(|f| f.is_nan() || f.abs() > 1.5) {
            direction.iter_mut().for_each(|f| *f = 1.0);
            direction = direction.normalize();
        }
        Ray::new(self.origin.point(), direction)
    }
}

#[derive(Debug, Arbitrary)]
struct Workload<const D: usize> {
    shapes: Vec<ArbitraryShape<D>>,
    ray: ArbitraryRay<D>,
    point: ArbitraryPoint<D>,
    max_leaf_primitives: u8,
}

impl<const D: usize> Debug for ArbitraryPoint<D> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.point(), f)
    }
}

impl<const D: usize> Workload<D> {
    fn fuzz(self) {
        let options = BuildOptions::default()
            .max_leaf_primitives(self.max_leaf_primitives)
            .parallel_threshold(2);
        let bvh = Bvh::build_with_options(&self.shapes, &options);
        let ray = self.ray.ray();
        let point = self.point.point();

        bvh.validate().unwrap();
        bvh.validate_bounds(&self.shapes).unwrap();
        assert_eq!(bvh, Bvh::build_par_with_options(&self.shapes, &options));

        // Node boxes are exact joins, so pruning never drops a primitive the brute force finds.
        let traversed = bvh
            .traverse_iterator(&ray, &self.shapes)
            .map(|shape| shape as *const ArbitraryShape<D>)
            .collect::<HashSet<_>>();
        let expected = self
            .shapes
            .iter()
            .filter(|shape| ray.intersects_aabb(&shape.aabb()))
            .map(|shape| shape as *const ArbitraryShape<D>)
            .collect::<HashSet<_>>();
        assert_eq!(traversed, expected);

        let closest = self
            .shapes
            .iter()
            .filter_map(|shape| shape.ray_hit(&ray))
            .filter(|distance| *distance >= 0.0)
            .reduce(Float::min);
        assert_eq!(bvh.intersect(&ray, &self.shapes).map(|hit| hit.distance), closest);
        let occluded = bvh.intersects_any(&ray, Float::INFINITY, |i| self.shapes[i].ray_hit(&ray));
        assert_eq!(occluded, closest.is_some());
        assert_eq!(
            bvh.count_hits(&ray, &self.shapes),
            self.shapes.iter().filter(|shape| shape.ray_hit(&ray).is_some()).count()
        );

        let contained = self.shapes.iter().any(|shape| shape.contains_point(&point));
        assert_eq!(bvh.contains(&point, &self.shapes), contained);
    }
}
