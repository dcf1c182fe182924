//! Common utilities shared by unit tests.

use std::collections::HashSet;

use nalgebra::{Point, SVector};
use proptest::prelude::*;

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::{ContainsPoint, RayHit};
use crate::bvh::Bvh;
use crate::ray::Ray;
use crate::shapes::Triangle;

/// Point type for testing.
pub type TPoint3 = Point<f32, 3>;
/// Vector type for testing.
pub type TVector3 = SVector<f32, 3>;
/// Ray type for testing.
pub type TRay3 = Ray<f32, 3>;
/// AABB type for testing.
pub type TAabb3 = Aabb<f32, 3>;
/// BVH type for testing.
pub type TBvh3 = Bvh<f32, 3>;

/// A vector represented as a tuple
pub type TupleVec = (f32, f32, f32);

/// Generate a `TupleVec` for [`proptest::strategy::Strategy`] from -10e10 to 10e10
/// A small enough range to prevent most fp32 errors from breaking certain tests
pub fn tuplevec_small_strategy() -> impl Strategy<Value = TupleVec> {
    (
        -10e10_f32..10e10_f32,
        -10e10_f32..10e10_f32,
        -10e10_f32..10e10_f32,
    )
}

/// Convert a `TupleVec` to a [`TPoint3`].
pub fn tuple_to_point(tpl: &TupleVec) -> TPoint3 {
    TPoint3::new(tpl.0, tpl.1, tpl.2)
}

/// Convert a `TupleVec` to a [`TVector3`].
pub fn tuple_to_vector(tpl: &TupleVec) -> TVector3 {
    TVector3::new(tpl.0, tpl.1, tpl.2)
}

/// Define some `Bounded` structure.
#[derive(Debug, Clone, Copy)]
pub struct UnitBox {
    pub id: i32,
    pub pos: TPoint3,
}

impl UnitBox {
    pub fn new(id: i32, pos: TPoint3) -> UnitBox {
        UnitBox { id, pos }
    }
}

/// `UnitBox`'s `Aabb`s are unit `Aabb`s centered on the box's position.
impl Bounded<f32, 3> for UnitBox {
    fn aabb(&self) -> TAabb3 {
        let min = self.pos + TVector3::new(-0.5, -0.5, -0.5);
        let max = self.pos + TVector3::new(0.5, 0.5, 0.5);
        TAabb3::with_bounds(min, max)
    }
}

impl RayHit<f32, 3> for UnitBox {
    fn ray_hit(&self, ray: &TRay3) -> Option<f32> {
        self.aabb().ray_hit(ray)
    }
}

impl ContainsPoint<f32, 3> for UnitBox {
    fn contains_point(&self, point: &TPoint3) -> bool {
        self.aabb().contains(point)
    }
}

/// Generate 21 `UnitBox`s along the X axis centered on whole numbers (-10,9,..,10).
/// The index is set to the rounded x-coordinate of the box center.
pub fn generate_aligned_boxes() -> Vec<UnitBox> {
    // Create 21 boxes along the x-axis
    let mut shapes = Vec::new();
    for x in -10..11 {
        shapes.push(UnitBox::new(x, TPoint3::new(x as f32, 0.0, 0.0)));
    }
    shapes
}

/// Creates a [`Bvh`] for a fixed scene structure.
pub fn build_some_bvh() -> (Vec<UnitBox>, TBvh3) {
    let boxes = generate_aligned_boxes();
    let bvh = TBvh3::build(&boxes);
    (boxes, bvh)
}

/// Given a ray, a bounding hierarchy, the complete list of shapes in the scene and a list of
/// expected hits, verifies, whether the ray hits only the expected shapes.
fn traverse_and_verify(
    ray_origin: TPoint3,
    ray_direction: TVector3,
    all_shapes: &[UnitBox],
    bvh: &TBvh3,
    expected_shapes: &HashSet<i32>,
) {
    let ray = Ray::new(ray_origin, ray_direction);
    let hit_shapes = bvh.traverse(&ray, all_shapes);

    assert_eq!(expected_shapes.len(), hit_shapes.len());
    for shape in hit_shapes {
        assert!(expected_shapes.contains(&shape.id));
    }

    // Every shape the traversal yields is also counted as hit.
    assert_eq!(bvh.count_hits(&ray, all_shapes), expected_shapes.len());
}

/// Perform some fixed intersection tests on a [`Bvh`].
pub fn traverse_some_bvh() {
    let (all_shapes, bvh) = build_some_bvh();

    {
        // Define a ray which traverses the x-axis from afar.
        let origin = TPoint3::new(-1000.0, 0.0, 0.0);
        let direction = TVector3::new(1.0, 0.0, 0.0);
        let mut expected_shapes = HashSet::new();

        // It should hit everything.
        for id in -10..11 {
            expected_shapes.insert(id);
        }
        traverse_and_verify(origin, direction, &all_shapes, &bvh, &expected_shapes);
    }

    {
        // Define a ray which traverses the y-axis from afar.
        let origin = TPoint3::new(0.0, -1000.0, 0.0);
        let direction = TVector3::new(0.0, 1.0, 0.0);

        // It should hit only one box.
        let mut expected_shapes = HashSet::new();
        expected_shapes.insert(0);
        traverse_and_verify(origin, direction, &all_shapes, &bvh, &expected_shapes);
    }

    {
        // Define a ray which intersects the x-axis diagonally.
        let origin = TPoint3::new(6.0, 0.5, 0.0);
        let direction = TVector3::new(-2.0, -1.0, 0.0);

        // It should hit exactly three boxes.
        let mut expected_shapes = HashSet::new();
        expected_shapes.insert(4);
        expected_shapes.insert(5);
        expected_shapes.insert(6);
        traverse_and_verify(origin, direction, &all_shapes, &bvh, &expected_shapes);
    }
}

/// Creates a unit size cube centered at `pos` and pushes the triangles to `shapes`.
fn push_cube(pos: TPoint3, shapes: &mut Vec<Triangle<f32>>) {
    let top_front_right = pos + TVector3::new(0.5, 0.5, -0.5);
    let top_back_right = pos + TVector3::new(0.5, 0.5, 0.5);
    let top_back_left = pos + TVector3::new(-0.5, 0.5, 0.5);
    let top_front_left = pos + TVector3::new(-0.5, 0.5, -0.5);
    let bottom_front_right = pos + TVector3::new(0.5, -0.5, -0.5);
    let bottom_back_right = pos + TVector3::new(0.5, -0.5, 0.5);
    let bottom_back_left = pos + TVector3::new(-0.5, -0.5, 0.5);
    let bottom_front_left = pos + TVector3::new(-0.5, -0.5, -0.5);

    shapes.push(Triangle::new(top_back_right, top_front_right, top_front_left));
    shapes.push(Triangle::new(top_front_left, top_back_left, top_back_right));
    shapes.push(Triangle::new(bottom_front_left, bottom_front_right, bottom_back_right));
    shapes.push(Triangle::new(bottom_back_right, bottom_back_left, bottom_front_left));
    shapes.push(Triangle::new(top_back_left, top_front_left, bottom_front_left));
    shapes.push(Triangle::new(bottom_front_left, bottom_back_left, top_back_left));
    shapes.push(Triangle::new(bottom_front_right, top_front_right, top_back_right));
    shapes.push(Triangle::new(top_back_right, bottom_back_right, bottom_front_right));
    shapes.push(Triangle::new(top_front_left, top_front_right, bottom_front_right));
    shapes.push(Triangle::new(bottom_front_right, bottom_front_left, top_front_left));
    shapes.push(Triangle::new(bottom_back_right, top_back_right, top_back_left));
    shapes.push(Triangle::new(top_back_left, bottom_back_left, bottom_back_right));
}

/// Implementation of splitmix64.
/// For reference see: http://xoroshiro.di.unimi.it/splitmix64.c
fn splitmix64(x: &mut u64) -> u64 {
    *x = x.wrapping_add(0x9E3779B97F4A7C15u64);
    let mut z = *x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EBu64);
    z ^ (z >> 31)
}

/// Generates a new `i32` triple. Mutates the seed.
fn next_point3_raw(seed: &mut u64) -> (i32, i32, i32) {
    let u = splitmix64(seed);
    let a = ((u >> 32) & 0xFFFFFFFF) as i64 - 0x80000000;
    let b = (u & 0xFFFFFFFF) as i64 - 0x80000000;
    let c = a ^ b.rotate_left(6);
    (a as i32, b as i32, c as i32)
}

/// Generates a new `Point3`, which will lie inside the given `aabb`. Mutates the seed.
pub fn next_point3(seed: &mut u64, aabb: &TAabb3) -> TPoint3 {
    let (a, b, c) = next_point3_raw(seed);
    let float_vector = TVector3::new(
        (a as f32 / i32::MAX as f32) + 1.0,
        (b as f32 / i32::MAX as f32) + 1.0,
        (c as f32 / i32::MAX as f32) + 1.0,
    ) * 0.5;

    let size = aabb.size();
    aabb.min + float_vector.component_mul(&size)
}

/// Returns an `Aabb` which defines the default testing space bounds.
pub fn default_bounds() -> TAabb3 {
    TAabb3::with_bounds(
        TPoint3::new(-100_000.0, -100_000.0, -100_000.0),
        TPoint3::new(100_000.0, 100_000.0, 100_000.0),
    )
}

/// Creates `n` deterministic random cubes. Returns the `Vec` of surface `Triangle`s.
pub fn create_n_cubes(n: usize, bounds: &TAabb3) -> Vec<Triangle<f32>> {
    let mut vec = Vec::new();
    let mut seed = 0;
    for _ in 0..n {
        push_cube(next_point3(&mut seed, bounds), &mut vec);
    }
    vec
}

/// Creates a `Ray` from the random `seed`. Mutates the `seed`.
/// The Ray origin will be inside the `bounds` and point to some other point inside this
/// `bounds`.
#[cfg(feature = "bench")]
pub fn create_ray(seed: &mut u64, bounds: &TAabb3) -> TRay3 {
    let origin = next_point3(seed, bounds);
    let direction = next_point3(seed, bounds);
    TRay3::new(origin, direction.coords)
}
