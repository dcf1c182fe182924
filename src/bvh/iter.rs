use std::ops::Range;

use crate::aabb::{Bounded, IntersectsAabb};
use crate::bounding_hierarchy::BHValue;
use crate::bvh::{Bvh, LinearNode};

/// Iterator over the shapes of a [`Bvh`] whose [`Aabb`]s intersect a query.
///
/// Shapes are yielded leaf by leaf, first children before second children.
///
/// [`Aabb`]: crate::aabb::Aabb
pub struct BvhTraverseIterator<
    'bvh,
    'shape,
    T: BHValue,
    const D: usize,
    Query: IntersectsAabb<T, D>,
    Shape: Bounded<T, D>,
> {
    /// Reference to the [`Bvh`] to traverse
    bvh: &'bvh Bvh<T, D>,
    /// Reference to the input query
    query: &'bvh Query,
    /// Reference to the input shapes array
    shapes: &'shape [Shape],
    /// Nodes still to visit
    stack: Vec<usize>,
    /// Slots of the ordered index array of the current leaf that were not yielded yet
    leaf: Range<usize>,
}

impl<'bvh, 'shape, T: BHValue, const D: usize, Query: IntersectsAabb<T, D>, Shape: Bounded<T, D>>
    BvhTraverseIterator<'bvh, 'shape, T, D, Query, Shape>
{
    /// Creates a new [`BvhTraverseIterator`]
    pub fn new(bvh: &'bvh Bvh<T, D>, query: &'bvh Query, shapes: &'shape [Shape]) -> Self {
        let mut stack = Vec::with_capacity(64);
        if !bvh.is_empty() {
            stack.push(0);
        }
        BvhTraverseIterator {
            bvh,
            query,
            shapes,
            stack,
            leaf: 0..0,
        }
    }
}

impl<'shape, T: BHValue, const D: usize, Query: IntersectsAabb<T, D>, Shape: Bounded<T, D>> Iterator
    for BvhTraverseIterator<'_, 'shape, T, D, Query, Shape>
{
    type Item = &'shape Shape;

    fn next(&mut self) -> Option<&'shape Shape> {
        loop {
            // Drain the current leaf before descending any further.
            for slot in self.leaf.by_ref() {
                let shape = &self.shapes[self.bvh.ordered_indices[slot]];
                if self.query.intersects_aabb(&shape.aabb()) {
                    return Some(shape);
                }
            }

            let index = self.stack.pop()?;
            let node = &self.bvh.nodes[index];
            if !self.query.intersects_aabb(node.aabb()) {
                continue;
            }
            match *node {
                LinearNode::Leaf { .. } => {
                    if let Some(range) = node.primitive_range() {
                        self.leaf = range;
                    }
                }
                LinearNode::Interior {
                    second_child_offset,
                    ..
                } => {
                    self.stack.push(second_child_offset as usize);
                    self.stack.push(index + 1);
                }
            }
        }
    }
}


#[cfg(all(feature = "bench", test))]
mod bench {
    use crate::testbase::{create_n_cubes, create_ray, default_bounds, TBvh3};

    #[bench]
    /// Benchmark the traversal of a [`Bvh`] with 120,000 triangles with [`Vec`] return.
    fn bench_traverse_120k_triangles_vec(b: &mut ::test::Bencher) {
        let bounds = default_bounds();
        let triangles = create_n_cubes(10_000, &bounds);
        let bvh = TBvh3::build(&triangles);

        let mut seed = 0;
        b.iter(|| {
            for _ in 0..128 {
                let ray = create_ray(&mut seed, &bounds);
                let hits = bvh.traverse(&ray, &triangles);
                for triangle in &hits {
                    ray.intersects_triangle(&triangle.a, &triangle.b, &triangle.c);
                }
            }
        });
    }

    #[bench]
    /// Benchmark the traversal of a [`Bvh`] with 120,000 triangles with [`BvhTraverseIterator`].
    fn bench_traverse_120k_triangles_iter(b: &mut ::test::Bencher) {
        let bounds = default_bounds();
        let triangles = create_n_cubes(10_000, &bounds);
        let bvh = TBvh3::build(&triangles);

        let mut seed = 0;
        b.iter(|| {
            for _ in 0..128 {
                let ray = create_ray(&mut seed, &bounds);
                for triangle in bvh.traverse_iterator(&ray, &triangles) {
                    ray.intersects_triangle(&triangle.a, &triangle.b, &triangle.c);
                }
            }
        });
    }
}
