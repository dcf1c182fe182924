//! Queries on a [`Bvh`]: closest hit, any hit, hit counting, point containment and candidate
//! traversal.
//!
//! Every query walks the linear node array with an explicit stack, starting at the root, and
//! only descends into nodes whose box passes the query's box test. Primitives are tested
//! through caller supplied predicates keyed by primitive index.

use nalgebra::Point;

use crate::aabb::{Bounded, IntersectsAabb};
use crate::bounding_hierarchy::{BHValue, ContainsPoint, RayHit};
use crate::bvh::{Bvh, BvhTraverseIterator, Hit, LinearNode};
use crate::ray::Ray;

/// Initial capacity of the traversal stacks. Deeper trees grow the stack.
const STACK_CAPACITY: usize = 64;

impl<T: BHValue, const D: usize> Bvh<T, D> {
    /// Returns the closest intersection of `ray` with `shapes`, the slice the [`Bvh`] was
    /// built over.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use linear_bvh::bvh::Bvh;
    /// use linear_bvh::ray::Ray;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let cubes = [0.0, 10.0, 20.0]
    ///     .iter()
    ///     .map(|&x| {
    ///         Aabb::with_bounds(Point3::new(x - 0.5, -0.5, -0.5), Point3::new(x + 0.5, 0.5, 0.5))
    ///     })
    ///     .collect::<Vec<_>>();
    /// let bvh = Bvh::build(&cubes);
    ///
    /// let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
    /// let hit = bvh.intersect(&ray, &cubes).unwrap();
    /// assert_eq!(hit.primitive_index, 0);
    /// assert_eq!(hit.distance, 4.5);
    /// ```
    pub fn intersect<Shape: RayHit<T, D>>(
        &self,
        ray: &Ray<T, D>,
        shapes: &[Shape],
    ) -> Option<Hit<T>> {
        self.intersect_with(ray, |index| shapes[index].ray_hit(ray))
    }

    /// Returns the closest intersection of `ray` with the primitives. `hit_of` is called with a
    /// primitive index and returns the distance along `ray` at which that primitive is hit.
    ///
    /// Children are visited front to back along the split axis and subtrees that lie behind
    /// the closest hit found so far are skipped. Negative distances are ignored. Of several
    /// hits at the same distance, the first one found is kept.
    pub fn intersect_with<F: FnMut(usize) -> Option<T>>(
        &self,
        ray: &Ray<T, D>,
        mut hit_of: F,
    ) -> Option<Hit<T>> {
        if self.is_empty() {
            return None;
        }

        let dir_is_neg = ray.direction_is_negative();
        let mut closest: Option<Hit<T>> = None;
        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        stack.push(0);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            let Some(entry) = ray.aabb_entry_distance(node.aabb()) else {
                continue;
            };
            if closest.is_some_and(|hit| entry > hit.distance) {
                continue;
            }

            match *node {
                LinearNode::Leaf { .. } => {
                    for &primitive_index in self.leaf_primitives(index) {
                        let Some(distance) = hit_of(primitive_index) else {
                            continue;
                        };
                        if distance >= T::zero()
                            && closest.map_or(true, |hit| distance < hit.distance)
                        {
                            closest = Some(Hit {
                                primitive_index,
                                distance,
                            });
                        }
                    }
                }
                LinearNode::Interior {
                    second_child_offset,
                    axis,
                    ..
                } => push_near_last(
                    &mut stack,
                    index + 1,
                    second_child_offset as usize,
                    dir_is_neg[axis as usize],
                ),
            }
        }
        closest
    }

    /// Returns true if `ray` hits any primitive closer than `max_distance`. Stops at the first
    /// such hit. `hit_of` has the same meaning as in [`Bvh::intersect_with`].
    ///
    /// Useful for shadow and visibility rays, where the closest hit does not matter.
    pub fn intersects_any<F: FnMut(usize) -> Option<T>>(
        &self,
        ray: &Ray<T, D>,
        max_distance: T,
        mut hit_of: F,
    ) -> bool {
        if self.is_empty() {
            return false;
        }

        let dir_is_neg = ray.direction_is_negative();
        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        stack.push(0);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            match ray.aabb_entry_distance(node.aabb()) {
                Some(entry) if entry < max_distance => {}
                _ => continue,
            }

            match *node {
                LinearNode::Leaf { .. } => {
                    let occluded = self.leaf_primitives(index).iter().any(|&primitive_index| {
                        hit_of(primitive_index).is_some_and(|distance| {
                            distance >= T::zero() && distance < max_distance
                        })
                    });
                    if occluded {
                        return true;
                    }
                }
                LinearNode::Interior {
                    second_child_offset,
                    axis,
                    ..
                } => push_near_last(
                    &mut stack,
                    index + 1,
                    second_child_offset as usize,
                    dir_is_neg[axis as usize],
                ),
            }
        }
        false
    }

    /// Returns the number of primitives in `shapes` that `ray` hits in front of its origin.
    pub fn count_hits<Shape: RayHit<T, D>>(&self, ray: &Ray<T, D>, shapes: &[Shape]) -> usize {
        self.count_hits_with(ray, |index| shapes[index].ray_hit(ray))
    }

    /// Returns the number of primitives `ray` hits in front of its origin. `hit_of` has the
    /// same meaning as in [`Bvh::intersect_with`]. Every node the ray passes through is visited.
    pub fn count_hits_with<F: FnMut(usize) -> Option<T>>(
        &self,
        ray: &Ray<T, D>,
        mut hit_of: F,
    ) -> usize {
        if self.is_empty() {
            return 0;
        }

        let mut count = 0;
        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        stack.push(0);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !ray.intersects_aabb(node.aabb()) {
                continue;
            }
            match node.children(index) {
                Some(children) => stack.extend(children),
                None => {
                    count += self
                        .leaf_primitives(index)
                        .iter()
                        .filter(|&&primitive_index| {
                            hit_of(primitive_index).is_some_and(|distance| distance >= T::zero())
                        })
                        .count();
                }
            }
        }
        count
    }

    /// Returns true if any primitive in `shapes` contains `point`.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use linear_bvh::bvh::Bvh;
    /// use nalgebra::Point3;
    ///
    /// let cubes = [Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))];
    /// let bvh = Bvh::build(&cubes);
    ///
    /// assert!(bvh.contains(&Point3::new(0.5, 0.5, 0.5), &cubes));
    /// assert!(!bvh.contains(&Point3::new(1.5, 0.5, 0.5), &cubes));
    /// ```
    pub fn contains<Shape: ContainsPoint<T, D>>(
        &self,
        point: &Point<T, D>,
        shapes: &[Shape],
    ) -> bool {
        self.contains_with(point, |index| shapes[index].contains_point(point))
    }

    /// Returns true if `contains_of` holds for any primitive whose leaf box contains `point`.
    /// `contains_of` is called with a primitive index. Stops at the first success.
    pub fn contains_with<F: FnMut(usize) -> bool>(
        &self,
        point: &Point<T, D>,
        mut contains_of: F,
    ) -> bool {
        if self.is_empty() {
            return false;
        }

        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        stack.push(0);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.aabb().contains(point) {
                continue;
            }
            match node.children(index) {
                Some([first, second]) => {
                    stack.push(second);
                    stack.push(first);
                }
                None => {
                    if self
                        .leaf_primitives(index)
                        .iter()
                        .any(|&primitive_index| contains_of(primitive_index))
                    {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Traverses the [`Bvh`].
    /// Returns a subset of `shapes`, in which the [`Aabb`]s of the elements were hit by `query`.
    ///
    /// [`Aabb`]: crate::aabb::Aabb
    pub fn traverse<'a, Query: IntersectsAabb<T, D>, Shape: Bounded<T, D>>(
        &'a self,
        query: &Query,
        shapes: &'a [Shape],
    ) -> Vec<&'a Shape> {
        self.traverse_iterator(query, shapes).collect()
    }

    /// Creates a [`BvhTraverseIterator`] to traverse the [`Bvh`].
    /// Returns a subset of `shapes`, in which the [`Aabb`]s of the elements were hit by `query`.
    ///
    /// [`Aabb`]: crate::aabb::Aabb
    pub fn traverse_iterator<'bvh, 'shape, Query: IntersectsAabb<T, D>, Shape: Bounded<T, D>>(
        &'bvh self,
        query: &'bvh Query,
        shapes: &'shape [Shape],
    ) -> BvhTraverseIterator<'bvh, 'shape, T, D, Query, Shape> {
        BvhTraverseIterator::new(self, query, shapes)
    }
}

/// Pushes both children so that the one nearer along the split axis is popped first.
fn push_near_last(stack: &mut Vec<usize>, first: usize, second: usize, dir_is_neg: bool) {
    if dir_is_neg {
        stack.push(first);
        stack.push(second);
    } else {
        stack.push(second);
        stack.push(first);
    }
}


#[cfg(all(feature = "bench", test))]
mod bench {
    use crate::testbase::{create_n_cubes, create_ray, default_bounds, TBvh3};

    /// Benchmark closest hit queries on a [`Bvh`] with `n` cubes.
    fn intersect_n_cubes(n: usize, b: &mut ::test::Bencher) {
        let bounds = default_bounds();
        let triangles = create_n_cubes(n, &bounds);
        let bvh = TBvh3::build(&triangles);

        let mut seed = 0;
        b.iter(|| {
            let ray = create_ray(&mut seed, &bounds);
            bvh.intersect(&ray, &triangles)
        });
    }

    #[bench]
    /// Benchmark intersecting 1,200 triangles using a [`Bvh`].
    fn bench_intersect_1200_triangles_bvh(b: &mut ::test::Bencher) {
        intersect_n_cubes(100, b);
    }

    #[bench]
    /// Benchmark intersecting 12,000 triangles using a [`Bvh`].
    fn bench_intersect_12k_triangles_bvh(b: &mut ::test::Bencher) {
        intersect_n_cubes(1_000, b);
    }

    #[bench]
    /// Benchmark intersecting 120,000 triangles using a [`Bvh`].
    fn bench_intersect_120k_triangles_bvh(b: &mut ::test::Bencher) {
        intersect_n_cubes(10_000, b);
    }
}
