//! This module defines [`Bvh`] and functions for building it.

use std::time::Instant;

use log::{debug, log_enabled, Level};

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::BHValue;
use crate::bvh::{flatten, BuildArena, BuildOptions, LinearNode, PrimitiveRecord};

/// Largest number of primitives a [`Bvh`] can be built over. Node positions are stored in
/// 32 bits and a hierarchy over `n` primitives has up to `2n - 1` nodes.
pub const MAX_PRIMITIVES: usize = (u32::MAX / 2) as usize;

/// The closest intersection of a ray with the primitives of a [`Bvh`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<T> {
    /// Index of the hit primitive in the collection the [`Bvh`] was built over.
    pub primitive_index: usize,

    /// Parametric distance along the (normalized) ray direction.
    pub distance: T,
}

/// The [`Bvh`] data structure. Contains the linear node array and the order in which leaves
/// reference the primitives. It does not own the primitives themselves, queries are handed
/// either the primitive slice or a closure keyed by primitive index.
///
/// A [`Bvh`] never changes after construction. To reflect changes in the geometry, build a
/// new one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bvh<T: BHValue, const D: usize> {
    /// The nodes in depth-first pre-order. The root is at position 0.
    pub(crate) nodes: Vec<LinearNode<T, D>>,

    /// Primitive indices in leaf order. A leaf covers a contiguous range of this array.
    pub(crate) ordered_indices: Vec<usize>,
}

impl<T: BHValue, const D: usize> Bvh<T, D> {
    /// Creates a new [`Bvh`] from the `shapes` slice with the default [`BuildOptions`].
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use linear_bvh::bvh::Bvh;
    /// use nalgebra::Point3;
    ///
    /// let boxes = (0..3)
    ///     .map(|i| {
    ///         let x = i as f32 * 10.0;
    ///         Aabb::with_bounds(Point3::new(x - 0.5, -0.5, -0.5), Point3::new(x + 0.5, 0.5, 0.5))
    ///     })
    ///     .collect::<Vec<_>>();
    ///
    /// let bvh = Bvh::build(&boxes);
    /// assert_eq!(bvh.primitive_count(), 3);
    /// assert_eq!(bvh.node_count(), 5);
    /// ```
    pub fn build<Shape: Bounded<T, D>>(shapes: &[Shape]) -> Bvh<T, D> {
        Bvh::build_with_options(shapes, &BuildOptions::default())
    }

    /// Creates a new [`Bvh`] from the `shapes` slice.
    pub fn build_with_options<Shape: Bounded<T, D>>(
        shapes: &[Shape],
        options: &BuildOptions,
    ) -> Bvh<T, D> {
        Bvh::build_from_fn(shapes.len(), |i| shapes[i].aabb(), options)
    }

    /// Creates a new [`Bvh`] over `count` primitives whose boxes are given by `bounds_of`.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds [`MAX_PRIMITIVES`].
    pub fn build_from_fn<F: FnMut(usize) -> Aabb<T, D>>(
        count: usize,
        bounds_of: F,
        options: &BuildOptions,
    ) -> Bvh<T, D> {
        let records = PrimitiveRecord::collect(count, bounds_of);
        Bvh::from_records(records, options, BuildArena::build)
    }

    /// Creates a new [`Bvh`] from the `shapes` slice, building large subtrees in parallel.
    /// The result is identical to the one of [`Bvh::build`].
    #[cfg(feature = "rayon")]
    pub fn build_par<Shape: Bounded<T, D>>(shapes: &[Shape]) -> Bvh<T, D> {
        Bvh::build_par_with_options(shapes, &BuildOptions::default())
    }

    /// Creates a new [`Bvh`] from the `shapes` slice, building subtrees of at least
    /// [`BuildOptions::parallel_threshold`] primitives in parallel.
    #[cfg(feature = "rayon")]
    pub fn build_par_with_options<Shape: Bounded<T, D>>(
        shapes: &[Shape],
        options: &BuildOptions,
    ) -> Bvh<T, D> {
        let records = PrimitiveRecord::collect(shapes.len(), |i| shapes[i].aabb());
        Bvh::from_records(records, options, BuildArena::build_par)
    }

    fn from_records(
        mut records: Vec<PrimitiveRecord<T, D>>,
        options: &BuildOptions,
        build_arena: fn(&mut [PrimitiveRecord<T, D>], &BuildOptions) -> BuildArena<T, D>,
    ) -> Bvh<T, D> {
        assert!(
            records.len() <= MAX_PRIMITIVES,
            "cannot build a hierarchy over {} primitives",
            records.len()
        );

        let start = Instant::now();
        let arena = build_arena(&mut records, options);
        let ordered_indices = records.iter().map(|record| record.index).collect();
        let (nodes, _) = flatten(arena);
        let bvh = Bvh {
            nodes,
            ordered_indices,
        };

        if log_enabled!(Level::Debug) {
            debug!(
                "built hierarchy over {} primitives: {} nodes, depth {}, took {:?}",
                bvh.primitive_count(),
                bvh.node_count(),
                bvh.depth(),
                start.elapsed()
            );
        }
        bvh
    }

    /// The linear node array, in depth-first pre-order.
    pub fn nodes(&self) -> &[LinearNode<T, D>] {
        &self.nodes
    }

    /// Primitive indices in leaf order.
    pub fn ordered_indices(&self) -> &[usize] {
        &self.ordered_indices
    }

    /// Number of primitives the [`Bvh`] was built over.
    pub fn primitive_count(&self) -> usize {
        self.ordered_indices.len()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the [`Bvh`] holds no primitives. Every query on it misses.
    pub fn is_empty(&self) -> bool {
        self.ordered_indices.is_empty()
    }

    /// The box around every primitive. Empty if there are no primitives.
    pub fn root_aabb(&self) -> Aabb<T, D> {
        self.nodes
            .first()
            .map_or_else(Aabb::empty, |root| *root.aabb())
    }

    /// Number of edges on the longest path from the root to a leaf. A single leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0, 0)];
        while let Some((index, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            max_depth = max_depth.max(depth);
            if let Some(children) = node.children(index) {
                stack.extend(children.map(|child| (child, depth + 1)));
            }
        }
        max_depth
    }

    /// Primitive indices held by the node at `node_index`. Empty for interior nodes.
    ///
    /// # Panics
    ///
    /// Panics if `node_index` is out of bounds.
    pub fn leaf_primitives(&self, node_index: usize) -> &[usize] {
        match self.nodes[node_index].primitive_range() {
            Some(range) => &self.ordered_indices[range],
            None => &[],
        }
    }

    /// Prints the [`Bvh`] in a tree-like visualization.
    pub fn pretty_print(&self) {
        print!("{}", self.pretty_string());
    }

    /// Returns the tree-like visualization printed by [`Bvh::pretty_print`].
    pub fn pretty_string(&self) -> String {
        let mut out = String::new();
        if !self.nodes.is_empty() {
            self.print_node(0, 0, &mut out);
        }
        out
    }

    fn print_node(&self, node_index: usize, depth: usize, out: &mut String) {
        use std::fmt::Write;

        let padding = " ".repeat(depth);
        let node = &self.nodes[node_index];
        // Writing to a `String` cannot fail.
        match *node {
            LinearNode::Interior { axis, aabb, .. } => {
                let _ = writeln!(out, "{padding}node={node_index} axis={axis} {aabb}");
                if let Some([first, second]) = node.children(node_index) {
                    self.print_node(first, depth + 1, out);
                    self.print_node(second, depth + 1, out);
                }
            }
            LinearNode::Leaf { aabb, .. } => {
                let _ = writeln!(
                    out,
                    "{padding}leaf={node_index} primitives={:?} {aabb}",
                    self.leaf_primitives(node_index)
                );
            }
        }
    }
}


#[cfg(all(feature = "bench", test))]
mod bench {
    use crate::testbase::{create_n_cubes, default_bounds, TBvh3};

    /// Benchmark the construction of a [`Bvh`] with `n` cubes (12 triangles each).
    fn build_n_cubes_bvh(n: usize, b: &mut ::test::Bencher) {
        let triangles = create_n_cubes(n, &default_bounds());
        b.iter(|| TBvh3::build(&triangles));
    }

    #[bench]
    /// Benchmark the construction of a [`Bvh`] with 1,200 triangles.
    fn bench_build_1200_triangles_bvh(b: &mut ::test::Bencher) {
        build_n_cubes_bvh(100, b);
    }

    #[bench]
    /// Benchmark the construction of a [`Bvh`] with 12,000 triangles.
    fn bench_build_12k_triangles_bvh(b: &mut ::test::Bencher) {
        build_n_cubes_bvh(1_000, b);
    }

    #[bench]
    /// Benchmark the construction of a [`Bvh`] with 120,000 triangles.
    fn bench_build_120k_triangles_bvh(b: &mut ::test::Bencher) {
        build_n_cubes_bvh(10_000, b);
    }

    #[cfg(feature = "rayon")]
    #[bench]
    /// Benchmark the parallel construction of a [`Bvh`] with 120,000 triangles.
    fn bench_build_120k_triangles_bvh_par(b: &mut ::test::Bencher) {
        let triangles = create_n_cubes(10_000, &default_bounds());
        b.iter(|| TBvh3::build_par(&triangles));
    }
}
