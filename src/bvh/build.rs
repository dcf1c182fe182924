//! Construction of the temporary build tree.
//!
//! The build works on one [`PrimitiveRecord`] per primitive. Records are partitioned in place,
//! so that once the build finishes every leaf covers a contiguous range of the record array and
//! the order of the records is the order of the primitive indices in the final [`Bvh`].
//!
//! [`Bvh`]: super::Bvh

use std::cmp::Ordering;

use log::trace;
use nalgebra::Point;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BHValue;
use crate::bvh::BuildOptions;
use crate::utils::partition_in_place;

/// Build time information about a single primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveRecord<T: BHValue, const D: usize> {
    /// Index of the primitive in the caller's collection.
    pub index: usize,

    /// The primitive's bounding box.
    pub aabb: Aabb<T, D>,

    /// Center of `aabb`. Splits are decided on centroids.
    pub centroid: Point<T, D>,
}

impl<T: BHValue, const D: usize> PrimitiveRecord<T, D> {
    /// Creates the record of primitive `index` bounded by `aabb`.
    pub fn new(index: usize, aabb: Aabb<T, D>) -> Self {
        PrimitiveRecord {
            index,
            aabb,
            centroid: aabb.center(),
        }
    }

    /// Creates one record for every primitive in `0..count`, asking `bounds_of` for the box of
    /// each.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use linear_bvh::bvh::PrimitiveRecord;
    /// use nalgebra::Point3;
    ///
    /// let records = PrimitiveRecord::collect(2, |i| {
    ///     let x = i as f32 * 10.0;
    ///     Aabb::with_bounds(Point3::new(x, 0.0, 0.0), Point3::new(x + 2.0, 2.0, 2.0))
    /// });
    /// assert_eq!(records[1].index, 1);
    /// assert_eq!(records[1].centroid, Point3::new(11.0, 1.0, 1.0));
    /// ```
    pub fn collect<F: FnMut(usize) -> Aabb<T, D>>(count: usize, mut bounds_of: F) -> Vec<Self> {
        (0..count)
            .map(|index| PrimitiveRecord::new(index, bounds_of(index)))
            .collect()
    }
}

/// Returns the union of the boxes of `records` and the box around their centroids.
/// Both are empty if `records` is.
pub fn joint_bounds<T: BHValue, const D: usize>(
    records: &[PrimitiveRecord<T, D>],
) -> (Aabb<T, D>, Aabb<T, D>) {
    let mut aabb = Aabb::empty();
    let mut centroid_aabb = Aabb::empty();
    for record in records {
        aabb.join_mut(&record.aabb);
        centroid_aabb.grow_mut(&record.centroid);
    }
    (aabb, centroid_aabb)
}

/// A node of the build tree. Children are referenced by their index in the [`BuildArena`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuildNode<T: BHValue, const D: usize> {
    /// A node holding the records `first_offset..first_offset + count`.
    Leaf {
        /// Union of the boxes of the covered primitives.
        aabb: Aabb<T, D>,
        /// Position of the first covered record.
        first_offset: usize,
        /// Number of covered records.
        count: usize,
    },
    /// A node with exactly two children.
    Interior {
        /// Union of the boxes of both children.
        aabb: Aabb<T, D>,
        /// The axis the primitives were split along.
        axis: usize,
        /// Arena indices of the first and second child.
        children: [usize; 2],
    },
}

impl<T: BHValue, const D: usize> BuildNode<T, D> {
    /// Returns the box of this node.
    pub fn aabb(&self) -> &Aabb<T, D> {
        match self {
            BuildNode::Leaf { aabb, .. } | BuildNode::Interior { aabb, .. } => aabb,
        }
    }
}

/// Owns every node of a build tree. A node's children are always pushed before the node
/// itself, so the root is the last node.
#[derive(Debug, Clone, Default)]
pub struct BuildArena<T: BHValue, const D: usize> {
    nodes: Vec<BuildNode<T, D>>,
}

/// What to do with a range of records.
enum Step<T: BHValue, const D: usize> {
    Leaf(Aabb<T, D>),
    Split {
        aabb: Aabb<T, D>,
        axis: usize,
        mid: usize,
    },
}

impl<T: BHValue, const D: usize> BuildArena<T, D> {
    /// Creates an arena with room for the tree over `primitive_count` primitives, which has
    /// at most `2 * primitive_count - 1` nodes.
    pub fn with_capacity(primitive_count: usize) -> Self {
        BuildArena {
            nodes: Vec::with_capacity((2 * primitive_count).max(2) - 1),
        }
    }

    /// Builds the tree over `records`, reordering them so that every leaf covers a contiguous
    /// range.
    ///
    /// An empty `records` yields a single leaf with an empty box that covers nothing.
    pub fn build(records: &mut [PrimitiveRecord<T, D>], options: &BuildOptions) -> Self {
        let mut arena = BuildArena::with_capacity(records.len());
        build_subtree(&mut arena, records, 0, options);
        arena
    }

    /// Same as [`BuildArena::build`], but builds the two halves of large splits on separate
    /// threads. The result is identical to the one of [`BuildArena::build`].
    #[cfg(feature = "rayon")]
    pub fn build_par(records: &mut [PrimitiveRecord<T, D>], options: &BuildOptions) -> Self {
        let mut arena = BuildArena::with_capacity(records.len());
        build_subtree_par(&mut arena, records, 0, options);
        arena
    }

    /// Adds `node` and returns its index.
    pub fn push(&mut self, node: BuildNode<T, D>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Moves every node of `other` behind the nodes of `self`, rewriting child indices.
    /// Returns the offset that was added to the indices of `other`.
    pub fn append(&mut self, other: BuildArena<T, D>) -> usize {
        let shift = self.nodes.len();
        self.nodes.extend(other.nodes.into_iter().map(|node| match node {
            BuildNode::Interior {
                aabb,
                axis,
                children,
            } => BuildNode::Interior {
                aabb,
                axis,
                children: [children[0] + shift, children[1] + shift],
            },
            leaf => leaf,
        }));
        shift
    }

    /// Index of the root node, [`None`] if nothing was built yet.
    pub fn root(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn node(&self, index: usize) -> &BuildNode<T, D> {
        &self.nodes[index]
    }
}

/// Decides between a leaf and a split for `records`. On a split, `records` is reordered so that
/// the first `mid` records form the first child.
fn next_step<T: BHValue, const D: usize>(
    records: &mut [PrimitiveRecord<T, D>],
    options: &BuildOptions,
) -> Step<T, D> {
    let (aabb, centroid_aabb) = joint_bounds(records);
    let count = records.len();

    // A leaf stores its primitive count in eight bits.
    if count <= options.leaf_limit()
        || (aabb.has_zero_extent() && count <= usize::from(u8::MAX))
    {
        return Step::Leaf(aabb);
    }

    let axis = centroid_aabb.largest_axis();
    let split = centroid_aabb.center()[axis];
    let mut mid = partition_in_place(records, |record| record.centroid[axis] < split);

    if mid == 0 || mid == count {
        trace!(
            "midpoint split of {} primitives along axis {} is degenerate, splitting at the median",
            count,
            axis
        );
        mid = count / 2;
        records.select_nth_unstable_by(mid, |a, b| {
            a.centroid[axis]
                .partial_cmp(&b.centroid[axis])
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
    }

    Step::Split { aabb, axis, mid }
}

/// Builds the subtree over `records`, the first of which sits at `first_offset` in the full
/// record array. Returns the arena index of the subtree root.
pub(crate) fn build_subtree<T: BHValue, const D: usize>(
    arena: &mut BuildArena<T, D>,
    records: &mut [PrimitiveRecord<T, D>],
    first_offset: usize,
    options: &BuildOptions,
) -> usize {
    match next_step(records, options) {
        Step::Leaf(aabb) => arena.push(BuildNode::Leaf {
            aabb,
            first_offset,
            count: records.len(),
        }),
        Step::Split { aabb, axis, mid } => {
            let (first, second) = records.split_at_mut(mid);
            let first_child = build_subtree(arena, first, first_offset, options);
            let second_child = build_subtree(arena, second, first_offset + mid, options);
            arena.push(BuildNode::Interior {
                aabb,
                axis,
                children: [first_child, second_child],
            })
        }
    }
}

/// Parallel counterpart of [`build_subtree`]. The second half of a split is built into a
/// private arena, which is appended once both halves are done. This yields the exact node
/// order of the sequential build.
#[cfg(feature = "rayon")]
pub(crate) fn build_subtree_par<T: BHValue, const D: usize>(
    arena: &mut BuildArena<T, D>,
    records: &mut [PrimitiveRecord<T, D>],
    first_offset: usize,
    options: &BuildOptions,
) -> usize {
    if records.len() < options.parallel_threshold {
        return build_subtree(arena, records, first_offset, options);
    }

    match next_step(records, options) {
        Step::Leaf(aabb) => arena.push(BuildNode::Leaf {
            aabb,
            first_offset,
            count: records.len(),
        }),
        Step::Split { aabb, axis, mid } => {
            let (first, second) = records.split_at_mut(mid);
            let mut second_arena = BuildArena::with_capacity(second.len());
            let (first_child, second_child) = rayon::join(
                || build_subtree_par(arena, first, first_offset, options),
                || build_subtree_par(&mut second_arena, second, first_offset + mid, options),
            );
            let shift = arena.append(second_arena);
            arena.push(BuildNode::Interior {
                aabb,
                axis,
                children: [first_child, second_child + shift],
            })
        }
    }
}
