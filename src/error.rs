//! Error types for hierarchies and meshes handed in from outside, such as a [`Bvh`] restored
//! from a cache. Building from shapes and querying never fail.
//!
//! [`Bvh`]: crate::bvh::Bvh

use thiserror::Error;

/// Errors reported when checking a [`Bvh`](crate::bvh::Bvh) or a
/// [`TriangleMesh`](crate::mesh::TriangleMesh) for consistency.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BvhError {
    /// The node array is empty. Even a hierarchy over no primitives has a root leaf.
    #[error("hierarchy has no nodes")]
    Empty,

    /// An interior node points at a second child outside of the node array.
    #[error("node {node} points at second child {offset}, but there are only {len} nodes")]
    OffsetOutOfRange {
        /// Index of the offending node.
        node: usize,
        /// The stored second child offset.
        offset: usize,
        /// Number of nodes in the hierarchy.
        len: usize,
    },

    /// The nodes are not laid out in depth-first pre-order.
    #[error("node {node} should place its second child at {expected}, found {found}")]
    BrokenLayout {
        /// Index of the offending node.
        node: usize,
        /// The offset implied by the size of the first subtree.
        expected: usize,
        /// The stored second child offset.
        found: usize,
    },

    /// An interior node records a split axis the hierarchy does not have.
    #[error("node {node} splits along axis {axis}, but the hierarchy has {dimensions} dimensions")]
    InvalidAxis {
        /// Index of the offending node.
        node: usize,
        /// The stored axis.
        axis: usize,
        /// Dimensionality of the hierarchy.
        dimensions: usize,
    },

    /// A leaf references primitives outside of the ordered index array.
    #[error("leaf {node} covers [{first}, {end}), but there are only {len} ordered indices")]
    LeafOutOfRange {
        /// Index of the offending leaf.
        node: usize,
        /// First ordered index covered by the leaf.
        first: usize,
        /// One past the last ordered index covered by the leaf.
        end: usize,
        /// Length of the ordered index array.
        len: usize,
    },

    /// The tree walk from the root ended before the last node.
    #[error("{count} nodes are not reachable from the root")]
    UnreachableNodes {
        /// Number of trailing nodes that were never visited.
        count: usize,
    },

    /// The ordered index array is not a permutation of `0..len`.
    #[error("ordered index {index} appears twice or is out of range")]
    NotAPermutation {
        /// The first offending primitive index.
        index: usize,
    },

    /// The leaves do not cover the ordered index array exactly once.
    #[error("ordered index slot {slot} is not covered by exactly one leaf")]
    UncoveredPrimitive {
        /// The first slot that is covered zero or several times.
        slot: usize,
    },

    /// The hierarchy was built over a different number of primitives.
    #[error("hierarchy indexes {expected} primitives, but {found} were given")]
    PrimitiveCountMismatch {
        /// Number of primitives in the hierarchy.
        expected: usize,
        /// Number of primitives passed in.
        found: usize,
    },

    /// A node box does not match the union of what lies below it.
    #[error("the box of node {node} is not the union of its contents")]
    BoundsMismatch {
        /// Index of the offending node.
        node: usize,
    },

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {vertex}, but there are only {len} vertices")]
    VertexOutOfRange {
        /// Index of the offending triangle.
        triangle: usize,
        /// The referenced vertex.
        vertex: u32,
        /// Number of vertices in the mesh.
        len: usize,
    },
}

/// Result type for consistency checks.
pub type Result<T> = std::result::Result<T, BvhError>;
