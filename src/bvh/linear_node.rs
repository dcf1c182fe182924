use crate::aabb::Aabb;
use crate::bounding_hierarchy::BHValue;

/// A node of the linear node array of a [`Bvh`](super::Bvh).
///
/// Nodes are stored in depth-first pre-order. The first child of an interior node is always
/// the node right after it, only the position of the second child is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinearNode<T: BHValue, const D: usize> {
    /// A node holding the primitives found at
    /// `ordered_indices[first_offset..first_offset + count]`.
    Leaf {
        /// Union of the boxes of the covered primitives.
        aabb: Aabb<T, D>,
        /// Position of the first covered entry in the ordered index array.
        first_offset: u32,
        /// Number of covered primitives.
        count: u8,
    },
    /// A node with exactly two children.
    Interior {
        /// Union of the boxes of both children.
        aabb: Aabb<T, D>,
        /// Position of the second child in the node array.
        second_child_offset: u32,
        /// The axis the primitives were split along.
        axis: u8,
    },
}

impl<T: BHValue, const D: usize> LinearNode<T, D> {
    /// Returns the box of this node.
    pub fn aabb(&self) -> &Aabb<T, D> {
        match self {
            LinearNode::Leaf { aabb, .. } | LinearNode::Interior { aabb, .. } => aabb,
        }
    }

    /// Returns true if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, LinearNode::Leaf { .. })
    }

    /// Returns the range of the ordered index array a leaf covers, [`None`] for interior nodes.
    pub fn primitive_range(&self) -> Option<std::ops::Range<usize>> {
        match *self {
            LinearNode::Leaf {
                first_offset,
                count,
                ..
            } => {
                let first = first_offset as usize;
                Some(first..first + count as usize)
            }
            LinearNode::Interior { .. } => None,
        }
    }

    /// Returns the positions of both children of an interior node found at `index`, [`None`]
    /// for leaves.
    pub fn children(&self, index: usize) -> Option<[usize; 2]> {
        match *self {
            LinearNode::Interior {
                second_child_offset,
                ..
            } => Some([index + 1, second_child_offset as usize]),
            LinearNode::Leaf { .. } => None,
        }
    }
}
