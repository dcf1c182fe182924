//! Turns a [`BuildArena`] into the linear node array of a [`Bvh`].
//!
//! [`Bvh`]: super::Bvh

use crate::bounding_hierarchy::BHValue;
use crate::bvh::{BuildArena, BuildNode, LinearNode};

/// Flattens `arena` in depth-first pre-order. Returns the node array and its length.
///
/// Interior nodes are written before their children, the first child directly follows its
/// parent and the parent's slot is patched with the position of the second child once the
/// first subtree is written.
///
/// The caller guarantees that node positions and record offsets fit into 32 bits and leaf
/// counts into 8 bits.
pub fn flatten<T: BHValue, const D: usize>(
    arena: BuildArena<T, D>,
) -> (Vec<LinearNode<T, D>>, usize) {
    let mut nodes = Vec::with_capacity(arena.len());
    if let Some(root) = arena.root() {
        flatten_node(&arena, root, &mut nodes);
    }
    let total = nodes.len();
    (nodes, total)
}

fn flatten_node<T: BHValue, const D: usize>(
    arena: &BuildArena<T, D>,
    index: usize,
    nodes: &mut Vec<LinearNode<T, D>>,
) {
    match *arena.node(index) {
        BuildNode::Leaf {
            aabb,
            first_offset,
            count,
        } => {
            debug_assert!(count <= usize::from(u8::MAX));
            nodes.push(LinearNode::Leaf {
                aabb,
                first_offset: first_offset as u32,
                count: count as u8,
            });
        }
        BuildNode::Interior {
            aabb,
            axis,
            children,
        } => {
            let slot = nodes.len();
            nodes.push(LinearNode::Interior {
                aabb,
                second_child_offset: 0,
                axis: axis as u8,
            });
            flatten_node(arena, children[0], nodes);
            let second = nodes.len() as u32;
            if let LinearNode::Interior {
                second_child_offset,
                ..
            } = &mut nodes[slot]
            {
                *second_child_offset = second;
            }
            flatten_node(arena, children[1], nodes);
        }
    }
}
