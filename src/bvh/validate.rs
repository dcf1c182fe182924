//! Consistency checks for hierarchies that did not come straight out of a build, such as one
//! deserialized from a cache.

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::BHValue;
use crate::bvh::{Bvh, LinearNode};
use crate::error::{BvhError, Result};

impl<T: BHValue, const D: usize> Bvh<T, D> {
    /// Creates a [`Bvh`] from a node array and an ordered index array, as returned by
    /// [`Bvh::into_parts`]. The parts are checked with [`Bvh::validate`].
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use linear_bvh::bvh::{Bvh, LinearNode};
    /// use linear_bvh::error::BvhError;
    /// use nalgebra::Point3;
    ///
    /// let boxes = vec![
    ///     Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
    ///     Aabb::with_bounds(Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 1.0, 1.0)),
    /// ];
    /// let (nodes, ordered_indices) = Bvh::build(&boxes).into_parts();
    /// assert!(Bvh::from_parts(nodes.clone(), ordered_indices).is_ok());
    ///
    /// // Both primitives listed twice.
    /// assert_eq!(
    ///     Bvh::from_parts(nodes, vec![0, 0]),
    ///     Err(BvhError::NotAPermutation { index: 0 })
    /// );
    /// ```
    pub fn from_parts(nodes: Vec<LinearNode<T, D>>, ordered_indices: Vec<usize>) -> Result<Self> {
        let bvh = Bvh {
            nodes,
            ordered_indices,
        };
        bvh.validate()?;
        Ok(bvh)
    }

    /// Splits the [`Bvh`] into its node array and its ordered index array.
    pub fn into_parts(self) -> (Vec<LinearNode<T, D>>, Vec<usize>) {
        (self.nodes, self.ordered_indices)
    }

    /// Checks the structure of the [`Bvh`]: the nodes form a single binary tree laid out in
    /// depth-first pre-order, every split axis exists, the ordered indices are a permutation
    /// and every ordered index slot is covered by exactly one leaf.
    pub fn validate(&self) -> Result<()> {
        let len = self.nodes.len();
        if len == 0 {
            return Err(BvhError::Empty);
        }

        let primitive_count = self.ordered_indices.len();
        let mut seen = vec![false; primitive_count];
        for &index in &self.ordered_indices {
            if index >= primitive_count || seen[index] {
                return Err(BvhError::NotAPermutation { index });
            }
            seen[index] = true;
        }

        // Walking in pre-order must visit the nodes at 0, 1, 2, ... in turn. Each stack entry
        // is a claimed child position and the node that claimed it.
        let mut covered = vec![0u32; primitive_count];
        let mut next = 0;
        let mut stack = vec![(0, 0)];
        while let Some((claimed, parent)) = stack.pop() {
            if claimed >= len {
                return Err(BvhError::OffsetOutOfRange {
                    node: parent,
                    offset: claimed,
                    len,
                });
            }
            if claimed != next {
                return Err(BvhError::BrokenLayout {
                    node: parent,
                    expected: next,
                    found: claimed,
                });
            }
            next += 1;

            match self.nodes[claimed] {
                LinearNode::Leaf {
                    first_offset,
                    count,
                    ..
                } => {
                    let first = first_offset as usize;
                    let end = first + count as usize;
                    if end > primitive_count {
                        return Err(BvhError::LeafOutOfRange {
                            node: claimed,
                            first,
                            end,
                            len: primitive_count,
                        });
                    }
                    for slot in &mut covered[first..end] {
                        *slot += 1;
                    }
                }
                LinearNode::Interior {
                    second_child_offset,
                    axis,
                    ..
                } => {
                    if axis as usize >= D {
                        return Err(BvhError::InvalidAxis {
                            node: claimed,
                            axis: axis as usize,
                            dimensions: D,
                        });
                    }
                    stack.push((second_child_offset as usize, claimed));
                    stack.push((claimed + 1, claimed));
                }
            }
        }

        if next != len {
            return Err(BvhError::UnreachableNodes { count: len - next });
        }
        if let Some(slot) = covered.iter().position(|&times| times != 1) {
            return Err(BvhError::UncoveredPrimitive { slot });
        }
        Ok(())
    }

    /// Checks the [`Bvh`] against the `shapes` it was built over: runs [`Bvh::validate`], then
    /// checks that every leaf box is the union of its shapes' boxes and every interior box the
    /// union of its children's boxes. It follows that the root box contains every shape.
    pub fn validate_bounds<Shape: Bounded<T, D>>(&self, shapes: &[Shape]) -> Result<()> {
        self.validate()?;
        if shapes.len() != self.primitive_count() {
            return Err(BvhError::PrimitiveCountMismatch {
                expected: self.primitive_count(),
                found: shapes.len(),
            });
        }

        // Children come after their parent, so a reverse walk sees them first.
        let mut expected = vec![Aabb::empty(); self.nodes.len()];
        for index in (0..self.nodes.len()).rev() {
            let node = &self.nodes[index];
            let aabb = match node.children(index) {
                Some([first, second]) => expected[first].join(&expected[second]),
                None => self
                    .leaf_primitives(index)
                    .iter()
                    .fold(Aabb::empty(), |aabb, &primitive_index| {
                        aabb.join(&shapes[primitive_index].aabb())
                    }),
            };
            if *node.aabb() != aabb {
                return Err(BvhError::BoundsMismatch { node: index });
            }
            expected[index] = aabb;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::Aabb;
    use crate::bvh::{Bvh, LinearNode};
    use crate::error::BvhError;
    use crate::testbase::{build_some_bvh, TAabb3, TBvh3, TPoint3, UnitBox};

    fn leaf(first_offset: u32, count: u8) -> LinearNode<f32, 3> {
        LinearNode::Leaf {
            aabb: Aabb::empty(),
            first_offset,
            count,
        }
    }

    fn interior(second_child_offset: u32, axis: u8) -> LinearNode<f32, 3> {
        LinearNode::Interior {
            aabb: Aabb::empty(),
            second_child_offset,
            axis,
        }
    }

    #[test]
    fn test_built_hierarchy_is_valid() {
        let (shapes, bvh) = build_some_bvh();
        assert_eq!(bvh.validate(), Ok(()));
        assert_eq!(bvh.validate_bounds(&shapes), Ok(()));

        let (nodes, ordered_indices) = bvh.clone().into_parts();
        assert_eq!(TBvh3::from_parts(nodes, ordered_indices), Ok(bvh));
    }

    #[test]
    fn test_empty_hierarchy_is_valid() {
        let bvh = TBvh3::build::<UnitBox>(&[]);
        assert_eq!(bvh.validate_bounds::<UnitBox>(&[]), Ok(()));
    }

    #[test]
    fn test_no_nodes() {
        assert_eq!(TBvh3::from_parts(vec![], vec![]), Err(BvhError::Empty));
    }

    #[test]
    fn test_not_a_permutation() {
        let nodes = vec![interior(2, 0), leaf(0, 1), leaf(1, 1)];
        assert_eq!(
            TBvh3::from_parts(nodes.clone(), vec![1, 1]),
            Err(BvhError::NotAPermutation { index: 1 })
        );
        assert_eq!(
            TBvh3::from_parts(nodes, vec![0, 2]),
            Err(BvhError::NotAPermutation { index: 2 })
        );
    }

    #[test]
    fn test_broken_layout() {
        // The second child of the root claims the slot of its first child.
        let nodes = vec![interior(1, 0), leaf(0, 1), leaf(1, 1)];
        assert_eq!(
            TBvh3::from_parts(nodes, vec![0, 1]),
            Err(BvhError::BrokenLayout {
                node: 0,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_offset_out_of_range() {
        let nodes = vec![interior(7, 0), leaf(0, 1), leaf(1, 1)];
        assert_eq!(
            TBvh3::from_parts(nodes, vec![0, 1]),
            Err(BvhError::OffsetOutOfRange {
                node: 0,
                offset: 7,
                len: 3
            })
        );
    }

    #[test]
    fn test_invalid_axis() {
        let nodes = vec![interior(2, 3), leaf(0, 1), leaf(1, 1)];
        assert_eq!(
            TBvh3::from_parts(nodes, vec![0, 1]),
            Err(BvhError::InvalidAxis {
                node: 0,
                axis: 3,
                dimensions: 3
            })
        );
    }

    #[test]
    fn test_leaf_out_of_range() {
        let nodes = vec![interior(2, 0), leaf(0, 1), leaf(1, 4)];
        assert_eq!(
            TBvh3::from_parts(nodes, vec![0, 1]),
            Err(BvhError::LeafOutOfRange {
                node: 2,
                first: 1,
                end: 5,
                len: 2
            })
        );
    }

    #[test]
    fn test_unreachable_and_uncovered() {
        let nodes = vec![leaf(0, 1), leaf(1, 1)];
        assert_eq!(
            TBvh3::from_parts(nodes, vec![0, 1]),
            Err(BvhError::UnreachableNodes { count: 1 })
        );

        let nodes = vec![interior(2, 0), leaf(0, 1), leaf(0, 1)];
        assert_eq!(
            TBvh3::from_parts(nodes, vec![0, 1]),
            Err(BvhError::UncoveredPrimitive { slot: 0 })
        );
    }

    #[test]
    fn test_bounds_mismatch() {
        let (mut shapes, bvh) = build_some_bvh();
        assert_eq!(
            bvh.validate_bounds(&shapes[1..]),
            Err(BvhError::PrimitiveCountMismatch {
                expected: 21,
                found: 20
            })
        );

        // Moving a shape breaks its leaf and every node above it.
        shapes[3].pos = TPoint3::new(100.0, 0.0, 0.0);
        let Err(BvhError::BoundsMismatch { node }) = bvh.validate_bounds(&shapes) else {
            panic!("expected a bounds mismatch");
        };
        assert_eq!(bvh.leaf_primitives(node), &[3]);
    }

    #[test]
    fn test_stale_box_in_restored_nodes() {
        let shapes = vec![
            TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(1.0, 1.0, 1.0)),
            TAabb3::with_bounds(TPoint3::new(4.0, 0.0, 0.0), TPoint3::new(5.0, 1.0, 1.0)),
        ];
        let (mut nodes, ordered_indices) = Bvh::build(&shapes).into_parts();
        if let LinearNode::Interior { aabb, .. } = &mut nodes[0] {
            aabb.max.x = 4.0;
        }
        let bvh = Bvh::from_parts(nodes, ordered_indices).unwrap();
        assert_eq!(
            bvh.validate_bounds(&shapes),
            Err(BvhError::BoundsMismatch { node: 0 })
        );
    }
}
