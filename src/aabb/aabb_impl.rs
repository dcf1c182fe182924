//! Axis Aligned Bounding Boxes.

use nalgebra::{Point, SVector};
use std::fmt;
use std::ops::Index;

use crate::bounding_hierarchy::BHValue;

/// [`Aabb`] struct.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb<T: BHValue, const D: usize> {
    /// Minimum coordinates
    pub min: Point<T, D>,

    /// Maximum coordinates
    pub max: Point<T, D>,
}

impl<T: BHValue, const D: usize> fmt::Display for Aabb<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Min bound: {}; Max bound: {}", self.min, self.max)
    }
}

/// A trait implemented by things which can be bounded by an [`Aabb`].
pub trait Bounded<T: BHValue, const D: usize> {
    /// Returns the geometric bounds of this object in the form of an [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::{Aabb, Bounded};
    /// use nalgebra::Point3;
    ///
    /// struct Something;
    ///
    /// impl Bounded<f32, 3> for Something {
    ///     fn aabb(&self) -> Aabb<f32, 3> {
    ///         let point1 = Point3::new(0.0, 0.0, 0.0);
    ///         let point2 = Point3::new(1.0, 1.0, 1.0);
    ///         Aabb::with_bounds(point1, point2)
    ///     }
    /// }
    ///
    /// let something = Something;
    /// let aabb = something.aabb();
    ///
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
    /// ```
    fn aabb(&self) -> Aabb<T, D>;
}

impl<T: BHValue, const D: usize> Aabb<T, D> {
    /// Creates a new [`Aabb`] with the given bounds.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.min.x, -1.0);
    /// assert_eq!(aabb.max.z, 1.0);
    /// ```
    pub fn with_bounds(min: Point<T, D>, max: Point<T, D>) -> Self {
        Aabb { min, max }
    }

    /// Creates a new empty [`Aabb`]. Its minimum is positive infinity and its maximum is
    /// negative infinity, so that joining it with anything yields that thing.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::<f32, 3>::empty();
    /// assert!(aabb.is_empty());
    /// assert!(!aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// ```
    pub fn empty() -> Self {
        Self {
            min: Point::from(SVector::<T, D>::from_element(T::infinity())),
            max: Point::from(SVector::<T, D>::from_element(T::neg_infinity())),
        }
    }

    /// Returns true if the [`Point`] is inside the [`Aabb`]. Points on the boundary count
    /// as inside.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    ///
    /// assert!(aabb.contains(&Point3::new(0.0, 0.5, -1.0)));
    /// assert!(!aabb.contains(&Point3::new(0.0, 2.0, 0.0)));
    /// ```
    pub fn contains(&self, p: &Point<T, D>) -> bool {
        (0..D).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Returns true if `other` lies entirely inside this [`Aabb`].
    ///
    /// An empty `other` is contained in everything.
    pub fn contains_aabb(&self, other: &Aabb<T, D>) -> bool {
        other.is_empty() || (self.contains(&other.min) && self.contains(&other.max))
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and `other`.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb1 = Aabb::with_bounds(Point3::new(-101.0, 0.0, 0.0), Point3::new(-100.0, 1.0, 1.0));
    /// let aabb2 = Aabb::with_bounds(Point3::new(100.0, 0.0, 0.0), Point3::new(101.0, 1.0, 1.0));
    /// let joint = aabb1.join(&aabb2);
    ///
    /// assert!(joint.contains(&Point3::new(0.0, 0.5, 0.5)));
    /// ```
    pub fn join(&self, other: &Aabb<T, D>) -> Aabb<T, D> {
        Aabb::with_bounds(
            Point::from(self.min.coords.inf(&other.min.coords)),
            Point::from(self.max.coords.sup(&other.max.coords)),
        )
    }

    /// Mutable version of [`Aabb::join`].
    pub fn join_mut(&mut self, other: &Aabb<T, D>) {
        *self = self.join(other);
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and the [`Point`]
    /// `other`.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::empty()
    ///     .grow(&Point3::new(1.0, 1.0, 1.0))
    ///     .grow(&Point3::new(-1.0, -1.0, -1.0));
    ///
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// ```
    pub fn grow(&self, other: &Point<T, D>) -> Aabb<T, D> {
        Aabb::with_bounds(
            Point::from(self.min.coords.inf(&other.coords)),
            Point::from(self.max.coords.sup(&other.coords)),
        )
    }

    /// Mutable version of [`Aabb::grow`].
    pub fn grow_mut(&mut self, other: &Point<T, D>) {
        *self = self.grow(other);
    }

    /// Returns the size of this [`Aabb`] in all dimensions.
    pub fn size(&self) -> SVector<T, D> {
        self.max - self.min
    }

    /// Returns the center [`Point`] of the [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 3.0, 1.0));
    /// assert_eq!(aabb.center(), Point3::new(0.0, 1.0, 0.0));
    /// ```
    pub fn center(&self) -> Point<T, D> {
        let two = T::one() + T::one();
        Point::from((self.min.coords + self.max.coords).map(|x| x / two))
    }

    /// Returns true if the [`Aabb`] is empty, i.e. its minimum exceeds its maximum
    /// along some axis.
    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.min[i] > self.max[i])
    }

    /// Returns true if the [`Aabb`] has no extent along any axis. This holds for a box
    /// around a single point, and for the empty box.
    pub fn has_zero_extent(&self) -> bool {
        (0..D).all(|i| self.max[i] - self.min[i] <= T::zero())
    }

    /// Returns the axis along which the [`Aabb`] is stretched the most.
    /// Ties go to the lower axis.
    ///
    /// # Examples
    /// ```
    /// use linear_bvh::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 3.0, 3.0));
    /// assert_eq!(aabb.largest_axis(), 1);
    /// ```
    pub fn largest_axis(&self) -> usize {
        let size = self.size();
        let mut axis = 0;
        for i in 1..D {
            if size[i] > size[axis] {
                axis = i;
            }
        }
        axis
    }

    /// Returns the squared distance from `point` to the closest point of the [`Aabb`].
    /// Zero if the point is inside.
    pub fn distance_squared(&self, point: &Point<T, D>) -> T {
        let mut distance_squared = T::zero();
        for i in 0..D {
            let clamped = point[i].max(self.min[i]).min(self.max[i]);
            let delta = point[i] - clamped;
            distance_squared += delta * delta;
        }
        distance_squared
    }
}

impl<T: BHValue, const D: usize> Default for Aabb<T, D> {
    fn default() -> Aabb<T, D> {
        Aabb::empty()
    }
}

/// Make [`Aabb`]s indexable. `aabb[0]` gives a reference to the minimum bound.
/// All other indices return a reference to the maximum bound.
impl<T: BHValue, const D: usize> Index<usize> for Aabb<T, D> {
    type Output = Point<T, D>;

    fn index(&self, index: usize) -> &Point<T, D> {
        if index == 0 {
            &self.min
        } else {
            &self.max
        }
    }
}

/// Implementation of [`Bounded`] for [`Aabb`].
impl<T: BHValue, const D: usize> Bounded<T, D> for Aabb<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        *self
    }
}

/// Implementation of [`Bounded`] for [`Point`]s.
impl<T: BHValue, const D: usize> Bounded<T, D> for Point<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        Aabb::with_bounds(*self, *self)
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::Bounded;
    use crate::testbase::{tuple_to_point, tuplevec_small_strategy, TAabb3, TPoint3, TupleVec};
    use proptest::prelude::*;

    #[test]
    fn test_largest_axis_prefers_lower_axis_on_ties() {
        let cube = TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(2.0, 2.0, 2.0));
        assert_eq!(cube.largest_axis(), 0);

        let slab = TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(1.0, 2.0, 2.0));
        assert_eq!(slab.largest_axis(), 1);

        let rod = TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(1.0, 1.0, 5.0));
        assert_eq!(rod.largest_axis(), 2);
    }

    #[test]
    fn test_zero_extent() {
        let point = TPoint3::new(1.0, 2.0, 3.0);
        assert!(point.aabb().has_zero_extent());
        assert!(!point.aabb().is_empty());
        assert!(TAabb3::empty().has_zero_extent());

        let flat = TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 1.0), TPoint3::new(1.0, 1.0, 1.0));
        assert!(!flat.has_zero_extent());
    }

    #[test]
    fn test_join_with_empty_is_identity() {
        let aabb = TAabb3::with_bounds(TPoint3::new(-1.0, 0.0, 2.0), TPoint3::new(3.0, 4.0, 5.0));
        assert_eq!(TAabb3::empty().join(&aabb), aabb);
        assert_eq!(aabb.join(&TAabb3::empty()), aabb);
    }

    #[test]
    fn test_distance_squared() {
        let aabb = TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(1.0, 1.0, 1.0));
        assert_eq!(aabb.distance_squared(&TPoint3::new(0.5, 0.5, 0.5)), 0.0);
        assert_eq!(aabb.distance_squared(&TPoint3::new(3.0, 0.5, 0.5)), 4.0);
        assert_eq!(aabb.distance_squared(&TPoint3::new(2.0, 2.0, 0.5)), 2.0);
    }

    proptest! {
        // Test whether an empty `Aabb` does not contains anything.
        #[test]
        fn test_empty_contains_nothing(tpl in tuplevec_small_strategy()) {
            let p = tuple_to_point(&tpl);
            let aabb = TAabb3::empty();

            prop_assert!(!aabb.contains(&p));
        }

        // Test whether an `Aabb` always contains its center.
        #[test]
        fn test_aabb_contains_center(a in tuplevec_small_strategy(), b in tuplevec_small_strategy()) {
            let p1 = tuple_to_point(&a);
            let p2 = tuple_to_point(&b);
            let aabb = TAabb3::empty().grow(&p1).join(&p2.aabb());

            prop_assert!(aabb.contains(&aabb.center()));
        }

        // Test whether the joint of two point-sets contains all the points.
        #[test]
        fn test_join_two_aabbs(a in prop::array::uniform5(tuplevec_small_strategy()),
                               b in prop::array::uniform5(tuplevec_small_strategy())) {
            let points = a.iter().chain(b.iter()).map(tuple_to_point).collect::<Vec<TPoint3>>();

            let aabb1 = points.iter().take(5).fold(TAabb3::empty(), |aabb, point| aabb.grow(point));
            let aabb2 = points.iter().skip(5).fold(TAabb3::empty(), |aabb, point| aabb.grow(point));
            let joint = aabb1.join(&aabb2);

            prop_assert!(points.iter().take(5).all(|point| aabb1.contains(point)));
            prop_assert!(points.iter().skip(5).all(|point| aabb2.contains(point)));
            prop_assert!(points.iter().all(|point| joint.contains(point)));
            prop_assert!(joint.contains_aabb(&aabb1) && joint.contains_aabb(&aabb2));
        }

        // Test whether the size of an `Aabb` is never negative along any axis.
        #[test]
        fn test_size_non_negative(points in prop::collection::vec(tuplevec_small_strategy(), 1..10)) {
            let aabb = points
                .iter()
                .map(|tpl: &TupleVec| tuple_to_point(tpl))
                .fold(TAabb3::empty(), |aabb, point| aabb.grow(&point));
            let size = aabb.size();

            prop_assert!(size.x >= 0.0 && size.y >= 0.0 && size.z >= 0.0);
        }
    }
}
