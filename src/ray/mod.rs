//! This module holds the [`Ray`] definition, the slab test against [`Aabb`]s and the
//! triangle intersection.
//!
//! [`Aabb`]: crate::aabb::Aabb
mod intersect_default;
mod ray_impl;

pub use self::intersect_default::RayIntersection;
pub use self::ray_impl::*;
