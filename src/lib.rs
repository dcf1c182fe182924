#![cfg_attr(feature = "bench", feature(test))]
//! A crate which exports rays, axis-aligned bounding boxes, and a static binary bounding
//! volume hierarchy stored as a linear array of nodes.
//!
//! ## About
//!
//! This crate can be used for applications which contain intersection computations of rays
//! with primitives, or containment tests of points against primitives. The [`Bvh`] is built
//! once from a fixed set of primitives: the primitives are recursively partitioned around
//! the midpoint of their centroids into a temporary tree, and that tree is then flattened in
//! depth-first pre-order into a single array, so that the first child of every interior node
//! immediately follows its parent. Queries walk that array front-to-back.
//!
//! The hierarchy is immutable. To reflect changes in the geometry, build a new one.
//!
//! ## Example
//!
//! ```
//! use linear_bvh::aabb::{Aabb, Bounded};
//! use linear_bvh::bounding_hierarchy::RayHit;
//! use linear_bvh::bvh::Bvh;
//! use linear_bvh::ray::Ray;
//! use nalgebra::{Point3, Vector3};
//!
//! struct Crate {
//!     position: Point3<f32>,
//! }
//!
//! impl Bounded<f32, 3> for Crate {
//!     fn aabb(&self) -> Aabb<f32, 3> {
//!         let half_size = Vector3::new(0.5, 0.5, 0.5);
//!         Aabb::with_bounds(self.position - half_size, self.position + half_size)
//!     }
//! }
//!
//! impl RayHit<f32, 3> for Crate {
//!     fn ray_hit(&self, ray: &Ray<f32, 3>) -> Option<f32> {
//!         self.aabb().ray_hit(ray)
//!     }
//! }
//!
//! let crates = (0..100)
//!     .map(|i| Crate { position: Point3::new(i as f32 * 2.0, 0.0, 0.0) })
//!     .collect::<Vec<_>>();
//! let bvh = Bvh::build(&crates);
//!
//! let ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
//! let hit = bvh.intersect(&ray, &crates).unwrap();
//! assert_eq!(hit.primitive_index, 0);
//! assert!((hit.distance - 9.5).abs() < 1e-5);
//! ```
//!
//! ## Features
//!
//! - `rayon` (default **enabled**) - adds [`Bvh::build_par`], which builds independent
//!   subtrees in parallel
//! - `serde` (default **disabled**) - adds `Serialize` and `Deserialize` implementations for
//!   the hierarchy, so that a build can be cached and restored with [`Bvh::from_parts`]
//! - `bench` (default **disabled**) - enables the nightly benchmarks
//!
//! [`Bvh`]: bvh::Bvh
//! [`Bvh::build_par`]: bvh::Bvh::build_par
//! [`Bvh::from_parts`]: bvh::Bvh::from_parts

#[cfg(all(feature = "bench", test))]
extern crate test;

pub mod aabb;
pub mod bounding_hierarchy;
pub mod bvh;
pub mod error;
pub mod mesh;
pub mod ray;
pub mod shapes;
mod utils;

#[cfg(test)]
mod testbase;
