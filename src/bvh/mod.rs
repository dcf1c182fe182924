//! This module defines a [`Bvh`] stored as a linear array of nodes.
//!
//! A [`Bvh`] is built in two phases. First the primitives are recursively partitioned into a
//! temporary tree held in a [`BuildArena`], then that tree is flattened into the
//! [`LinearNode`] array which all queries run on.

mod build;
mod bvh_impl;
mod flatten;
mod iter;
mod linear_node;
mod options;
mod traverse;
mod validate;

pub use self::build::*;
pub use self::bvh_impl::*;
pub use self::flatten::*;
pub use self::iter::*;
pub use self::linear_node::*;
pub use self::options::*;
