//! Ready-made primitives. [`Aabb`](crate::aabb::Aabb) itself is a primitive as well.

mod ball;
mod triangle;

pub use self::ball::Ball;
pub use self::triangle::Triangle;
