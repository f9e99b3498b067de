//! Ray-casting related definitions and implementations.

#[doc(inline)]
pub use self::ray::Ray;
pub use self::ray_aabb::{ray_slab_test, InvRay};
pub use self::ray_triangle::ray_triangle_intersection;

#[doc(hidden)]
pub mod ray;
mod ray_aabb;
mod ray_triangle;
