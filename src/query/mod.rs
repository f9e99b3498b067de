//! Ray queries against the primitives indexed by a bounding volume hierarchy.

pub use self::ray::{ray_slab_test, ray_triangle_intersection, InvRay, Ray};

pub mod ray;
