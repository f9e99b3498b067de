/*!
meshbvh
========

**meshbvh** is a bounding volume hierarchy for 3-dimensional ray picking and
overlap queries against triangle meshes and sets of axis-aligned boxes, written
with the rust programming language.

The hierarchy is rebuilt from scratch whenever its input changes. Once built it
is never mutated by queries, so it can be shared freely between threads.

```
# #[cfg(feature = "f32")] {
use meshbvh3d::na::{Point3, Vector3};
use meshbvh3d::partitioning::Bvh;
use meshbvh3d::query::Ray;

let vertices = [
    Point3::new(-1.0, -1.0, 0.0),
    Point3::new(1.0, -1.0, 0.0),
    Point3::new(1.0, 1.0, 0.0),
    Point3::new(-1.0, 1.0, 0.0),
];
let indices: [u32; 6] = [0, 1, 2, 0, 2, 3];

let bvh = Bvh::from_indexed_triangles(&vertices, &indices).unwrap();
let ray = Ray::new(Point3::new(0.2, 0.1, 5.0), Vector3::new(0.0, 0.0, -1.0));
let hit = bvh
    .closest_ray_indexed_triangle_collision(&vertices, &indices, &ray)
    .unwrap();
assert!((hit.distance - 5.0).abs() < 1.0e-6);
# }
```
*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![deny(unused_results)]
#![deny(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::module_inception)]
#![allow(clippy::manual_range_contains)] // This usually makes it way more verbose that it could be.
#![deny(unused_qualifications)]

#[cfg(all(feature = "f32", feature = "f64"))]
core::compile_error!("The `f32` and `f64` features are mutually exclusive.");

#[cfg(feature = "serde-serialize")]
#[macro_use]
extern crate serde;
#[macro_use]
extern crate approx;
extern crate num_traits as num;

pub extern crate nalgebra as na;

pub mod bounding_volume;
pub mod partitioning;
pub mod query;
pub mod shape;
pub mod utils;

mod real {
    /// The scalar type used throughout this crate.
    #[cfg(feature = "f64")]
    pub use f64 as Real;

    /// The scalar type used throughout this crate.
    #[cfg(feature = "f32")]
    pub use f32 as Real;
}

/// Compilation flags dependent aliases for mathematical types.
#[cfg(feature = "dim3")]
pub mod math {
    pub use super::real::*;
    pub use na::{Point3, Vector3};

    /// The default tolerance used for geometric operations.
    pub const DEFAULT_EPSILON: Real = Real::EPSILON;

    /// The dimension of the space.
    pub const DIM: usize = 3;

    /// The point type.
    pub use Point3 as Point;

    /// The vector type.
    pub use Vector3 as Vector;
}
