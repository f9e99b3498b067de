//! Bounding volumes.

#[doc(inline)]
pub use crate::bounding_volume::aabb::Aabb;
#[doc(inline)]
pub use crate::bounding_volume::bounding_volume::BoundingVolume;

#[doc(hidden)]
pub mod aabb;
mod aabb_triangle;
mod aabb_utils;
#[doc(hidden)]
pub mod bounding_volume;

pub use self::aabb_utils::{centroid, half_widths, union};

/// Free functions computing bounding volumes of point clouds.
pub mod details {
    pub use super::aabb_utils::local_point_cloud_aabb;
}
