//! A bounding volume hierarchy for ray picking and overlap queries.

pub use bvh_build::{BvhBuildError, BvhBuildOptions};
pub use bvh_traverse::{BvhLeafCost, Leaves, TraversalAction};
pub use bvh_tree::{Bvh, BvhCollision, BvhNode, BvhPrim};

mod bvh_build;
mod bvh_queries;
mod bvh_traverse;
mod bvh_tree;
mod bvh_validation;
