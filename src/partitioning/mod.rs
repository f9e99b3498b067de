//! Spatial partitioning tools.

pub use self::bvh::{
    Bvh, BvhBuildError, BvhBuildOptions, BvhCollision, BvhLeafCost, BvhNode, BvhPrim, Leaves,
    TraversalAction,
};

pub mod bvh;
