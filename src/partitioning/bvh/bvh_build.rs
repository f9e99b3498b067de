use super::{Bvh, BvhNode, BvhPrim};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real};
use crate::utils::VertexIndex;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parameters controlling the shape of a BVH built by [`Bvh::build_from_indexed_triangles_with_options`]
/// and its siblings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BvhBuildOptions {
    /// The maximum number of primitives a leaf may reference before it gets split.
    ///
    /// Values smaller than 1 are treated as 1.
    pub max_leaf_size: usize,
    /// The depth at which splitting stops, whatever the number of primitives left.
    ///
    /// The root has depth 0.
    pub max_depth: usize,
}

impl Default for BvhBuildOptions {
    fn default() -> Self {
        Self {
            max_leaf_size: 1,
            max_depth: 64,
        }
    }
}

/// Errors that can occur when building a [`Bvh`] from triangles.
///
/// The BVH is left empty whenever one of these errors is returned.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum BvhBuildError {
    /// The index buffer length is not a multiple of three.
    #[error("the index buffer length ({len}) is not a multiple of 3")]
    IndexCountNotMultipleOfThree {
        /// The length of the index buffer.
        len: usize,
    },
    /// The vertex buffer of a triangle soup has a length that is not a multiple of three.
    #[error("the triangle soup length ({len}) is not a multiple of 3")]
    VertexCountNotMultipleOfThree {
        /// The length of the vertex buffer.
        len: usize,
    },
    /// An element of the index buffer does not reference a vertex.
    #[error("the index {index} at position {position} is out of bounds of the {vertex_count} vertices")]
    IndexOutOfBounds {
        /// The position of the faulty element in the index buffer.
        position: usize,
        /// The value of the faulty element.
        index: usize,
        /// The number of vertices.
        vertex_count: usize,
    },
    /// The identifier of the last triangle, `3 * (count - 1)`, does not fit in a `u32`.
    #[error("too many primitives: {count}")]
    TooManyPrimitives {
        /// The number of primitives.
        count: usize,
    },
}

impl BvhBuildError {
    /// Is this error caused by an ill-formed input buffer?
    ///
    /// This is always the case for the errors produced when building a BVH from triangles.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Self::IndexCountNotMultipleOfThree { .. }
            | Self::VertexCountNotMultipleOfThree { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::TooManyPrimitives { .. } => true,
        }
    }
}

/// A pending subtree of the builder: the primitives in `begin..end`, at `depth`.
///
/// `right_of` is the node that must reference this subtree as its right child.
#[derive(Copy, Clone, Debug)]
struct BuildTask {
    begin: usize,
    end: usize,
    depth: usize,
    right_of: Option<u32>,
}

impl Bvh {
    /// Builds a BVH over the triangles of an indexed mesh.
    ///
    /// See [`Bvh::build_from_indexed_triangles`].
    pub fn from_indexed_triangles<I: VertexIndex>(
        vertices: &[Point<Real>],
        indices: &[I],
    ) -> Result<Self, BvhBuildError> {
        let mut result = Self::new();
        result.build_from_indexed_triangles(vertices, indices)?;
        Ok(result)
    }

    /// Builds a BVH over a triangle soup.
    ///
    /// See [`Bvh::build_from_triangles`].
    pub fn from_triangles(vertices: &[Point<Real>]) -> Result<Self, BvhBuildError> {
        let mut result = Self::new();
        result.build_from_triangles(vertices)?;
        Ok(result)
    }

    /// Builds a BVH over a set of AABBs. The primitive identifier of each AABB is its index in
    /// `aabbs`.
    ///
    /// Panics if there are more than `u32::MAX` AABBs.
    pub fn from_aabbs(aabbs: &[Aabb]) -> Self {
        let mut result = Self::new();
        result.build_from_aabbs(aabbs);
        result
    }

    /// Rebuilds this BVH over the triangles of an indexed mesh, with the default
    /// [`BvhBuildOptions`].
    ///
    /// The triangle `i` is made of the vertices `indices[3 * i]`, `indices[3 * i + 1]` and
    /// `indices[3 * i + 2]`. Its primitive identifier is `3 * i`, the position of its first
    /// vertex index in `indices`. The previous content of this BVH is discarded. An empty
    /// index buffer yields an empty BVH.
    ///
    /// On error, the BVH is left empty.
    pub fn build_from_indexed_triangles<I: VertexIndex>(
        &mut self,
        vertices: &[Point<Real>],
        indices: &[I],
    ) -> Result<(), BvhBuildError> {
        self.build_from_indexed_triangles_with_options(
            &BvhBuildOptions::default(),
            vertices,
            indices,
        )
    }

    /// Rebuilds this BVH over the triangles of an indexed mesh.
    ///
    /// See [`Bvh::build_from_indexed_triangles`].
    pub fn build_from_indexed_triangles_with_options<I: VertexIndex>(
        &mut self,
        options: &BvhBuildOptions,
        vertices: &[Point<Real>],
        indices: &[I],
    ) -> Result<(), BvhBuildError> {
        self.clear();

        if indices.len() % 3 != 0 {
            return Err(BvhBuildError::IndexCountNotMultipleOfThree { len: indices.len() });
        }

        if let Some(position) = indices
            .iter()
            .position(|index| index.to_usize() >= vertices.len())
        {
            return Err(BvhBuildError::IndexOutOfBounds {
                position,
                index: indices[position].to_usize(),
                vertex_count: vertices.len(),
            });
        }

        check_triangle_count(indices.len() / 3)?;

        let triangle_prim = |(i, tri): (usize, &[I])| {
            let aabb = Aabb::from_triangle(
                &vertices[tri[0].to_usize()],
                &vertices[tri[1].to_usize()],
                &vertices[tri[2].to_usize()],
            );
            BvhPrim::new((3 * i) as u32, aabb)
        };

        #[cfg(feature = "parallel")]
        self.prims
            .par_extend(indices.par_chunks_exact(3).enumerate().map(triangle_prim));
        #[cfg(not(feature = "parallel"))]
        self.prims
            .extend(indices.chunks_exact(3).enumerate().map(triangle_prim));

        self.rebuild_nodes(options);
        Ok(())
    }

    /// Rebuilds this BVH over a triangle soup, with the default [`BvhBuildOptions`].
    ///
    /// Each consecutive triple of `vertices` is a triangle, and the primitive identifier of
    /// the triangle `vertices[3 * i..3 * i + 3]` is `3 * i`, the position of its first vertex.
    ///
    /// On error, the BVH is left empty.
    pub fn build_from_triangles(&mut self, vertices: &[Point<Real>]) -> Result<(), BvhBuildError> {
        self.build_from_triangles_with_options(&BvhBuildOptions::default(), vertices)
    }

    /// Rebuilds this BVH over a triangle soup.
    ///
    /// See [`Bvh::build_from_triangles`].
    pub fn build_from_triangles_with_options(
        &mut self,
        options: &BvhBuildOptions,
        vertices: &[Point<Real>],
    ) -> Result<(), BvhBuildError> {
        self.clear();

        if vertices.len() % 3 != 0 {
            return Err(BvhBuildError::VertexCountNotMultipleOfThree {
                len: vertices.len(),
            });
        }

        check_triangle_count(vertices.len() / 3)?;

        let triangle_prim = |(i, tri): (usize, &[Point<Real>])| {
            BvhPrim::new((3 * i) as u32, Aabb::from_triangle(&tri[0], &tri[1], &tri[2]))
        };

        #[cfg(feature = "parallel")]
        self.prims
            .par_extend(vertices.par_chunks_exact(3).enumerate().map(triangle_prim));
        #[cfg(not(feature = "parallel"))]
        self.prims
            .extend(vertices.chunks_exact(3).enumerate().map(triangle_prim));

        self.rebuild_nodes(options);
        Ok(())
    }

    /// Rebuilds this BVH over a set of AABBs, with the default [`BvhBuildOptions`].
    ///
    /// The primitive identifier of each AABB is its index in `aabbs`. The previous content of
    /// this BVH is discarded.
    ///
    /// Panics if there are more than `u32::MAX` AABBs.
    pub fn build_from_aabbs(&mut self, aabbs: &[Aabb]) {
        self.build_from_aabbs_with_options(&BvhBuildOptions::default(), aabbs)
    }

    /// Rebuilds this BVH over a set of AABBs.
    ///
    /// See [`Bvh::build_from_aabbs`].
    pub fn build_from_aabbs_with_options(&mut self, options: &BvhBuildOptions, aabbs: &[Aabb]) {
        assert!(
            aabbs.len() <= u32::MAX as usize,
            "too many AABBs to index: {}",
            aabbs.len()
        );

        self.clear();
        self.prims.extend(
            aabbs
                .iter()
                .enumerate()
                .map(|(id, aabb)| BvhPrim::new(id as u32, *aabb)),
        );
        self.rebuild_nodes(options);
    }

    /// Builds the nodes over `self.prims`, reordering them so each leaf references a
    /// contiguous range.
    ///
    /// Nodes are emitted in depth-first order: the left child of a node is emitted right
    /// after it, and its right child index is patched in when the right subtree starts.
    fn rebuild_nodes(&mut self, options: &BvhBuildOptions) {
        self.nodes.clear();

        if self.prims.is_empty() {
            log::debug!("built an empty BVH");
            return;
        }

        let max_leaf_size = options.max_leaf_size.max(1);
        let mut reached_depth = 0;
        let mut truncated_leaves = 0;

        self.nodes
            .reserve(2 * self.prims.len().div_ceil(max_leaf_size) - 1);

        // Only the pending right subtrees are stacked so this is bounded by the tree depth.
        let mut stack: SmallVec<[BuildTask; 32]> = SmallVec::new();
        stack.push(BuildTask {
            begin: 0,
            end: self.prims.len(),
            depth: 0,
            right_of: None,
        });

        while let Some(task) = stack.pop() {
            let node_id = self.nodes.len() as u32;

            if let Some(parent) = task.right_of {
                self.nodes[parent as usize].children = node_id;
            }

            let prims = &mut self.prims[task.begin..task.end];
            let aabb = prims
                .iter()
                .fold(Aabb::new_invalid(), |acc, prim| acc.merged(&prim.aabb));

            if prims.len() <= max_leaf_size || task.depth >= options.max_depth {
                if prims.len() > max_leaf_size {
                    truncated_leaves += 1;
                }

                reached_depth = reached_depth.max(task.depth);
                self.nodes.push(BvhNode::leaf(
                    aabb,
                    task.begin as u32,
                    prims.len() as u32,
                ));
                continue;
            }

            let mid = task.begin + split_at_median(prims);
            self.nodes.push(BvhNode::internal(aabb));

            stack.push(BuildTask {
                begin: mid,
                end: task.end,
                depth: task.depth + 1,
                right_of: Some(node_id),
            });
            stack.push(BuildTask {
                begin: task.begin,
                end: mid,
                depth: task.depth + 1,
                right_of: None,
            });
        }

        if truncated_leaves > 0 {
            log::debug!(
                "BVH depth limit {} reached: {} leaves hold more than {} primitives",
                options.max_depth,
                truncated_leaves,
                max_leaf_size
            );
        }

        log::debug!(
            "built BVH: {} primitives, {} nodes, depth {}",
            self.prims.len(),
            self.nodes.len(),
            reached_depth
        );
    }
}

/// Checks that the identifier `3 * (count - 1)` of the last triangle fits in a `u32`.
fn check_triangle_count(count: usize) -> Result<(), BvhBuildError> {
    if count > 0 && (count - 1) * 3 > u32::MAX as usize {
        Err(BvhBuildError::TooManyPrimitives { count })
    } else {
        Ok(())
    }
}

/// Reorders `prims` around the median of their centroids along the longest axis of the
/// centroids bounds, and returns the size of the left half.
///
/// Both halves are non-empty as long as `prims.len() >= 2`. Primitives with equal centroids
/// are ordered by identifier so the result does not depend on the input order.
fn split_at_median(prims: &mut [BvhPrim]) -> usize {
    let mid = prims.len() / 2;
    let centroids = Aabb::from_points(prims.iter().map(|prim| prim.aabb.center()));

    // Tolerance relative to the magnitude of the centroids, so tiny meshes still get
    // spatial splits.
    let magnitude = centroids.mins.coords.amax().max(centroids.maxs.coords.amax());
    if centroids.extents().max() <= magnitude * Real::EPSILON {
        // All the centroids coincide: any split is as good as another.
        log::trace!(
            "degenerate BVH split: {} primitives with the same centroid",
            prims.len()
        );
        return mid;
    }

    let axis = centroids.longest_axis();
    let _ = prims.select_nth_unstable_by(mid, |a, b| {
        OrderedFloat(a.aabb.center()[axis])
            .cmp(&OrderedFloat(b.aabb.center()[axis]))
            .then(a.id.cmp(&b.id))
    });

    mid
}
