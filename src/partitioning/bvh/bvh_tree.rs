use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use core::ops::Range;

/// A primitive indexed by a [`Bvh`]: an opaque identifier and its bounding box.
///
/// For a BVH built from triangles, `id` is the position of the triangle's first vertex index
/// in the index buffer (or of its first vertex in a triangle soup), so the triangle is made of
/// the elements `id`, `id + 1` and `id + 2`. For a BVH built from AABBs, `id` is the position
/// of the AABB in the input slice.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BvhPrim {
    /// The caller-defined identifier of this primitive.
    pub id: u32,
    /// The bounding box of this primitive.
    pub aabb: Aabb,
}

impl BvhPrim {
    /// Creates a new primitive record.
    #[inline]
    pub fn new(id: u32, aabb: Aabb) -> Self {
        Self { id, aabb }
    }
}

/// The node (internal or leaf) of a BVH.
///
/// Nodes are stored in depth-first order: the left child of an internal node is always
/// stored right after it, and its right child index is stored explicitly.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C)]
#[cfg_attr(all(feature = "f32", feature = "dim3"), repr(align(16)))]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BvhNode {
    /// Mins coordinates of the node’s bounding volume.
    pub(super) mins: Point<Real>,
    /// Index of the right child for an internal node, index of the first primitive for a leaf.
    pub(super) children: u32,
    /// Maxs coordinates of this node’s bounding volume.
    pub(super) maxs: Point<Real>,
    /// Number of primitives of a leaf, `0` for an internal node.
    pub(super) prim_count: u32,
}

impl BvhNode {
    /// Initializes a leaf referencing `prim_count` consecutive primitives starting at
    /// `first_prim`.
    #[inline(always)]
    pub(super) fn leaf(aabb: Aabb, first_prim: u32, prim_count: u32) -> Self {
        debug_assert!(prim_count > 0);
        Self {
            mins: aabb.mins,
            children: first_prim,
            maxs: aabb.maxs,
            prim_count,
        }
    }

    /// Initializes an internal node. Its right child index is patched once known.
    #[inline(always)]
    pub(super) fn internal(aabb: Aabb) -> Self {
        Self {
            mins: aabb.mins,
            children: u32::MAX,
            maxs: aabb.maxs,
            prim_count: 0,
        }
    }

    /// Is this node a leaf?
    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.prim_count != 0
    }

    /// If this node is a leaf, the range of its primitives in [`Bvh::prims`].
    #[inline]
    pub fn prim_range(&self) -> Option<Range<usize>> {
        self.is_leaf()
            .then(|| self.children as usize..self.children as usize + self.prim_count as usize)
    }

    /// Number of primitives referenced by this node if it is a leaf, `0` otherwise.
    #[inline]
    pub fn prim_count(&self) -> u32 {
        self.prim_count
    }

    /// If this node is an internal node, the index of its right child.
    ///
    /// The left child of the node at index `i` is always at index `i + 1`.
    #[inline]
    pub fn right_child(&self) -> Option<u32> {
        (!self.is_leaf()).then_some(self.children)
    }

    /// The min corner of this node’s AABB.
    #[inline]
    pub fn mins(&self) -> Point<Real> {
        self.mins
    }

    /// The max corner of this node’s AABB.
    #[inline]
    pub fn maxs(&self) -> Point<Real> {
        self.maxs
    }

    /// This node’s AABB.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb {
            mins: self.mins,
            maxs: self.maxs,
        }
    }

    /// The center of this node’s AABB.
    #[inline]
    pub fn center(&self) -> Point<Real> {
        na::center(&self.mins, &self.maxs)
    }
}

#[cfg(all(feature = "f32", feature = "dim3"))]
static_assertions::assert_eq_size!(BvhNode, [u32; 8]);

/// A hit reported by the ray queries of a [`Bvh`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BvhCollision {
    /// The identifier of the primitive that was hit.
    pub primitive_id: u32,
    /// The ray parameter `t` of the hit, in multiples of the ray direction length.
    pub distance: Real,
    /// The hit point, i.e., `ray.origin + ray.dir * distance`.
    pub position: Point<Real>,
}

/// A Bounding Volume Hierarchy designed for ray picking and overlap queries.
///
/// The tree is stored as two flat arrays: the nodes, in depth-first order, and the
/// primitives, reordered during construction so that the primitives of each leaf are
/// contiguous.
///
/// The BVH never keeps a reference to the buffers it is built from. Triangle queries take
/// the same vertex and index buffers again, and assume they were not modified since the
/// last build.
///
/// Queries only read the tree, so a built `Bvh` can be queried from several threads at the
/// same time. Rebuilding requires `&mut self`.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Bvh {
    pub(super) nodes: Vec<BvhNode>,
    pub(super) prims: Vec<BvhPrim>,
}

static_assertions::assert_impl_all!(Bvh: Send, Sync);

impl Bvh {
    /// An empty BVH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every node and primitive of this BVH, keeping the allocated memory.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.prims.clear();
    }

    /// Does this tree not contain any node?
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The AABB bounding everything contained by this BVH, or `None` if it is empty.
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(BvhNode::aabb)
    }

    /// The nodes of this tree, in depth-first order. The root is at index 0.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// The primitives of this tree, in leaf order.
    pub fn prims(&self) -> &[BvhPrim] {
        &self.prims
    }

    /// The number of primitives indexed by this tree.
    pub fn prim_count(&self) -> usize {
        self.prims.len()
    }

    /// The number of leaves of this tree.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// The primitives referenced by `node`, empty if `node` is an internal node.
    #[inline]
    pub fn leaf_prims(&self, node: &BvhNode) -> &[BvhPrim] {
        match node.prim_range() {
            Some(range) => &self.prims[range],
            None => &[],
        }
    }

    /// Calls `f` on every leaf of this tree, in no particular order.
    pub fn for_each_leaf_node(&self, f: impl FnMut(&BvhNode)) {
        self.nodes.iter().filter(|node| node.is_leaf()).for_each(f);
    }

    /// Calls `f` on every node of this tree, leaves and internal nodes alike, in no particular
    /// order.
    pub fn for_each_leaf_or_inner_node(&self, f: impl FnMut(&BvhNode)) {
        self.nodes.iter().for_each(f);
    }

    /// The length, in edges, of the longest path from the root to a leaf.
    ///
    /// A tree with a single leaf has depth 0. An empty tree has depth 0 too.
    pub fn max_depth(&self) -> usize {
        let mut stack = Self::traversal_stack_with_depth();
        let mut result = 0;

        if !self.nodes.is_empty() {
            stack.push((0, 0));
        }

        while let Some((node_id, depth)) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            match node.right_child() {
                Some(right) => {
                    stack.push((right, depth + 1));
                    stack.push((node_id + 1, depth + 1));
                }
                None => result = result.max(depth),
            }
        }

        result
    }

    /// An approximation of the memory usage (in bytes) for this struct plus
    /// the memory it allocates dynamically.
    pub fn total_memory_size(&self) -> usize {
        size_of::<Self>() + self.heap_memory_size()
    }

    /// An approximation of the memory dynamically-allocated by this struct.
    pub fn heap_memory_size(&self) -> usize {
        let Self { nodes, prims } = self;
        nodes.capacity() * size_of::<BvhNode>() + prims.capacity() * size_of::<BvhPrim>()
    }
}
