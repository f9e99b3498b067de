use super::{BvhNode, BvhPrim};
use crate::math::Real;
use crate::partitioning::Bvh;
use smallvec::SmallVec;

const TRAVERSAL_STACK_SIZE: usize = 32;

/// Iterator over the primitives of the leaves accepted by a node predicate.
///
/// Created by [`Bvh::leaves`].
pub struct Leaves<'a, Check: Fn(&BvhNode) -> bool> {
    tree: &'a Bvh,
    current: core::slice::Iter<'a, BvhPrim>,
    stack: SmallVec<[u32; TRAVERSAL_STACK_SIZE]>,
    check: Check,
}

impl<'a, Check: Fn(&BvhNode) -> bool> Leaves<'a, Check> {
    /// Starts iterating on the leaves of `tree` accepted by `check`.
    pub fn new(tree: &'a Bvh, check: Check) -> Leaves<'a, Check> {
        let mut stack = SmallVec::default();

        if !tree.nodes.is_empty() {
            stack.push(0);
        }

        Leaves {
            tree,
            current: Default::default(),
            stack,
            check,
        }
    }
}

impl<'a, Check: Fn(&BvhNode) -> bool> Iterator for Leaves<'a, Check> {
    type Item = &'a BvhPrim;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(prim) = self.current.next() {
                return Some(prim);
            }

            let node_id = self.stack.pop()?;
            let node = &self.tree.nodes[node_id as usize];

            if !(self.check)(node) {
                continue;
            }

            match node.right_child() {
                Some(right) => {
                    self.stack.push(right);
                    self.stack.push(node_id + 1);
                }
                None => self.current = self.tree.leaf_prims(node).iter(),
            }
        }
    }
}

/// Cost associated to a BVH primitive during best-first traversal.
pub trait BvhLeafCost {
    /// The cost value associated to the primitive.
    ///
    /// Best-first searches for the primitive with the lowest cost.
    fn cost(&self) -> Real;
}

impl BvhLeafCost for Real {
    #[inline(always)]
    fn cost(&self) -> Real {
        *self
    }
}

impl<T> BvhLeafCost for (Real, T) {
    #[inline(always)]
    fn cost(&self) -> Real {
        self.0
    }
}

/// Controls the execution flow of [`Bvh::traverse`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalAction {
    /// The traversal will continue on the children of the tested node.
    Continue,
    /// The traversal will skip all descendants of the tested node.
    Prune,
    /// The traversal will exit immediately.
    EarlyExit,
}

impl Bvh {
    #[inline(always)]
    pub(crate) fn traversal_stack() -> SmallVec<[u32; TRAVERSAL_STACK_SIZE]> {
        Default::default()
    }

    #[inline(always)]
    pub(crate) fn traversal_stack_with_depth() -> SmallVec<[(u32, usize); TRAVERSAL_STACK_SIZE]>
    {
        Default::default()
    }

    /// Iterates through the primitives of the leaves, in depth-first order.
    ///
    /// The `check_node` closure is called on every traversed node. If it returns `false` then the
    /// node and all its descendants won’t be iterated on. This is useful for pruning whole
    /// sub-trees based on a geometric predicate on the node’s AABB.
    ///
    /// See also the [`Bvh::traverse`] function which is slightly less convenient since it doesn’t
    /// rely on the iterator system, but takes a closure that implements [`FnMut`] instead of [`Fn`].
    pub fn leaves<F: Fn(&BvhNode) -> bool>(&self, check_node: F) -> Leaves<'_, F> {
        Leaves::new(self, check_node)
    }

    /// Traverses the BVH in depth-first order with full control over traversal.
    ///
    /// The closure is called on every visited node, internal or leaf, starting with the root.
    /// The left subtree of a node is fully traversed before its right subtree, which matches
    /// the layout of [`Bvh::nodes`].
    ///
    /// - `Continue`: visit this node's children (if it is not a leaf).
    /// - `Prune`: skip this node's subtree entirely.
    /// - `EarlyExit`: stop the traversal immediately.
    ///
    /// Use [`Bvh::leaf_prims`] to access the primitives of a leaf from the closure.
    ///
    /// # Example
    ///
    /// ```rust
    /// # #[cfg(all(feature = "dim3", feature = "f32"))] {
    /// use meshbvh3d::partitioning::{Bvh, TraversalAction};
    /// use meshbvh3d::bounding_volume::{Aabb, BoundingVolume};
    /// use meshbvh3d::na::Point3;
    ///
    /// let aabbs = vec![
    ///     Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
    ///     Aabb::new(Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 1.0, 1.0)),
    ///     Aabb::new(Point3::new(10.0, 0.0, 0.0), Point3::new(11.0, 1.0, 1.0)),
    /// ];
    ///
    /// let bvh = Bvh::from_aabbs(&aabbs);
    ///
    /// let query_region = Aabb::new(
    ///     Point3::new(-1.0, -1.0, -1.0),
    ///     Point3::new(7.0, 2.0, 2.0)
    /// );
    ///
    /// let mut count = 0;
    /// bvh.traverse(|node| {
    ///     if !node.aabb().intersects(&query_region) {
    ///         // Prune: this entire subtree is outside the region
    ///         return TraversalAction::Prune;
    ///     }
    ///
    ///     if node.is_leaf() {
    ///         count += 1;
    ///     }
    ///
    ///     TraversalAction::Continue
    /// });
    ///
    /// assert_eq!(count, 2); // First two objects intersect the region
    /// # }
    /// ```
    pub fn traverse(&self, mut check_node: impl FnMut(&BvhNode) -> TraversalAction) {
        let mut stack = Self::traversal_stack();

        if !self.nodes.is_empty() {
            stack.push(0);
        }

        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];

            match check_node(node) {
                TraversalAction::Continue => {
                    if let Some(right) = node.right_child() {
                        stack.push(right);
                        stack.push(node_id + 1);
                    }
                }
                TraversalAction::Prune => {}
                TraversalAction::EarlyExit => return,
            }
        }
    }

    /// Find the primitive that minimizes its associated cost.
    ///
    /// - `aabb_cost(node, best_cost)` returns a lower bound of the cost of every primitive in
    ///   the subtree of `node`, or `Real::MAX` if none of them can be accepted.
    /// - `prim_cost(prim_id, best_cost)` returns the cost of a primitive, or `None` if it is
    ///   rejected.
    ///
    /// Subtrees are visited closest first, and skipped as soon as their cost bound exceeds
    /// the best primitive cost found so far. Only costs smaller than or equal to `max_cost`
    /// are accepted. When several primitives have the same cost, the first one found wins.
    pub fn find_best<L: BvhLeafCost>(
        &self,
        max_cost: Real,
        aabb_cost: impl Fn(&BvhNode, Real) -> Real,
        mut prim_cost: impl FnMut(u32, Real) -> Option<L>,
    ) -> Option<(u32, L)> {
        // A stack with 32 elements should be more than enough in most cases.
        let mut stack: SmallVec<[(u32, Real); TRAVERSAL_STACK_SIZE]> = SmallVec::new();
        let mut best: Option<(u32, L)> = None;
        let mut best_cost = max_cost;

        let root = self.nodes.first()?;
        let root_cost = aabb_cost(root, best_cost);

        if root_cost == Real::MAX || root_cost > best_cost {
            return None;
        }

        stack.push((0, root_cost));

        while let Some((node_id, node_cost)) = stack.pop() {
            // The best cost may have decreased since this node was pushed.
            if node_cost > best_cost {
                continue;
            }

            let node = &self.nodes[node_id as usize];

            let Some(right_id) = node.right_child() else {
                for prim in self.leaf_prims(node) {
                    if let Some(prim_val) = prim_cost(prim.id, best_cost) {
                        let prim_score = prim_val.cost();
                        if prim_score <= best_cost && (best.is_none() || prim_score < best_cost) {
                            best_cost = prim_score;
                            best = Some((prim.id, prim_val));
                        }
                    }
                }
                continue;
            };

            let mut left = (node_id + 1, aabb_cost(&self.nodes[node_id as usize + 1], best_cost));
            let mut right = (right_id, aabb_cost(&self.nodes[right_id as usize], best_cost));

            if left.1 > right.1 {
                core::mem::swap(&mut left, &mut right);
            }

            // Push the farthest child first so the closest one is visited next.
            if right.1 != Real::MAX && right.1 <= best_cost {
                stack.push(right);
            }

            if left.1 != Real::MAX && left.1 <= best_cost {
                stack.push(left);
            }
        }

        best
    }
}
