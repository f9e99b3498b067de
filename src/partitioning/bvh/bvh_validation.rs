use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::partitioning::Bvh;

impl Bvh {
    /// Counts the number of leaves that can be reached from the node at index `id`.
    ///
    /// This is mostly a utility for debugging.
    pub fn reachable_leaf_count(&self, id: u32) -> u32 {
        let Some(node) = self.nodes.get(id as usize) else {
            return 0;
        };

        match node.right_child() {
            Some(right) => self.reachable_leaf_count(id + 1) + self.reachable_leaf_count(right),
            None => 1,
        }
    }

    /// Panics if the tree isn’t well-formed.
    ///
    /// The tree is well-formed if it is topologically correct (the nodes are in depth-first
    /// order, every node is reachable exactly once, every primitive is referenced by exactly
    /// one leaf, and no two primitives share an identifier) and geometrically correct (the
    /// AABB of a node is the union of the AABBs of its children, and the AABB of a leaf is the
    /// union of its primitive AABBs).
    pub fn assert_well_formed(&self) {
        if self.is_empty() {
            assert!(self.prims.is_empty(), "Empty tree with primitives.");
            return;
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut referenced = vec![false; self.prims.len()];
        let prim_count = self.assert_well_formed_recurse(0, &mut visited, &mut referenced);

        assert_eq!(prim_count, self.prims.len(), "Unreferenced primitives.");
        assert!(visited.iter().all(|v| *v), "Unreachable nodes.");

        let mut ids: Vec<u32> = self.prims.iter().map(|prim| prim.id).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            panic!("Primitive identifier {} used twice.", pair[0]);
        }
    }

    fn assert_well_formed_recurse(
        &self,
        node_id: u32,
        visited: &mut [bool],
        referenced: &mut [bool],
    ) -> usize {
        let node = &self.nodes[node_id as usize];

        if core::mem::replace(&mut visited[node_id as usize], true) {
            panic!("Detected loop. Node {} visited twice.", node_id);
        }

        match node.right_child() {
            Some(right) => {
                let left = node_id + 1;
                assert!(
                    (left as usize) < self.nodes.len() && left < right,
                    "Invalid children {} and {} for node {}.",
                    left,
                    right,
                    node_id
                );
                assert!((right as usize) < self.nodes.len());

                let left_aabb = self.nodes[left as usize].aabb();
                let right_aabb = self.nodes[right as usize].aabb();
                assert!(node.aabb().contains(&left_aabb));
                assert!(node.aabb().contains(&right_aabb));
                assert_eq!(node.aabb(), left_aabb.merged(&right_aabb));

                let left_count = self.assert_well_formed_recurse(left, visited, referenced);
                let right_count = self.assert_well_formed_recurse(right, visited, referenced);
                left_count + right_count
            }
            None => {
                let range = node.prim_range().unwrap_or_default();
                assert!(!range.is_empty(), "Empty leaf {}.", node_id);
                assert!(range.end <= self.prims.len());

                for i in range.clone() {
                    assert!(
                        !core::mem::replace(&mut referenced[i], true),
                        "Primitive {} referenced twice.",
                        i
                    );
                }

                let prims = &self.prims[range];
                let mut aabb = Aabb::new_invalid();

                for prim in prims {
                    assert!(node.aabb().contains(&prim.aabb));
                    aabb.merge(&prim.aabb);
                }

                assert_eq!(node.aabb(), aabb);
                prims.len()
            }
        }
    }
}
