use super::{Bvh, BvhCollision, BvhNode, TraversalAction};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real};
use crate::query::{ray_triangle_intersection, InvRay, Ray};
use crate::utils::{indexed_triangle, VertexIndex};

impl BvhNode {
    /// The ray parameter at which `ray` enters this node’s AABB, `0.0` if the ray starts
    /// inside of it, or `Real::MAX` if the AABB is missed or entered after
    /// `max_time_of_impact`.
    #[inline]
    pub fn cast_inv_ray(&self, ray: &InvRay, max_time_of_impact: Real) -> Real {
        self.aabb()
            .cast_inv_ray(ray, max_time_of_impact)
            .unwrap_or(Real::MAX)
    }
}

impl Bvh {
    /// Iterates through the primitives with an AABB intersecting the given `aabb`.
    pub fn intersect_aabb<'a>(&'a self, aabb: &'a Aabb) -> impl Iterator<Item = u32> + 'a {
        self.leaves(|node: &BvhNode| node.aabb().intersects(aabb))
            .filter(|prim| prim.aabb.intersects(aabb))
            .map(|prim| prim.id)
    }

    /// Calls `f` with the identifier of every primitive whose AABB intersects `aabb`.
    ///
    /// Touching boxes are considered intersecting.
    pub fn for_each_aabb_overlap(&self, aabb: &Aabb, mut f: impl FnMut(u32)) {
        self.traverse(|node| {
            if !node.aabb().intersects(aabb) {
                return TraversalAction::Prune;
            }

            for prim in self.leaf_prims(node) {
                if prim.aabb.intersects(aabb) {
                    f(prim.id);
                }
            }

            TraversalAction::Continue
        });
    }

    /// Casts a ray on this BVH using the provided primitive ray-cast function.
    ///
    /// The `primitive_check` delegates the ray-casting task to an external function that
    /// is assumed to map a primitive identifier to an actual geometry to cast a ray on. The `Real`
    /// argument given to that closure is the distance to the closest ray hit found so far (or is
    /// equal to `max_time_of_impact` if no hit was found so far).
    pub fn cast_ray(
        &self,
        ray: &Ray,
        max_time_of_impact: Real,
        primitive_check: impl FnMut(u32, Real) -> Option<Real>,
    ) -> Option<(u32, Real)> {
        let inv_ray = InvRay::from(ray);
        self.find_best(
            max_time_of_impact,
            |node: &BvhNode, best_so_far| node.cast_inv_ray(&inv_ray, best_so_far),
            primitive_check,
        )
    }

    /// Finds the closest triangle of an indexed mesh hit by `ray`.
    ///
    /// `vertices` and `indices` must be the buffers this BVH was last built from. Returns
    /// `None` if the BVH is empty or if no triangle is hit at a parameter `t ≥ 0`. When several
    /// triangles are hit at the same distance, which one is reported is unspecified.
    pub fn closest_ray_indexed_triangle_collision<I: VertexIndex>(
        &self,
        vertices: &[Point<Real>],
        indices: &[I],
        ray: &Ray,
    ) -> Option<BvhCollision> {
        debug_assert_eq!(
            indices.len() / 3,
            self.prims.len(),
            "the index buffer does not match the one this BVH was built from"
        );

        let (primitive_id, distance) = self.cast_ray(ray, Real::MAX, |prim_id, best_so_far| {
            indexed_triangle(vertices, indices, prim_id).cast_local_ray(ray, best_so_far)
        })?;

        Some(BvhCollision {
            primitive_id,
            distance,
            position: ray.point_at(distance),
        })
    }

    /// Finds the closest triangle of a triangle soup hit by `ray`.
    ///
    /// `vertices` must be the buffer this BVH was last built from.
    pub fn closest_ray_triangle_collision(
        &self,
        vertices: &[Point<Real>],
        ray: &Ray,
    ) -> Option<BvhCollision> {
        debug_assert_eq!(
            vertices.len() / 3,
            self.prims.len(),
            "the triangle soup does not match the one this BVH was built from"
        );

        let (primitive_id, distance) = self.cast_ray(ray, Real::MAX, |prim_id, best_so_far| {
            let first = prim_id as usize;
            ray_triangle_intersection(
                &vertices[first],
                &vertices[first + 1],
                &vertices[first + 2],
                ray,
            )
            .filter(|toi| *toi <= best_so_far)
        })?;

        Some(BvhCollision {
            primitive_id,
            distance,
            position: ray.point_at(distance),
        })
    }

    /// Calls `f` for every triangle of an indexed mesh hit by `ray`, in no particular order.
    pub fn for_each_ray_indexed_triangle_collision<I: VertexIndex>(
        &self,
        vertices: &[Point<Real>],
        indices: &[I],
        ray: &Ray,
        mut f: impl FnMut(BvhCollision),
    ) {
        self.for_each_ray_leaf_prim(ray, |prim_id| {
            let tri = indexed_triangle(vertices, indices, prim_id);
            if let Some(distance) = tri.cast_local_ray(ray, Real::MAX) {
                f(BvhCollision {
                    primitive_id: prim_id,
                    distance,
                    position: ray.point_at(distance),
                });
            }
        });
    }

    /// Calls `f` for every triangle of a triangle soup hit by `ray`, in no particular order.
    pub fn for_each_ray_triangle_collision(
        &self,
        vertices: &[Point<Real>],
        ray: &Ray,
        mut f: impl FnMut(BvhCollision),
    ) {
        self.for_each_ray_leaf_prim(ray, |prim_id| {
            let first = prim_id as usize;
            if let Some(distance) = ray_triangle_intersection(
                &vertices[first],
                &vertices[first + 1],
                &vertices[first + 2],
                ray,
            ) {
                f(BvhCollision {
                    primitive_id: prim_id,
                    distance,
                    position: ray.point_at(distance),
                });
            }
        });
    }

    /// Calls `f` for every primitive whose AABB is hit by `ray`, in depth-first order.
    ///
    /// Only primitives are reported, never internal nodes. The reported distance is the
    /// parameter at which the infinite line supporting the ray enters the primitive AABB: it is
    /// negative if the ray origin lies inside that AABB.
    pub fn for_each_ray_aabb_collision(&self, ray: &Ray, mut f: impl FnMut(BvhCollision)) {
        let inv_ray = InvRay::from(ray);

        self.traverse(|node| {
            if node.aabb().clip_inv_ray(&inv_ray).is_none() {
                return TraversalAction::Prune;
            }

            for prim in self.leaf_prims(node) {
                if let Some((distance, _)) = prim.aabb.clip_inv_ray(&inv_ray) {
                    f(BvhCollision {
                        primitive_id: prim.id,
                        distance,
                        position: ray.point_at(distance),
                    });
                }
            }

            TraversalAction::Continue
        });
    }

    /// Collects every primitive whose AABB is hit by `ray`.
    ///
    /// See [`Bvh::for_each_ray_aabb_collision`].
    pub fn ray_aabb_collisions(&self, ray: &Ray) -> Vec<BvhCollision> {
        let mut result = vec![];
        self.for_each_ray_aabb_collision(ray, |hit| result.push(hit));
        result
    }

    /// Calls `f` with the identifier of every primitive whose AABB is hit by `ray`.
    fn for_each_ray_leaf_prim(&self, ray: &Ray, mut f: impl FnMut(u32)) {
        let inv_ray = InvRay::from(ray);

        self.traverse(|node| {
            if node.aabb().clip_inv_ray(&inv_ray).is_none() {
                return TraversalAction::Prune;
            }

            for prim in self.leaf_prims(node) {
                if prim.aabb.clip_inv_ray(&inv_ray).is_some() {
                    f(prim.id);
                }
            }

            TraversalAction::Continue
        });
    }
}
