use crate::math::{Point, Real, DEFAULT_EPSILON};
use crate::query::Ray;
use crate::shape::Triangle;

impl Triangle {
    /// Casts a ray on this triangle.
    ///
    /// Returns the parameter `t ≥ 0` such that `ray.point_at(t)` lies on the triangle, or
    /// `None` if there is no hit, if the hit is behind the ray origin, or if it happens after
    /// `max_time_of_impact`. Both faces of the triangle can be hit.
    #[inline]
    pub fn cast_local_ray(&self, ray: &Ray, max_time_of_impact: Real) -> Option<Real> {
        ray_triangle_intersection(&self.a, &self.b, &self.c, ray)
            .filter(|toi| *toi <= max_time_of_impact)
    }
}

/// Computes the intersection between a triangle and a ray (Möller–Trumbore).
///
/// Returns the parameter `t ≥ 0` of the intersection point `ray.origin + ray.dir * t`.
/// Zero-area triangles and rays parallel to the triangle plane never report a hit.
pub fn ray_triangle_intersection(
    a: &Point<Real>,
    b: &Point<Real>,
    c: &Point<Real>,
    ray: &Ray,
) -> Option<Real> {
    let ab = *b - *a;
    let ac = *c - *a;

    let p = ray.dir.cross(&ac);
    let det = ab.dot(&p);

    // The ray is parallel to the triangle plane, or the triangle is degenerate. The threshold
    // scales with the operands so the test does not depend on the scene units.
    if det.abs() <= DEFAULT_EPSILON * ab.norm() * p.norm() {
        return None;
    }

    let inv_det = 1.0 / det;
    let ap = ray.origin - *a;

    let u = ap.dot(&p) * inv_det;
    if u < 0.0 || u > 1.0 {
        return None;
    }

    let q = ap.cross(&ab);
    let v = ray.dir.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let toi = ac.dot(&q) * inv_det;
    (toi >= 0.0).then_some(toi)
}
