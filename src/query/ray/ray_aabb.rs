use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector, DIM};
use crate::query::Ray;

/// A ray with a precomputed reciprocal direction.
///
/// A BVH traversal runs the slab test against many boxes with the same ray, so the three
/// divisions are done once here. Zero direction components yield infinite reciprocals
/// (following IEEE-754 rules) instead of an error.
#[derive(Debug, Clone, Copy)]
pub struct InvRay {
    /// Starting point of the ray.
    pub origin: Point<Real>,
    /// Component-wise reciprocal of the ray direction.
    pub inv_dir: Vector<Real>,
}

impl From<&Ray> for InvRay {
    #[inline]
    fn from(ray: &Ray) -> Self {
        Self {
            origin: ray.origin,
            inv_dir: ray.dir.map(|d| 1.0 / d),
        }
    }
}

impl From<Ray> for InvRay {
    #[inline]
    fn from(ray: Ray) -> Self {
        Self::from(&ray)
    }
}

impl Aabb {
    /// Clips the infinite line supporting `ray` against this AABB using the slab method.
    ///
    /// Returns `(t_min, t_max)`, the parameters at which the line enters and exits the box.
    /// `t_min` is negative if the ray origin lies inside the box. Returns `None` if the box is
    /// missed or lies entirely behind the ray origin, i.e., if `t_max < max(t_min, 0)`.
    ///
    /// Points located exactly on the boundary of the box count as inside.
    #[inline]
    pub fn clip_inv_ray(&self, ray: &InvRay) -> Option<(Real, Real)> {
        let mut tmin = -Real::INFINITY;
        let mut tmax = Real::INFINITY;

        for i in 0..DIM {
            let t1 = (self.mins[i] - ray.origin[i]) * ray.inv_dir[i];
            let t2 = (self.maxs[i] - ray.origin[i]) * ray.inv_dir[i];

            // 0 * inf: the direction is parallel to this slab and the origin lies on one
            // of its planes, so this axis does not constrain the interval.
            if t1.is_nan() || t2.is_nan() {
                continue;
            }

            let (near, far) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            tmin = tmin.max(near);
            tmax = tmax.min(far);
        }

        if tmax < tmin.max(0.0) {
            None
        } else {
            Some((tmin, tmax))
        }
    }

    /// Clips the infinite line supporting `ray` against this AABB using the slab method.
    ///
    /// See [`Aabb::clip_inv_ray`] for the meaning of the returned interval.
    #[inline]
    pub fn clip_ray(&self, ray: &Ray) -> Option<(Real, Real)> {
        self.clip_inv_ray(&InvRay::from(ray))
    }

    /// Computes the parameter at which `ray` enters this AABB.
    ///
    /// Returns `0.0` if the ray origin is inside the box, and `None` if the box is missed or
    /// if the entry parameter is greater than `max_time_of_impact`.
    #[inline]
    pub fn cast_ray(&self, ray: &Ray, max_time_of_impact: Real) -> Option<Real> {
        self.cast_inv_ray(&InvRay::from(ray), max_time_of_impact)
    }

    /// Same as [`Aabb::cast_ray`] with a precomputed reciprocal direction.
    #[inline]
    pub fn cast_inv_ray(&self, ray: &InvRay, max_time_of_impact: Real) -> Option<Real> {
        let (tmin, _) = self.clip_inv_ray(ray)?;
        let toi = tmin.max(0.0);
        (toi <= max_time_of_impact).then_some(toi)
    }
}

/// The slab test between a ray and an AABB.
///
/// Returns `(t_min, t_max)` or `None` if `t_max < max(t_min, 0)`.
#[inline]
pub fn ray_slab_test(aabb: &Aabb, ray: &Ray) -> Option<(Real, Real)> {
    aabb.clip_ray(ray)
}
