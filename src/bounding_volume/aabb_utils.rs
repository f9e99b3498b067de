use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real, Vector};

/// Computes the AABB of a set of points.
///
/// Returns [`Aabb::new_invalid`] if `pts` yields no point.
pub fn local_point_cloud_aabb<I>(pts: I) -> Aabb
where
    I: IntoIterator<Item = Point<Real>>,
{
    pts.into_iter().fold(Aabb::new_invalid(), |mut aabb, pt| {
        aabb.take_point(pt);
        aabb
    })
}

/// The smallest AABB enclosing both `a` and `b`.
#[inline]
pub fn union(a: &Aabb, b: &Aabb) -> Aabb {
    a.merged(b)
}

/// The centroid of `aabb`, i.e., the midpoint of its diagonal.
#[inline]
pub fn centroid(aabb: &Aabb) -> Point<Real> {
    aabb.center()
}

/// Half the width of `aabb` along each axis.
#[inline]
pub fn half_widths(aabb: &Aabb) -> Vector<Real> {
    aabb.half_extents()
}
