use crate::math::{Point, Real};
use crate::shape::Triangle;

/// An unsigned integer type usable as an element of an index buffer.
///
/// Implemented for the 16-bit and 32-bit index formats of GPU meshes, and for `usize`.
pub trait VertexIndex: Copy + Send + Sync {
    /// Converts this index into a `usize` suitable for indexing a vertex buffer.
    fn to_usize(self) -> usize;
}

impl VertexIndex for u16 {
    #[inline(always)]
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl VertexIndex for u32 {
    #[inline(always)]
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl VertexIndex for usize {
    #[inline(always)]
    fn to_usize(self) -> usize {
        self
    }
}

/// The triangle of an indexed mesh whose vertex indices start at position `first` of
/// `indices`.
///
/// Panics if the index buffer is shorter than `first + 3` or if one of the triangle's
/// indices is out of bounds of `vertices`.
#[inline]
pub fn indexed_triangle<I: VertexIndex>(
    vertices: &[Point<Real>],
    indices: &[I],
    first: u32,
) -> Triangle {
    let first = first as usize;
    Triangle::new(
        vertices[indices[first].to_usize()],
        vertices[indices[first + 1].to_usize()],
        vertices[indices[first + 2].to_usize()],
    )
}
