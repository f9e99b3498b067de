//! Various unsorted geometrical and logical operators.

pub use self::vertex_index::{indexed_triangle, VertexIndex};

mod vertex_index;
