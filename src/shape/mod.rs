//! Shapes indexed by the bounding volume hierarchy.

pub use self::triangle::Triangle;

mod triangle;
