//! Math utilities and types
//!
//! World positions live on an integer lattice. nalgebra supplies the vector
//! type so coordinates get arithmetic, indexing and serde support for free.

pub use nalgebra::Vector3;

/// Integer coordinate triplet used for positions and AABB corners
pub type Coordinate = Vector3<i32>;

/// Component-wise minimum of two coordinates
pub fn min_corner(a: &Coordinate, b: &Coordinate) -> Coordinate {
    a.zip_map(b, |lhs, rhs| lhs.min(rhs))
}

/// Component-wise maximum of two coordinates
pub fn max_corner(a: &Coordinate, b: &Coordinate) -> Coordinate {
    a.zip_map(b, |lhs, rhs| lhs.max(rhs))
}

/// Format a coordinate as `(x, y, z)` for log output
pub fn fmt_coordinate(c: &Coordinate) -> String {
    format!("({}, {}, {})", c.x, c.y, c.z)
}
