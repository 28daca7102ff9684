pub mod triangle_3d;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Normalizes a vector, returning the zero vector when its length is
/// below [`TOLERANCE`] instead of dividing by (near-)zero.
#[must_use]
pub fn safe_normalize(v: &Vector3) -> Vector3 {
    let len = v.norm();
    if len < TOLERANCE {
        Vector3::zeros()
    } else {
        v / len
    }
}
