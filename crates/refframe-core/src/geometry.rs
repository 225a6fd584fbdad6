//! Geometric utilities for spatial computations.
//!
//! Every helper that divides by a length returns `None` for degenerate
//! input instead of producing infinities or NaN.

use nalgebra::{Vector2, Vector3};

/// Lengths below this are treated as zero
pub const GEOMETRY_EPSILON: f64 = 1e-12;

/// World up axis of the tracking space
pub fn world_up() -> Vector3<f64> {
    Vector3::new(0.0, 1.0, 0.0)
}

/// Normalize a vector, `None` when it has (almost) zero length
pub fn normalized(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    v.try_normalize(GEOMETRY_EPSILON)
}

/// Vector projection of `v` onto `axis` in the plane
pub fn project_onto_axis(v: &Vector2<f64>, axis: &Vector2<f64>) -> Option<Vector2<f64>> {
    let norm_sq = axis.norm_squared();
    if norm_sq < GEOMETRY_EPSILON {
        return None;
    }
    Some(axis * (v.dot(axis) / norm_sq))
}

/// Z component of the cross product of two planar vectors lifted to 3D
pub fn cross_z(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Remove the component of `v` along the unit `normal`
pub fn reject_from_plane(v: &Vector3<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    v - normal * v.dot(normal)
}

/// Angle between two vectors in degrees
pub fn angle_between_deg(v1: &Vector3<f64>, v2: &Vector3<f64>) -> Option<f64> {
    let norms = v1.norm() * v2.norm();
    if norms < GEOMETRY_EPSILON {
        return None;
    }
    Some((v1.dot(v2) / norms).clamp(-1.0, 1.0).acos().to_degrees())
}

/// `atan(numerator / denominator)` in degrees
pub fn atan_ratio_deg(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator.abs() < GEOMETRY_EPSILON {
        return None;
    }
    Some((numerator / denominator).atan().to_degrees())
}
