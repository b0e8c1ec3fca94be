use glam::DVec2;

use crate::math::normalize_or_zero;
use crate::Vec3;

/// Lifts a point of the 2D game plane into 3D space (z = 0).
pub fn from_xy(DVec2 { x, y }: DVec2) -> Vec3 {
    Vec3 { x, y, z: 0.0 }
}

/// Drops the z coordinate.
pub fn to_xy(Vec3 { x, y, .. }: Vec3) -> DVec2 {
    DVec2 { x, y }
}

/// Removes the component of `v` along the unit vector `normal`.
pub fn project_onto_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

/// Makes `up` orthogonal to `normal` while keeping it in the plane spanned by
/// both. Returns zero if the two are parallel.
pub fn orthogonalize_up(normal: Vec3, up: Vec3) -> Vec3 {
    let side = normal.cross(up);
    normalize_or_zero(side.cross(normal))
}
