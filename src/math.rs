use glam::DMat3;

use crate::constants::NORMALIZE_EPSILON;
use crate::{KeplerError, Num, Vec3};

/// Approximates the root of a function using the Newton-Raphson method.
///
/// # Arguments
/// f - The function to approximate the root of.
/// f_prime - The derivative of the function.
/// x0 - The initial guess.
/// epsilon - The maximum step size accepted as converged.
/// max_steps - Iteration cap.
///
/// # Returns
/// The approximate root, or the last finite estimate wrapped in an error when
/// the iteration cap is reached or a step turns non-finite.
pub fn newton_approx(
    f: impl Fn(Num) -> Num,
    f_prime: impl Fn(Num) -> Num,
    x0: Num,
    epsilon: Num,
    max_steps: usize,
) -> Result<Num, KeplerError> {
    let mut x = x0;

    for i in 0..max_steps {
        let delta = f(x) / f_prime(x);

        if !delta.is_finite() {
            return Err(KeplerError::NotConverged {
                estimate: x,
                iterations: i,
            });
        }

        x -= delta;

        if delta.abs() < epsilon {
            return Ok(x);
        }
    }

    Err(KeplerError::NotConverged {
        estimate: x,
        iterations: max_steps,
    })
}

/// Sign that maps zero to zero, unlike `f64::signum`.
#[inline]
pub fn sign(x: Num) -> Num {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Inverse hyperbolic cosine, clamped to zero below its domain.
#[inline]
pub fn acosh_or_zero(x: Num) -> Num {
    if x < 1.0 {
        return 0.0;
    }
    (x + (x * x - 1.0).sqrt()).ln()
}

/// Unit vector in the direction of `v`, or zero for vectors too short to
/// have a meaningful direction.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len = v.length();
    if len > NORMALIZE_EPSILON {
        v / len
    } else {
        Vec3::ZERO
    }
}

/// Unsigned angle in radians. A zero input yields `π/2`.
pub fn angle_between(a: Vec3, b: Vec3) -> Num {
    normalize_or_zero(a)
        .dot(normalize_or_zero(b))
        .clamp(-1.0, 1.0)
        .acos()
}

/// Rotates `v` by `angle` radians around the unit vector `axis`.
pub fn rotate_about_axis(v: Vec3, angle: Num, axis: Vec3) -> Vec3 {
    let (sin_t, cos_t) = angle.sin_cos();
    let k = 1.0 - cos_t;
    let n = axis;

    // Columns of the Rodrigues rotation matrix
    let m = DMat3::from_cols(
        Vec3::new(
            k * n.x * n.x + cos_t,
            k * n.x * n.y + n.z * sin_t,
            k * n.x * n.z - n.y * sin_t,
        ),
        Vec3::new(
            k * n.x * n.y - n.z * sin_t,
            k * n.y * n.y + cos_t,
            k * n.y * n.z + n.x * sin_t,
        ),
        Vec3::new(
            k * n.x * n.z + n.y * sin_t,
            k * n.y * n.z - n.x * sin_t,
            k * n.z * n.z + cos_t,
        ),
    );

    m.mul_vec3(v)
}

/// Intersection of a ray with a plane, or `None` when the ray runs parallel
/// to it.
pub fn ray_plane_intersection(
    point_on_plane: Vec3,
    normal: Vec3,
    ray_origin: Vec3,
    ray_direction: Vec3,
) -> Option<Vec3> {
    let d = ray_direction.dot(normal);
    if d.abs() < NORMALIZE_EPSILON {
        return None;
    }

    let p = ray_origin + ray_direction * (point_on_plane - ray_origin).dot(normal) / d;

    // Project back onto the plane to shave off rounding error
    Some(p - normal * (p - point_on_plane).dot(normal))
}
