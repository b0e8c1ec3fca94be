#![allow(non_snake_case)]

use crate::math::sign;
use crate::{Num, PI, TWO_PI};

/// Eccentric Anomaly (E) is given by the equation:
/// M = E - e * sin(E)
/// where
/// M is the mean anomaly
/// e is the eccentricity
///
/// Solved with a fixed number of Laguerre-Conway iterations seeded at `M`:
/// two below `e = 0.4`, four above. There is no convergence check, so the
/// cost per call is constant and the result is deterministic; the method
/// converges fast enough that the residual stays far below `1e-6` for every
/// elliptic eccentricity.
pub fn estimate_anomaly(M: Num, e: Num) -> Num {
    let iterations = if e < 0.4 { 2 } else { 4 };
    let mut E = M;

    for _ in 0..iterations {
        let (sin_E, cos_E) = E.sin_cos();
        let e_sin_E = e * sin_E;
        let delta = E - e_sin_E - M;
        let n = 1.0 - e * cos_E;

        E -= 5.0 * delta / (n + sign(n) * (16.0 * n * n - 20.0 * delta * e_sin_E).abs().sqrt());
    }

    E
}

/// Mean motion of an ellipse with the given period.
pub fn mean_motion(period: Num) -> Num {
    TWO_PI / period
}

pub fn mean_anomaly(E: Num, e: Num) -> Num {
    E - e * E.sin()
}

/// True anomaly in `[0, 2π)`. Any eccentric anomaly is accepted and wrapped.
pub fn true_anomaly(E: Num, e: Num) -> Num {
    let E = E.rem_euclid(TWO_PI);
    let cos_E = E.cos();
    let v = ((cos_E - e) / (1.0 - e * cos_E)).clamp(-1.0, 1.0).acos();

    // acos only covers the first half of the orbit
    if E > PI {
        TWO_PI - v
    } else {
        v
    }
}

/// Eccentric anomaly in `[0, 2π)`. Any true anomaly is accepted and wrapped.
pub fn eccentric_anomaly(v: Num, e: Num) -> Num {
    let v = v.rem_euclid(TWO_PI);
    let cos_v = v.cos();
    let E = ((e + cos_v) / (1.0 + e * cos_v)).clamp(-1.0, 1.0).acos();

    if v > PI {
        TWO_PI - E
    } else {
        E
    }
}
