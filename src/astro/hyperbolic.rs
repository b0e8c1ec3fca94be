#![allow(non_snake_case)]

use tracing::warn;

use crate::constants::{HYPERBOLIC_MAX_ITERATIONS, HYPERBOLIC_TOLERANCE};
use crate::math::{acosh_or_zero, newton_approx, sign};
use crate::{KeplerError, Num, PI, TWO_PI};

/// Hyperbolic Anomaly (F) is given by the equation:
/// M = e * sinh(F) - F
/// where
/// M is the hyperbolic mean anomaly
/// e is the eccentricity
///
/// Newton iteration from Danby's starting guess `ln(2|M|/e + 1.8)`, capped at
/// `max_iterations`. The equation is odd in `F`, so negative mean anomalies
/// are solved on `|M|` and mirrored, keeping the guess on the right side of
/// the root.
///
/// https://orbital-mechanics.space/time-since-periapsis-and-keplers-equation/hyperbolic-trajectories.html#equation-eq-hyperbolic-keplers-equation
pub fn try_estimate_anomaly(M: Num, e: Num, max_iterations: usize) -> Result<Num, KeplerError> {
    let F0 = (2.0 * M.abs() / e + 1.8).ln();
    if !F0.is_finite() {
        return Ok(M);
    }

    let s = if M < 0.0 { -1.0 } else { 1.0 };
    let M = M.abs();

    newton_approx(
        // f(F) = e * sinh(F) - F - M
        |F| (e * F.sinh()) - F - M,
        // f'(F) = e * cosh(F) - 1
        |F| e * F.cosh() - 1.0,
        F0,
        HYPERBOLIC_TOLERANCE,
        max_iterations,
    )
    .map(|F| s * F)
    .map_err(|KeplerError::NotConverged { estimate, iterations }| KeplerError::NotConverged {
        estimate: s * estimate,
        iterations,
    })
}

/// Best-effort solve: on non-convergence the last estimate is returned and the
/// event is logged.
pub fn estimate_anomaly(M: Num, e: Num) -> Num {
    try_estimate_anomaly(M, e, HYPERBOLIC_MAX_ITERATIONS).unwrap_or_else(|err| {
        warn!(mean_anomaly = M, eccentricity = e, %err, "Hyperbolic Kepler solve did not converge");
        err.estimate()
    })
}

/// Hyperbolic mean motion, `sqrt(μ / a³)`.
/// SRC: https://orbital-mechanics.space/time-since-periapsis-and-keplers-equation/hyperbolic-trajectories.html#equation-eq-hyperbolic-mean-anomaly
pub fn mean_motion(mg: Num, a: Num) -> Num {
    (mg / a.powi(3)).sqrt()
}

pub fn mean_anomaly(F: Num, e: Num) -> Num {
    e * F.sinh() - F
}

pub fn true_anomaly(F: Num, e: Num) -> Num {
    ((e * e - 1.0).sqrt() * F.sinh()).atan2(e - F.cosh())
}

/// Hyperbolic anomaly for a true anomaly, taken in `(-π, π]`.
pub fn eccentric_anomaly(v: Num, e: Num) -> Num {
    let mut v = v.rem_euclid(TWO_PI);
    if v > PI {
        v -= TWO_PI;
    }

    let cos_v = v.cos();
    acosh_or_zero((e + cos_v) / (1.0 + e * cos_v)) * sign(v)
}
