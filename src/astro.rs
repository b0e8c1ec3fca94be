use crate::math::normalize_or_zero;
use crate::{Num, Vec3, TWO_PI};

pub mod elliptic;
pub mod hyperbolic;

/// https://en.wikipedia.org/wiki/Standard_gravitational_parameter
#[inline]
pub fn standard_gravitational_parameter(mass: Num, g: Num) -> Num {
    g * mass
}

/// Sphere of influence radius of a body of mass `m1` orbiting a body of mass
/// `m2` with semi-major axis `r`.
pub fn soi(r: Num, m1: Num, m2: Num) -> Num {
    r * (m1 / m2).powf(2.0 / 5.0)
}

/// https://en.wikipedia.org/wiki/Orbital_period
pub fn period(a: Num, mg: Num) -> Num {
    TWO_PI * (a.powi(3) / mg).sqrt()
}

/// Velocity needed for a circular orbit around the attractor, in the plane
/// with the given normal.
pub fn circular_orbit_velocity(
    attractor_position: Vec3,
    body_position: Vec3,
    attractor_mass: Num,
    orbit_normal: Vec3,
    g: Num,
) -> Vec3 {
    let distance = body_position - attractor_position;
    let speed = (standard_gravitational_parameter(attractor_mass, g) / distance.length()).sqrt();

    normalize_or_zero(distance.cross(orbit_normal)) * speed
}

pub fn barycenter(p1: Vec3, m1: Num, p2: Vec3, m2: Num) -> Vec3 {
    (p1 * m1 + p2 * m2) / (m1 + m2)
}

/// Newtonian acceleration of a body towards an attractor.
///
/// The acceleration is masked to zero when the separation is below
/// `min_range` (no singular pull at near-zero distance) or, for a non-zero
/// `max_range`, above it.
#[inline]
pub fn acceleration_by_attraction(
    body_position: Vec3,
    attractor_position: Vec3,
    attractor_mg: Num,
    min_range: Num,
    max_range: Num,
) -> Vec3 {
    let distance = attractor_position - body_position;
    let d2 = distance.length_squared();

    if (max_range != 0.0 && d2 > max_range * max_range) || d2 < min_range * min_range {
        return Vec3::ZERO;
    }

    let d = d2.sqrt();
    distance * attractor_mg / (d * d * d)
}

/// Ratio of the pull of `perturbing` to the pull of `main` on a body at
/// `target`. Used to pick the dominant attractor.
pub fn relative_perturbation_ratio(
    target: Vec3,
    main_position: Vec3,
    main_mg: Num,
    perturbing_position: Vec3,
    perturbing_mg: Num,
) -> Num {
    let main = acceleration_by_attraction(target, main_position, main_mg, 0.1, 0.0).length();
    let perturbing =
        acceleration_by_attraction(target, perturbing_position, perturbing_mg, 0.1, 0.0).length();

    perturbing / main
}

/// Solves Kepler's equation for the eccentric (or hyperbolic) anomaly.
pub fn mean_to_eccentric(mean_anomaly: Num, e: Num) -> Num {
    if e < 1.0 {
        elliptic::estimate_anomaly(mean_anomaly, e)
    } else {
        hyperbolic::estimate_anomaly(mean_anomaly, e)
    }
}

pub fn eccentric_to_mean(eccentric_anomaly: Num, e: Num) -> Num {
    if e < 1.0 {
        elliptic::mean_anomaly(eccentric_anomaly, e)
    } else {
        hyperbolic::mean_anomaly(eccentric_anomaly, e)
    }
}

pub fn eccentric_to_true(eccentric_anomaly: Num, e: Num) -> Num {
    if e < 1.0 {
        elliptic::true_anomaly(eccentric_anomaly, e)
    } else {
        hyperbolic::true_anomaly(eccentric_anomaly, e)
    }
}

pub fn true_to_eccentric(true_anomaly: Num, e: Num) -> Num {
    if e < 1.0 {
        elliptic::eccentric_anomaly(true_anomaly, e)
    } else {
        hyperbolic::eccentric_anomaly(true_anomaly, e)
    }
}

/// True anomaly at which an orbit with eccentricity `e` and semi-major axis
/// `a` reaches `distance` from its focus.
pub fn true_anomaly_for_distance(distance: Num, e: Num, a: Num) -> Num {
    let compression = if e < 1.0 { 1.0 - e * e } else { e * e - 1.0 };

    ((a * compression - distance) / (distance * e))
        .clamp(-1.0, 1.0)
        .acos()
}
