#![allow(non_snake_case)]

use crate::astro::{self, elliptic, hyperbolic, standard_gravitational_parameter};
use crate::constants::{EPSILON, MIN_COMPRESSION_RATIO};
use crate::math::{acosh_or_zero, angle_between, normalize_or_zero};
use crate::{Num, Quat, StateVectors, Vec3, DEFAULT_G, PI, TWO_PI};

/// Orbit of one body around one attractor.
///
/// The inputs are `position` and `velocity` relative to the attractor,
/// `attractor_mass`, `gravitational_constant` and the ecliptic reference
/// vectors. Everything else is derived by [`OrbitElements::recompute`] and is
/// only meaningful while [`OrbitElements::is_dirty`] is false.
///
/// All shape formulas branch on `eccentricity < 1` (ellipse) versus
/// `eccentricity >= 1` (hyperbola, with the parabolic boundary folded in).
/// For ellipses the anomalies live in `[0, 2π)`; on the hyperbolic branch the
/// eccentric anomaly is the hyperbolic anomaly `F` and the mean anomaly is
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrbitElements {
    pub gravitational_constant: Num,
    pub ecliptic_normal: Vec3,
    /// Up direction on the ecliptic plane
    pub ecliptic_up: Vec3,

    pub position: Vec3,
    pub velocity: Vec3,
    pub attractor_mass: Num,
    pub attractor_distance: Num,

    pub semi_minor_axis: Num,
    pub semi_major_axis: Num,
    pub focal_parameter: Num,
    pub eccentricity: Num,
    pub energy_total: Num,
    pub period: Num,
    pub true_anomaly: Num,
    pub mean_anomaly: Num,
    pub eccentric_anomaly: Num,
    pub periapsis: Vec3,
    pub periapsis_distance: Num,
    pub apoapsis: Vec3,
    pub apoapsis_distance: Num,
    pub center_point: Vec3,
    pub orbit_compression_ratio: Num,
    pub orbit_normal: Vec3,
    pub semi_minor_axis_basis: Vec3,
    pub semi_major_axis_basis: Vec3,
    pub inclination: Num,
    /// Positive when the orbit turns the same way as the ecliptic normal
    pub orbit_normal_dot_ecliptic_normal: Num,

    dirty: bool,
}

impl Default for OrbitElements {
    fn default() -> Self {
        Self {
            gravitational_constant: DEFAULT_G,
            ecliptic_normal: Vec3::NEG_Z,
            ecliptic_up: Vec3::Y,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            attractor_mass: 0.0,
            attractor_distance: 0.0,
            semi_minor_axis: 0.0,
            semi_major_axis: 0.0,
            focal_parameter: 0.0,
            eccentricity: 0.0,
            energy_total: 0.0,
            period: 0.0,
            true_anomaly: 0.0,
            mean_anomaly: 0.0,
            eccentric_anomaly: 0.0,
            periapsis: Vec3::ZERO,
            periapsis_distance: 0.0,
            apoapsis: Vec3::ZERO,
            apoapsis_distance: 0.0,
            center_point: Vec3::ZERO,
            orbit_compression_ratio: 0.0,
            orbit_normal: Vec3::ZERO,
            semi_minor_axis_basis: Vec3::ZERO,
            semi_major_axis_basis: Vec3::ZERO,
            inclination: 0.0,
            orbit_normal_dot_ecliptic_normal: 0.0,
            dirty: true,
        }
    }
}

impl OrbitElements {
    pub fn new(position: Vec3, velocity: Vec3, attractor_mass: Num, g: Num) -> Self {
        let mut elements = Self {
            gravitational_constant: g,
            position,
            velocity,
            attractor_mass,
            ..Default::default()
        };
        elements.recompute();
        elements
    }

    pub fn from_state_vectors(state_vectors: &StateVectors, attractor_mass: Num, g: Num) -> Self {
        Self::new(state_vectors.position, state_vectors.velocity, attractor_mass, g)
    }

    /// Replaces the ecliptic reference vectors and recomputes.
    pub fn with_ecliptic(mut self, normal: Vec3, up: Vec3) -> Self {
        self.ecliptic_normal = normal;
        self.ecliptic_up = up;
        self.recompute();
        self
    }

    pub fn state_vectors(&self) -> StateVectors {
        StateVectors::new(self.position, self.velocity)
    }

    #[inline]
    pub fn mg(&self) -> Num {
        standard_gravitational_parameter(self.attractor_mass, self.gravitational_constant)
    }

    pub fn is_valid_orbit(&self) -> bool {
        self.eccentricity >= 0.0
            && self.period > EPSILON
            && self.attractor_distance > EPSILON
            && self.attractor_mass > EPSILON
    }

    pub fn is_elliptical(&self) -> bool {
        self.eccentricity < 1.0
    }

    pub fn is_hyperbolic(&self) -> bool {
        self.eccentricity >= 1.0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Updates the relative state and attractor mass, leaving the derived
    /// fields stale until the next [`OrbitElements::recompute`].
    pub fn set_state(&mut self, position: Vec3, velocity: Vec3, attractor_mass: Num) {
        self.position = position;
        self.velocity = velocity;
        self.attractor_mass = attractor_mass;
        self.dirty = true;
    }

    pub fn recompute_if_dirty(&mut self) {
        if self.dirty {
            self.recompute();
        }
    }

    /// Derives every orbital element from `position`, `velocity` and the
    /// attractor mass.
    ///
    /// Never fails. Degenerate input (no angular momentum, massless
    /// attractor, body sitting on the attractor) yields a finite best-effort
    /// orbit with [`OrbitElements::is_valid_orbit`] returning false.
    pub fn recompute(&mut self) {
        self.dirty = false;

        let mg = self.mg();
        self.attractor_distance = self.position.length();

        let angular_momentum = self.position.cross(self.velocity);
        self.orbit_normal = normalize_or_zero(angular_momentum);

        let degenerate = !(0.9..=1.1).contains(&self.orbit_normal.length_squared());
        if degenerate {
            // Radial or resting motion, orient the plane by the ecliptic
            self.orbit_normal = normalize_or_zero(self.position.cross(self.ecliptic_up));
        }

        let ecc_vector = if degenerate || mg <= EPSILON {
            Vec3::ZERO
        } else {
            self.velocity.cross(angular_momentum) / mg - self.position / self.attractor_distance
        };

        self.orbit_normal_dot_ecliptic_normal = self.orbit_normal.dot(self.ecliptic_normal);
        self.focal_parameter = if mg > EPSILON {
            angular_momentum.length_squared() / mg
        } else {
            0.0
        };
        self.eccentricity = ecc_vector.length();
        self.energy_total = if self.attractor_distance > EPSILON {
            self.velocity.length_squared() - 2.0 * mg / self.attractor_distance
        } else {
            self.velocity.length_squared()
        };

        self.semi_minor_axis_basis = normalize_or_zero(angular_momentum.cross(ecc_vector));
        if self.semi_minor_axis_basis.length_squared() < 0.5 {
            self.semi_minor_axis_basis = normalize_or_zero(self.orbit_normal.cross(self.position));
        }
        self.semi_major_axis_basis =
            normalize_or_zero(self.orbit_normal.cross(self.semi_minor_axis_basis));
        self.inclination = angle_between(self.orbit_normal, self.ecliptic_normal);

        let e = self.eccentricity;
        let position_cross_major = self.position.cross(self.semi_major_axis_basis);
        let retrograde_half = position_cross_major.dot(self.orbit_normal) < 0.0;

        if self.is_elliptical() {
            self.orbit_compression_ratio = (1.0 - e * e).max(MIN_COMPRESSION_RATIO);
            self.semi_major_axis = self.focal_parameter / self.orbit_compression_ratio;
            self.semi_minor_axis = self.semi_major_axis * self.orbit_compression_ratio.sqrt();
            self.center_point = -self.semi_major_axis * ecc_vector;
            self.period = if mg > EPSILON {
                astro::period(self.semi_major_axis, mg)
            } else {
                0.0
            };
            self.apoapsis = self.center_point + self.semi_major_axis_basis * self.semi_major_axis;
            self.periapsis = self.center_point - self.semi_major_axis_basis * self.semi_major_axis;
            self.periapsis_distance = self.periapsis.length();
            self.apoapsis_distance = self.apoapsis.length();

            let mut true_anomaly = angle_between(self.position, -self.semi_major_axis_basis);
            if retrograde_half {
                true_anomaly = TWO_PI - true_anomaly;
            }
            self.true_anomaly = true_anomaly;
            self.eccentric_anomaly = elliptic::eccentric_anomaly(true_anomaly, e);
            self.mean_anomaly = elliptic::mean_anomaly(self.eccentric_anomaly, e);
        } else {
            self.orbit_compression_ratio = (e * e - 1.0).max(MIN_COMPRESSION_RATIO);
            self.semi_major_axis = self.focal_parameter / self.orbit_compression_ratio;
            self.semi_minor_axis = self.semi_major_axis * self.orbit_compression_ratio.sqrt();
            self.center_point = self.semi_major_axis * ecc_vector;
            self.period = Num::INFINITY;
            self.apoapsis = Vec3::splat(Num::INFINITY);
            self.periapsis = self.center_point + self.semi_major_axis_basis * self.semi_major_axis;
            self.periapsis_distance = self.periapsis.length();
            self.apoapsis_distance = Num::INFINITY;

            let mut true_anomaly = angle_between(self.position, ecc_vector);
            if retrograde_half {
                true_anomaly = -true_anomaly;
            }
            self.true_anomaly = true_anomaly;
            self.eccentric_anomaly = hyperbolic::eccentric_anomaly(true_anomaly, e);
            self.mean_anomaly = hyperbolic::mean_anomaly(self.eccentric_anomaly, e);
        }
    }

    /// Position relative to the orbit center, in the orbit plane.
    pub fn central_position_at_eccentric_anomaly(&self, E: Num) -> Vec3 {
        let (x, y) = if self.is_elliptical() {
            (E.sin() * self.semi_minor_axis, -E.cos() * self.semi_major_axis)
        } else {
            (E.sinh() * self.semi_minor_axis, E.cosh() * self.semi_major_axis)
        };

        self.semi_minor_axis_basis * x + self.semi_major_axis_basis * y
    }

    pub fn central_position_at_true_anomaly(&self, v: Num) -> Vec3 {
        let E = astro::true_to_eccentric(v, self.eccentricity);
        self.central_position_at_eccentric_anomaly(E)
    }

    /// Position relative to the attractor (the focus).
    pub fn focal_position_at_eccentric_anomaly(&self, E: Num) -> Vec3 {
        self.central_position_at_eccentric_anomaly(E) + self.center_point
    }

    pub fn focal_position_at_true_anomaly(&self, v: Num) -> Vec3 {
        self.central_position_at_true_anomaly(v) + self.center_point
    }

    pub fn central_position(&self) -> Vec3 {
        self.position - self.center_point
    }

    pub fn velocity_at_true_anomaly(&self, v: Num) -> Vec3 {
        if self.focal_parameter < 1e-5 {
            return Vec3::ZERO;
        }

        let k = (self.mg() / self.focal_parameter).sqrt();
        let vx = k * (self.eccentricity + v.cos());
        let vy = k * v.sin();

        self.semi_minor_axis_basis * vx + self.semi_major_axis_basis * vy
    }

    pub fn velocity_at_eccentric_anomaly(&self, E: Num) -> Vec3 {
        self.velocity_at_true_anomaly(astro::eccentric_to_true(E, self.eccentricity))
    }

    /// Samples the orbit as a polyline around `origin`.
    ///
    /// Ellipses are sampled whole unless their apoapsis lies beyond
    /// `max_distance`, in which case only the arc within that distance is
    /// returned. Hyperbolas are always clipped to `max_distance`. Nothing is
    /// returned when even the periapsis is farther away.
    pub fn orbit_points(&self, points_count: usize, origin: Vec3, max_distance: Num) -> Vec<Vec3> {
        if points_count < 2 {
            return Vec::new();
        }

        let last = (points_count - 1) as Num;

        if self.is_elliptical() && self.apoapsis_distance < max_distance {
            return (0..points_count)
                .map(|i| self.focal_position_at_eccentric_anomaly(i as Num * TWO_PI / last) + origin)
                .collect();
        }

        if max_distance < self.periapsis_distance {
            return Vec::new();
        }

        let max_angle =
            astro::true_anomaly_for_distance(max_distance, self.eccentricity, self.semi_major_axis);

        (0..points_count)
            .map(|i| {
                let v = -max_angle + i as Num * 2.0 * max_angle / last;
                self.focal_position_at_true_anomaly(v) + origin
            })
            .collect()
    }

    /// Point where the orbit crosses the ecliptic plane heading "up".
    ///
    /// `None` when the orbit lies in the ecliptic or, for hyperbolas, when the
    /// node direction is outside the asymptotes.
    pub fn ascending_node(&self) -> Option<Vec3> {
        let (nodes_line, s) = self.line_of_nodes()?;
        let e = self.eccentricity;

        let E = if self.is_elliptical() {
            let E = self.node_anomaly(angle_between(nodes_line, self.center_point));
            if s {
                E
            } else {
                TWO_PI - E
            }
        } else {
            let v = angle_between(-nodes_line, self.center_point);
            if v >= (-1.0 / e).acos() {
                return None;
            }
            let cos_v = v.cos();
            let F = acosh_or_zero((e + cos_v) / (1.0 + e * cos_v));
            if s {
                F
            } else {
                -F
            }
        };

        Some(self.focal_position_at_eccentric_anomaly(E))
    }

    pub fn descending_node(&self) -> Option<Vec3> {
        let (nodes_line, s) = self.line_of_nodes()?;
        let e = self.eccentricity;

        let E = if self.is_elliptical() {
            let E = self.node_anomaly(angle_between(nodes_line, -self.center_point));
            if s {
                TWO_PI - E
            } else {
                E
            }
        } else {
            let v = angle_between(nodes_line, self.center_point);
            if v >= (-1.0 / e).acos() {
                return None;
            }
            let cos_v = v.cos();
            let F = acosh_or_zero((e + cos_v) / (1.0 + e * cos_v));
            if s {
                -F
            } else {
                F
            }
        };

        Some(self.focal_position_at_eccentric_anomaly(E))
    }

    fn line_of_nodes(&self) -> Option<(Vec3, bool)> {
        let nodes_line = self.orbit_normal.cross(self.ecliptic_normal);
        if nodes_line.length_squared() < 1e-20 {
            return None;
        }

        let s = nodes_line
            .cross(self.semi_major_axis_basis)
            .dot(self.orbit_normal)
            < 0.0;

        Some((nodes_line, s))
    }

    fn node_anomaly(&self, v: Num) -> Num {
        let e = self.eccentricity;
        let cos_v = v.cos();
        ((e + cos_v) / (1.0 + e * cos_v)).clamp(-1.0, 1.0).acos()
    }

    /// Advances the anomalies along the orbit by `dt` seconds (Kepler
    /// propagation); position and velocity are left untouched.
    pub fn update_anomalies_by_time(&mut self, dt: Num) {
        let e = self.eccentricity;

        if self.is_elliptical() {
            if self.period > 1e-5 {
                self.mean_anomaly += dt * elliptic::mean_motion(self.period);
            }
            self.mean_anomaly = self.mean_anomaly.rem_euclid(TWO_PI);
            self.eccentric_anomaly = elliptic::estimate_anomaly(self.mean_anomaly, e);
            self.true_anomaly = elliptic::true_anomaly(self.eccentric_anomaly, e);
        } else {
            self.mean_anomaly += dt * hyperbolic::mean_motion(self.mg(), self.semi_major_axis);
            self.eccentric_anomaly = hyperbolic::estimate_anomaly(self.mean_anomaly, e);
            self.true_anomaly = hyperbolic::true_anomaly(self.eccentric_anomaly, e);
        }
    }

    /// Kepler propagation of the full state by `dt` seconds.
    pub fn update_by_time(&mut self, dt: Num) {
        self.update_anomalies_by_time(dt);
        self.set_position_by_current_anomaly();
        self.set_velocity_by_current_anomaly();
    }

    pub fn set_position_by_current_anomaly(&mut self) {
        self.position = self.focal_position_at_eccentric_anomaly(self.eccentric_anomaly);
    }

    pub fn set_velocity_by_current_anomaly(&mut self) {
        self.velocity = self.velocity_at_eccentric_anomaly(self.eccentric_anomaly);
    }

    /// Reshapes the orbit to eccentricity `|e|`, keeping the periapsis
    /// distance, orientation and mean anomaly.
    pub fn set_eccentricity(&mut self, e: Num) {
        if !self.is_valid_orbit() {
            return;
        }

        let e = e.abs();
        let periapsis_distance = self.periapsis_distance;

        self.eccentricity = e;
        let compression = if e < 1.0 { 1.0 - e * e } else { e * e - 1.0 };
        let compression = compression.max(MIN_COMPRESSION_RATIO);
        self.semi_major_axis = (periapsis_distance / (1.0 - e)).abs();
        self.focal_parameter = self.semi_major_axis * compression;
        self.semi_minor_axis = self.semi_major_axis * compression.sqrt();

        // The major axis basis points from periapsis to apoapsis
        self.center_point = if e < 1.0 {
            self.semi_major_axis * e * self.semi_major_axis_basis
        } else {
            -self.semi_major_axis * e * self.semi_major_axis_basis
        };

        if e < 1.0 {
            self.mean_anomaly = self.mean_anomaly.rem_euclid(TWO_PI);
        }
        self.eccentric_anomaly = astro::mean_to_eccentric(self.mean_anomaly, e);
        self.true_anomaly = astro::eccentric_to_true(self.eccentric_anomaly, e);

        self.set_velocity_by_current_anomaly();
        self.set_position_by_current_anomaly();
        self.recompute();
    }

    pub fn set_mean_anomaly(&mut self, M: Num) {
        if !self.is_valid_orbit() {
            return;
        }

        let e = self.eccentricity;
        self.mean_anomaly = if self.is_elliptical() {
            M.rem_euclid(TWO_PI)
        } else {
            M
        };
        self.eccentric_anomaly = astro::mean_to_eccentric(self.mean_anomaly, e);
        self.true_anomaly = astro::eccentric_to_true(self.eccentric_anomaly, e);

        self.set_position_by_current_anomaly();
        self.set_velocity_by_current_anomaly();
    }

    pub fn set_true_anomaly(&mut self, v: Num) {
        if !self.is_valid_orbit() {
            return;
        }

        let e = self.eccentricity;
        let v = v.rem_euclid(TWO_PI);
        self.true_anomaly = if self.is_hyperbolic() && v > PI {
            v - TWO_PI
        } else {
            v
        };
        self.eccentric_anomaly = astro::true_to_eccentric(self.true_anomaly, e);
        self.mean_anomaly = astro::eccentric_to_mean(self.eccentric_anomaly, e);

        self.set_position_by_current_anomaly();
        self.set_velocity_by_current_anomaly();
    }

    pub fn set_eccentric_anomaly(&mut self, E: Num) {
        if !self.is_valid_orbit() {
            return;
        }

        let e = self.eccentricity;
        self.eccentric_anomaly = if self.is_elliptical() {
            E.rem_euclid(TWO_PI)
        } else {
            E
        };
        self.true_anomaly = astro::eccentric_to_true(self.eccentric_anomaly, e);
        self.mean_anomaly = astro::eccentric_to_mean(self.eccentric_anomaly, e);

        self.set_position_by_current_anomaly();
        self.set_velocity_by_current_anomaly();
    }

    /// Rotates the orbit around its focus.
    pub fn rotate(&mut self, rotation: Quat) {
        self.position = rotation.mul_vec3(self.position);
        self.velocity = rotation.mul_vec3(self.velocity);
        self.recompute();
    }
}
