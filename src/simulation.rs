use tracing::{debug, trace, warn};

use crate::astro::{self, standard_gravitational_parameter};
use crate::math::normalize_or_zero;
use crate::utils::orthogonalize_up;
use crate::{
    Body, BodyId, CalculationType, Num, OrbitElements, Quat, SimulationConfig, SimulationError,
    StateVectors, Vec3,
};

use self::integrator::{integrate, sanitize, Attractor, Field};

mod attractors;
mod integrator;
mod prediction;

/// Owns every body of a scene and advances them tick by tick.
///
/// Within one tick all accelerations are evaluated against the positions the
/// bodies had when the tick started, so the outcome does not depend on the
/// order in which bodies were added.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    config: SimulationConfig,
    bodies: Vec<Body>,
    /// Rebuilt at the start of every tick, read-only afterwards
    attractors: Vec<Attractor>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        let mut simulation = Self {
            config,
            ..Default::default()
        };
        // Reject a degenerate ecliptic up front
        simulation.set_ecliptic_normal(config.ecliptic_normal);
        simulation.set_ecliptic_up(config.ecliptic_up);
        simulation
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn set_calculation_type(&mut self, calculation_type: CalculationType) {
        self.config.calculation_type = calculation_type;
    }

    pub fn set_time_scale(&mut self, time_scale: Num) {
        self.config.time_scale = time_scale;
    }

    pub fn add_body(&mut self, body: impl Into<Body>) -> BodyId {
        let mut body = body.into();
        body.orbit.gravitational_constant = self.config.gravitational_constant;
        body.orbit.ecliptic_normal = self.config.ecliptic_normal;
        body.orbit.ecliptic_up = self.config.ecliptic_up;
        body.orbit.mark_dirty();

        self.bodies.push(body);
        BodyId(self.bodies.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    pub fn body(&self, id: BodyId) -> Result<&Body, SimulationError> {
        self.bodies.get(id.0).ok_or(SimulationError::UnknownBody(id))
    }

    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut Body, SimulationError> {
        self.bodies
            .get_mut(id.0)
            .ok_or(SimulationError::UnknownBody(id))
    }

    /// Bodies that attracted others during the last tick.
    pub fn attractors(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.attractors.iter().map(|a| a.id)
    }

    pub fn set_active(&mut self, id: BodyId, active: bool) -> Result<(), SimulationError> {
        self.body_mut(id)?.active = active;
        Ok(())
    }

    pub fn set_fixed(&mut self, id: BodyId, fixed: bool) -> Result<(), SimulationError> {
        self.body_mut(id)?.is_fixed = fixed;
        Ok(())
    }

    pub fn set_position(&mut self, id: BodyId, position: Vec3) -> Result<(), SimulationError> {
        self.body_mut(id)?.set_position(position);
        Ok(())
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec3) -> Result<(), SimulationError> {
        self.body_mut(id)?.set_velocity(velocity);
        Ok(())
    }

    pub fn add_external_velocity(
        &mut self,
        id: BodyId,
        delta_velocity: Vec3,
    ) -> Result<(), SimulationError> {
        self.body_mut(id)?.add_external_velocity(delta_velocity);
        Ok(())
    }

    pub fn add_external_force(&mut self, id: BodyId, force: Vec3) -> Result<(), SimulationError> {
        self.body_mut(id)?.add_external_force(force);
        Ok(())
    }

    /// Advances by a frame duration scaled with the configured time scale.
    pub fn update(&mut self, frame_dt: Num) -> Result<(), SimulationError> {
        self.step(frame_dt * self.config.time_scale)
    }

    /// Advances every active, non-fixed body by `dt` seconds.
    ///
    /// Kepler-motion bodies follow their analytic orbit. Every other body is
    /// integrated with the configured [`CalculationType`] against the
    /// attractors as they were when the tick started. Orbits are then
    /// recomputed, queued attractor requests resolved and periodic attractor
    /// searches run.
    pub fn step(&mut self, dt: Num) -> Result<(), SimulationError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimulationError::InvalidTimestep(dt));
        }

        if self.config.keep_bodies_on_ecliptic {
            self.project_all_onto_ecliptic();
        }

        self.sanitize_bodies();
        self.rebuild_attractor_cache();

        let snapshot: Vec<StateVectors> = self.bodies.iter().map(Body::state_vectors).collect();
        let mut next = snapshot.clone();

        self.advance_kepler_bodies(&snapshot, &mut next, dt);
        self.advance_newtonian_bodies(&snapshot, &mut next, dt);

        for (body, state) in self.bodies.iter_mut().zip(next) {
            body.set_state(state);
        }
        self.sanitize_bodies();

        self.recompute_dirty_orbits();
        self.resolve_attractor_requests();
        self.run_attractor_searches(dt)
    }

    /// Resets non-finite positions and velocities to zero.
    fn sanitize_bodies(&mut self) {
        for (i, body) in self.bodies.iter_mut().enumerate() {
            let state = body.state_vectors();
            if !state.is_finite() {
                body.set_state(sanitize(state, BodyId(i)));
                body.orbit.mark_dirty();
            }
        }
    }

    fn rebuild_attractor_cache(&mut self) {
        let SimulationConfig {
            gravitational_constant,
            max_attraction_range,
            min_attractor_mass,
            ..
        } = self.config;

        self.attractors.clear();
        self.attractors.extend(
            self.bodies
                .iter()
                .enumerate()
                .filter(|(_, b)| b.active && b.mass() > min_attractor_mass)
                .map(|(i, b)| Attractor {
                    id: BodyId(i),
                    position: b.position(),
                    mg: standard_gravitational_parameter(b.mass(), gravitational_constant),
                    max_range: max_attraction_range.min(b.max_attraction_range),
                }),
        );

        trace!(attractors = self.attractors.len(), "Attractor cache rebuilt");
    }

    fn advance_kepler_bodies(&mut self, snapshot: &[StateVectors], next: &mut [StateVectors], dt: Num) {
        for i in 0..self.bodies.len() {
            let body = &self.bodies[i];
            if !body.active || body.is_fixed || !body.is_kepler_motion() {
                continue;
            }

            let rectilinear = snapshot[i].position + snapshot[i].velocity * dt;

            let Some(attractor) = body.attractor else {
                next[i].position = rectilinear;
                continue;
            };

            let attractor_mass = self.bodies[attractor.0].mass();
            let body = &mut self.bodies[i];

            if attractor_mass < body.mass() {
                debug!(body = i, attractor = attractor.0, "Attractor lighter than body, leaving Kepler motion");
                body.attractor = None;
                body.kepler_motion = false;
                body.orbit.mark_dirty();
                continue;
            }

            let origin = snapshot[attractor.0];
            if body.orbit.is_dirty() {
                let relative = snapshot[i].relative_to(&origin);
                body.orbit
                    .set_state(relative.position, relative.velocity, attractor_mass);
                body.orbit.recompute();
            }

            if !body.orbit.is_valid_orbit() {
                next[i].position = rectilinear;
                continue;
            }

            body.orbit.update_by_time(dt);
            next[i] = StateVectors::new(
                origin.position + body.orbit.position,
                origin.velocity + body.orbit.velocity,
            );
        }
    }

    fn advance_newtonian_bodies(&mut self, snapshot: &[StateVectors], next: &mut [StateVectors], dt: Num) {
        let scheme = self.config.calculation_type;
        let min_range = self.config.min_attraction_range;
        let attractors = &self.attractors;

        for (i, body) in self.bodies.iter_mut().enumerate() {
            if !body.active || body.is_fixed || body.is_kepler_motion() {
                continue;
            }

            let field = Field {
                attractors,
                min_range,
                exclude: BodyId(i),
            };
            let impulse = body.take_additional_velocity();

            next[i] = integrate(scheme, &field, snapshot[i], impulse, dt);
            body.orbit.mark_dirty();

            if body.use_kepler_motion {
                // Back on rails from the next tick
                body.kepler_motion = true;
            }
        }
    }

    fn recompute_dirty_orbits(&mut self) {
        for i in 0..self.bodies.len() {
            if self.bodies[i].orbit.is_dirty() {
                self.refresh_orbit(i);
            }
        }
    }

    /// Recomputes the orbit of the body at `index` relative to its current
    /// attractor. No-op without an attractor.
    fn refresh_orbit(&mut self, index: usize) {
        let Some(attractor) = self.bodies[index].attractor else {
            return;
        };

        let origin = self.bodies[attractor.0].state_vectors();
        let attractor_mass = self.bodies[attractor.0].mass();

        let body = &mut self.bodies[index];
        let relative = body.state_vectors().relative_to(&origin);
        body.orbit
            .set_state(relative.position, relative.velocity, attractor_mass);
        body.orbit.recompute();
    }

    fn index(&self, id: BodyId) -> Result<usize, SimulationError> {
        if id.0 < self.bodies.len() {
            Ok(id.0)
        } else {
            Err(SimulationError::UnknownBody(id))
        }
    }

    /// Up-to-date orbit of a body around its attractor, or `None` when it has
    /// no attractor.
    pub fn orbit_elements(&mut self, id: BodyId) -> Result<Option<&OrbitElements>, SimulationError> {
        let index = self.index(id)?;
        if self.bodies[index].attractor.is_none() {
            return Ok(None);
        }

        if self.bodies[index].orbit.is_dirty() {
            self.refresh_orbit(index);
        }

        Ok(Some(&self.bodies[index].orbit))
    }

    /// Sets the velocity for a circular orbit around the attractor, keeping the
    /// orbit plane. `clockwise` is judged looking down the ecliptic normal.
    ///
    /// Returns false when the body has no attractor.
    pub fn make_orbit_circle(&mut self, id: BodyId, clockwise: bool) -> Result<bool, SimulationError> {
        let index = self.index(id)?;
        let Some(attractor) = self.bodies[index].attractor else {
            return Ok(false);
        };

        if self.bodies[index].orbit.is_dirty() {
            self.refresh_orbit(index);
        }

        let origin = self.bodies[attractor.0].state_vectors();
        let attractor_mass = self.bodies[attractor.0].mass();
        let ecliptic_normal = self.config.ecliptic_normal;

        let body = &mut self.bodies[index];
        let orientation = body.orbit.orbit_normal.dot(ecliptic_normal);
        let mut normal = body.orbit.orbit_normal;
        if (normal.length_squared() - 1.0).abs() > 0.5 {
            normal = ecliptic_normal;
        }
        let sign = if (clockwise && orientation >= 0.0) || (!clockwise && orientation < 0.0) {
            1.0
        } else {
            -1.0
        };

        let velocity = astro::circular_orbit_velocity(
            origin.position,
            body.position(),
            attractor_mass,
            normal * sign,
            self.config.gravitational_constant,
        );
        body.set_velocity(origin.velocity + velocity);

        Ok(true)
    }

    /// Polyline of the body's orbit.
    ///
    /// Without an attractor the body moves in a straight line, drawn as three
    /// points centered on it (empty when it is nearly at rest). In local space
    /// the points are relative to the attractor (or the body itself).
    pub fn orbit_points(
        &mut self,
        id: BodyId,
        points_count: usize,
        local_space: bool,
        max_distance: Num,
    ) -> Result<Vec<Vec3>, SimulationError> {
        let index = self.index(id)?;

        let Some(attractor) = self.bodies[index].attractor else {
            let body = &self.bodies[index];
            if body.velocity().length_squared() < 1e-4 {
                return Ok(Vec::new());
            }

            let direction = normalize_or_zero(body.velocity()) * max_distance;
            let center = if local_space { Vec3::ZERO } else { body.position() };

            return Ok(vec![center - direction, center, center + direction]);
        };

        let origin = if local_space {
            Vec3::ZERO
        } else {
            self.bodies[attractor.0].position()
        };

        Ok(self
            .orbit_elements(id)?
            .map(|orbit| orbit.orbit_points(points_count, origin, max_distance))
            .unwrap_or_default())
    }

    /// Radius of the body's sphere of influence relative to its attractor.
    pub fn sphere_of_influence(&mut self, id: BodyId) -> Result<Option<Num>, SimulationError> {
        let index = self.index(id)?;
        let Some(attractor) = self.bodies[index].attractor else {
            return Ok(None);
        };

        let attractor_mass = self.bodies[attractor.0].mass();
        let body_mass = self.bodies[index].mass();

        Ok(self
            .orbit_elements(id)?
            .map(|orbit| astro::soi(orbit.semi_major_axis, body_mass, attractor_mass)))
    }

    /// Rotates the body's orbit around its attractor. Returns false when the
    /// body has no attractor.
    pub fn rotate_orbit_around_focus(&mut self, id: BodyId, rotation: Quat) -> Result<bool, SimulationError> {
        let index = self.index(id)?;
        let Some(attractor) = self.bodies[index].attractor else {
            return Ok(false);
        };

        self.refresh_orbit(index);
        let origin = self.bodies[attractor.0].state_vectors();

        let body = &mut self.bodies[index];
        body.orbit.rotate(rotation);
        let (position, velocity) = (body.orbit.position, body.orbit.velocity);
        body.set_position(origin.position + position);
        body.set_velocity(origin.velocity + velocity);

        Ok(true)
    }

    pub fn set_gravitational_constant(&mut self, g: Num) {
        self.config.gravitational_constant = g;
        for body in &mut self.bodies {
            body.orbit.gravitational_constant = g;
            body.orbit.mark_dirty();
        }
    }

    /// Changes the gravitational constant and rescales every velocity by
    /// `sqrt(|new / old|)`, so orbits keep their shape.
    pub fn set_gravitational_constant_proportional(&mut self, g: Num) {
        let old = self.config.gravitational_constant;
        if old == g {
            return;
        }

        let ratio = if old.abs() < 1e-23 { 1.0 } else { g / old };
        self.set_gravitational_constant(g);
        self.change_all_velocities_by_factor(ratio.abs().sqrt());
    }

    /// Sets the ecliptic normal, falling back to `-Z` for zero or non-finite
    /// input.
    pub fn set_ecliptic_normal(&mut self, normal: Vec3) {
        let mut normal = normalize_or_zero(normal);
        if !(0.99..=1.01).contains(&normal.length_squared()) {
            warn!(?normal, "Invalid ecliptic normal, using the default");
            normal = Vec3::NEG_Z;
        }

        self.config.ecliptic_normal = normal;
        self.apply_ecliptic();
    }

    /// Sets the ecliptic up vector, orthogonalized against the normal.
    pub fn set_ecliptic_up(&mut self, up: Vec3) {
        let mut up = normalize_or_zero(up);
        if up.length() < 0.9 {
            warn!(?up, "Invalid ecliptic up vector, using the default");
            up = Vec3::Y;
        }

        let normal = self.config.ecliptic_normal;
        let mut orthogonal = orthogonalize_up(normal, up);
        if orthogonal.length() < 0.9 {
            warn!(?up, ?normal, "Ecliptic up is parallel to the normal, using a perpendicular one");
            orthogonal = [Vec3::Y, Vec3::X]
                .into_iter()
                .map(|axis| orthogonalize_up(normal, axis))
                .find(|v| v.length() >= 0.9)
                .unwrap_or(Vec3::X);
        }

        self.config.ecliptic_up = orthogonal;
        self.apply_ecliptic();
    }

    fn apply_ecliptic(&mut self) {
        for body in &mut self.bodies {
            body.orbit.ecliptic_normal = self.config.ecliptic_normal;
            body.orbit.ecliptic_up = self.config.ecliptic_up;
            body.orbit.mark_dirty();
        }
    }

    pub fn project_all_onto_ecliptic(&mut self) {
        let normal = self.config.ecliptic_normal;
        for body in &mut self.bodies {
            body.project_onto_plane(normal);
        }
    }

    pub fn change_all_velocities_by_factor(&mut self, factor: Num) {
        for body in &mut self.bodies {
            body.set_velocity(body.velocity() * factor);
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{vec3, BodyState, DEFAULT_G};

    const SUN_MASS: Num = 5000.0;

    /// Fixed sun at the origin and a light planet on a circular orbit at r = 10.
    fn solar_system(calculation_type: CalculationType) -> (Simulation, BodyId, BodyId) {
        let mut sim = Simulation::new(SimulationConfig {
            calculation_type,
            ..Default::default()
        });

        let sun = sim.add_body(Body::new(BodyState::new(Vec3::ZERO, Vec3::ZERO, SUN_MASS)).fixed());
        let speed = (DEFAULT_G * SUN_MASS / 10.0).sqrt();
        let planet = sim.add_body(BodyState::new(vec3(10.0, 0.0, 0.0), vec3(0.0, speed, 0.0), 1.0));
        assert!(sim.set_attractor(planet, Some(sun)).unwrap());

        (sim, sun, planet)
    }

    #[test_case(-1.0 ; "negative")]
    #[test_case(Num::NAN ; "nan")]
    #[test_case(Num::INFINITY ; "infinite")]
    fn invalid_timestep_is_rejected(dt: Num) {
        let (mut sim, _, planet) = solar_system(CalculationType::Verlet);
        let before = sim.body(planet).unwrap().position();

        assert!(matches!(sim.step(dt), Err(SimulationError::InvalidTimestep(_))));
        assert_eq!(sim.body(planet).unwrap().position(), before);
    }

    #[test]
    fn zero_timestep_keeps_state() {
        let (mut sim, _, planet) = solar_system(CalculationType::Verlet);
        let before = sim.body(planet).unwrap().state_vectors();

        sim.step(0.0).unwrap();

        assert_eq!(sim.body(planet).unwrap().state_vectors(), before);
    }

    #[test]
    fn unknown_body_is_reported() {
        let mut sim = Simulation::default();

        assert_eq!(
            sim.set_velocity(BodyId(3), Vec3::X),
            Err(SimulationError::UnknownBody(BodyId(3)))
        );
        assert!(sim.body(BodyId(0)).is_err());
    }

    #[test_case(CalculationType::Euler)]
    #[test_case(CalculationType::Verlet)]
    #[test_case(CalculationType::RungeKutta4)]
    fn planet_returns_after_one_period(calculation_type: CalculationType) {
        let (mut sim, sun, planet) = solar_system(calculation_type);
        let period = sim.orbit_elements(planet).unwrap().unwrap().period;

        let dt = 0.05;
        for _ in 0..(period / dt).round() as usize {
            sim.step(dt).unwrap();
        }

        let p = sim.body(planet).unwrap().position();
        assert!(p.distance(vec3(10.0, 0.0, 0.0)) < 0.1);
        assert_eq!(sim.body(sun).unwrap().position(), Vec3::ZERO);
        assert!(sim.orbit_elements(planet).unwrap().unwrap().eccentricity < 0.01);
    }

    #[test]
    fn result_does_not_depend_on_body_order() {
        let a = BodyState::new(Vec3::ZERO, vec3(0.0, -0.01, 0.0), SUN_MASS);
        let b = BodyState::new(vec3(10.0, 0.0, 0.0), vec3(0.0, 0.2, 0.0), 500.0);

        let mut forward = Simulation::default();
        let fa = forward.add_body(a);
        let fb = forward.add_body(b);

        let mut backward = Simulation::default();
        let bb = backward.add_body(b);
        let ba = backward.add_body(a);

        for _ in 0..50 {
            forward.step(0.1).unwrap();
            backward.step(0.1).unwrap();
        }

        let fa = forward.body(fa).unwrap().state_vectors();
        let ba = backward.body(ba).unwrap().state_vectors();
        let fb = forward.body(fb).unwrap().state_vectors();
        let bb = backward.body(bb).unwrap().state_vectors();
        assert!(fa.abs_diff(&ba) < 1e-12);
        assert!(fb.abs_diff(&bb) < 1e-12);
        // Both bodies attract each other
        assert!(fa.position.length() > 1e-3);
    }

    #[test]
    fn light_and_inactive_bodies_do_not_attract() {
        let mut sim = Simulation::default();
        let pebble = sim.add_body(BodyState::new(vec3(1.0, 0.0, 0.0), Vec3::ZERO, 50.0));
        let rock = sim.add_body(BodyState::new(vec3(-1.0, 0.0, 0.0), Vec3::ZERO, 5000.0));
        let probe = sim.add_body(BodyState::new(vec3(0.0, 5.0, 0.0), Vec3::ZERO, 1.0));
        sim.set_active(rock, false).unwrap();

        sim.step(1.0).unwrap();

        assert_eq!(sim.attractors().count(), 0);
        assert_eq!(sim.body(probe).unwrap().velocity(), Vec3::ZERO);
        assert_eq!(sim.body(pebble).unwrap().position(), vec3(1.0, 0.0, 0.0));
        assert_eq!(sim.body(rock).unwrap().position(), vec3(-1.0, 0.0, 0.0));
    }

    #[test]
    fn external_velocity_is_applied_once() {
        let mut sim = Simulation::new(SimulationConfig {
            calculation_type: CalculationType::Euler,
            ..Default::default()
        });
        let ball = sim.add_body(BodyState::new(Vec3::ZERO, Vec3::ZERO, 2.0));

        sim.add_external_force(ball, vec3(2.0, 0.0, 0.0)).unwrap();
        sim.step(1.0).unwrap();
        sim.step(1.0).unwrap();

        let body = sim.body(ball).unwrap();
        assert_eq!(body.velocity(), vec3(1.0, 0.0, 0.0));
        assert_eq!(body.position(), vec3(2.0, 0.0, 0.0));
    }

    #[test]
    fn kepler_motion_follows_the_orbit() {
        let (mut sim, _, planet) = solar_system(CalculationType::Euler);
        sim.body_mut(planet).unwrap().use_kepler_motion = true;
        sim.set_velocity(planet, vec3(0.0, 0.25, 0.0)).unwrap();
        let start = sim.body(planet).unwrap().state_vectors();
        let period = sim.orbit_elements(planet).unwrap().unwrap().period;

        let steps = 100;
        for _ in 0..steps {
            sim.step(period / steps as Num).unwrap();
            assert!(sim.body(planet).unwrap().is_kepler_motion());
        }

        let end = sim.body(planet).unwrap().state_vectors();
        assert!(end.abs_diff(&start) < 1e-6);
    }

    #[test]
    fn impulse_interrupts_kepler_motion_for_one_tick() {
        let (mut sim, _, planet) = solar_system(CalculationType::Euler);
        sim.body_mut(planet).unwrap().use_kepler_motion = true;

        sim.add_external_velocity(planet, vec3(0.0, 0.05, 0.0)).unwrap();
        assert!(!sim.body(planet).unwrap().is_kepler_motion());

        sim.step(0.1).unwrap();

        assert!(sim.body(planet).unwrap().is_kepler_motion());
        assert!(sim.orbit_elements(planet).unwrap().unwrap().eccentricity > 0.1);
    }

    #[test]
    fn kepler_body_leaves_lighter_attractor() {
        let mut sim = Simulation::default();
        let sun = sim.add_body(BodyState::new(Vec3::ZERO, Vec3::ZERO, SUN_MASS));
        let planet = sim.add_body(
            Body::new(BodyState::new(vec3(10.0, 0.0, 0.0), vec3(0.0, 0.2, 0.0), 1000.0))
                .with_kepler_motion(),
        );
        sim.set_attractor(planet, Some(sun)).unwrap();

        sim.body_mut(sun).unwrap().set_mass(10.0);
        sim.step(0.1).unwrap();

        let body = sim.body(planet).unwrap();
        assert_eq!(body.attractor(), None);
        assert!(body.position().y > 0.0);
    }

    #[test]
    fn time_scale_multiplies_frame_time() {
        let (mut scaled, _, a) = solar_system(CalculationType::Verlet);
        let (mut plain, _, b) = solar_system(CalculationType::Verlet);
        scaled.set_time_scale(2.0);

        scaled.update(0.5).unwrap();
        plain.step(1.0).unwrap();

        assert_eq!(scaled.body(a).unwrap().position(), plain.body(b).unwrap().position());
    }

    #[test]
    fn make_orbit_circle_respects_direction() {
        let (mut sim, _, planet) = solar_system(CalculationType::Verlet);
        sim.set_velocity(planet, Vec3::ZERO).unwrap();

        assert!(sim.make_orbit_circle(planet, true).unwrap());
        let clockwise = sim.body(planet).unwrap().velocity();
        assert!(clockwise.y > 0.0);
        assert!(sim.orbit_elements(planet).unwrap().unwrap().eccentricity < 1e-9);

        assert!(sim.make_orbit_circle(planet, false).unwrap());
        assert!(sim.body(planet).unwrap().velocity().y < 0.0);
    }

    #[test]
    fn orbit_points_without_attractor_are_a_line() {
        let mut sim = Simulation::default();
        let ball = sim.add_body(BodyState::new(vec3(1.0, 1.0, 0.0), vec3(2.0, 0.0, 0.0), 1.0));
        let still = sim.add_body(BodyState::new(Vec3::ZERO, vec3(0.001, 0.0, 0.0), 1.0));

        let points = sim.orbit_points(ball, 50, false, 10.0).unwrap();

        assert_eq!(
            points,
            vec![vec3(-9.0, 1.0, 0.0), vec3(1.0, 1.0, 0.0), vec3(11.0, 1.0, 0.0)]
        );
        assert!(sim.orbit_points(still, 50, false, 10.0).unwrap().is_empty());
    }

    #[test]
    fn orbit_points_follow_attractor() {
        let (mut sim, sun, planet) = solar_system(CalculationType::Verlet);
        sim.set_position(sun, vec3(100.0, 0.0, 0.0)).unwrap();
        sim.set_position(planet, vec3(110.0, 0.0, 0.0)).unwrap();

        let world = sim.orbit_points(planet, 16, false, 1000.0).unwrap();
        let local = sim.orbit_points(planet, 16, true, 1000.0).unwrap();

        assert_eq!(world.len(), 16);
        for (w, l) in world.iter().zip(&local) {
            assert!(w.distance(*l + vec3(100.0, 0.0, 0.0)) < 1e-9);
            assert!((l.length() - 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn sphere_of_influence_uses_semi_major_axis() {
        let (mut sim, sun, planet) = solar_system(CalculationType::Verlet);

        let soi = sim.sphere_of_influence(planet).unwrap().unwrap();

        assert!((soi - astro::soi(10.0, 1.0, SUN_MASS)).abs() < 1e-9);
        assert_eq!(sim.sphere_of_influence(sun).unwrap(), None);
    }

    #[test]
    fn proportional_gravity_keeps_orbit_shape() {
        let (mut sim, _, planet) = solar_system(CalculationType::Verlet);

        sim.set_gravitational_constant_proportional(4.0 * DEFAULT_G);

        assert!((sim.body(planet).unwrap().velocity().y - 2.0 * (0.05_f64).sqrt()).abs() < 1e-12);
        let orbit = sim.orbit_elements(planet).unwrap().unwrap();
        assert!(orbit.eccentricity < 1e-9);
        assert_eq!(orbit.gravitational_constant, 4.0 * DEFAULT_G);
    }

    #[test]
    fn invalid_ecliptic_falls_back_to_defaults() {
        let mut sim = Simulation::default();

        sim.set_ecliptic_normal(Vec3::ZERO);
        assert_eq!(sim.config().ecliptic_normal, Vec3::NEG_Z);

        sim.set_ecliptic_up(vec3(0.0, 1.0, 1.0));
        let up = sim.config().ecliptic_up;
        assert!(up.dot(Vec3::NEG_Z).abs() < 1e-12);
        assert!(up.y > 0.9);
    }

    #[test]
    fn non_finite_attractor_is_reset() {
        let mut sim = Simulation::default();
        let broken = sim.add_body(BodyState::new(vec3(Num::NAN, 0.0, 0.0), Vec3::ZERO, SUN_MASS));
        let ball = sim.add_body(BodyState::new(vec3(50.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0), 1.0));

        for _ in 0..3 {
            sim.step(0.02).unwrap();
        }

        assert_eq!(sim.body(broken).unwrap().position(), Vec3::ZERO);
        let velocity = sim.body(ball).unwrap().velocity();
        assert!(velocity.x < 0.0);
        assert!((velocity.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn parallel_ecliptic_up_is_replaced() {
        let sim = Simulation::new(SimulationConfig {
            ecliptic_normal: Vec3::Y,
            ecliptic_up: Vec3::Y,
            ..Default::default()
        });

        let up = sim.config().ecliptic_up;
        assert!(up.dot(Vec3::Y).abs() < 1e-12);
        assert!((up.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bodies_are_kept_on_ecliptic() {
        let mut sim = Simulation::new(SimulationConfig {
            keep_bodies_on_ecliptic: true,
            ..Default::default()
        });
        let ball = sim.add_body(BodyState::new(vec3(1.0, 0.0, 4.0), vec3(0.0, 1.0, 1.0), 1.0));

        sim.step(0.5).unwrap();

        let body = sim.body(ball).unwrap();
        assert_eq!(body.position().z, 0.0);
        assert_eq!(body.velocity().z, 0.0);
    }

    #[test]
    fn rotation_moves_body_around_attractor() {
        let (mut sim, _, planet) = solar_system(CalculationType::Verlet);

        assert!(sim
            .rotate_orbit_around_focus(planet, Quat::from_rotation_z(std::f64::consts::FRAC_PI_2))
            .unwrap());

        let body = sim.body(planet).unwrap();
        assert!(body.position().distance(vec3(0.0, 10.0, 0.0)) < 1e-9);
        assert!(body.velocity().x < 0.0);
    }
}
