use tracing::warn;

use crate::astro::acceleration_by_attraction;
use crate::{BodyId, CalculationType, Num, StateVectors, Vec3};

/// Frozen view of one attractor for the duration of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    pub id: BodyId,
    pub position: Vec3,
    pub mg: Num,
    /// Global and per-body limits already combined
    pub max_range: Num,
}

/// Gravity of the attractor snapshot, evaluated for one body.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    pub attractors: &'a [Attractor],
    pub min_range: Num,
    /// The body being advanced, never attracted by itself
    pub exclude: BodyId,
}

impl Field<'_> {
    fn others(&self) -> impl Iterator<Item = &Attractor> + '_ {
        let exclude = self.exclude;
        self.attractors.iter().filter(move |a| a.id != exclude)
    }

    fn pull(&self, attractor: &Attractor, position: Vec3) -> Vec3 {
        acceleration_by_attraction(
            position,
            attractor.position,
            attractor.mg,
            self.min_range,
            attractor.max_range,
        )
    }

    pub fn acceleration(&self, position: Vec3) -> Vec3 {
        self.others().map(|a| self.pull(a, position)).sum()
    }

    /// Velocity change over `dt` from four staged evaluations per attractor,
    /// each stage offset by the previous stage's velocity increment.
    fn runge_kutta_kick(&self, position: Vec3, dt: Num) -> Vec3 {
        self.others()
            .map(|a| {
                let t1 = self.pull(a, position) * dt;
                let t2 = self.pull(a, position + t1 * 0.5) * dt;
                let t3 = self.pull(a, position + t2 * 0.5) * dt;
                let t4 = self.pull(a, position + t3) * dt;

                (t1 + t2 * 2.0 + t3 * 2.0 + t4) / 6.0
            })
            .sum()
    }
}

/// Advances one body by `dt`. The queued `impulse` is added right after the
/// gravitational velocity update.
///
/// A non-finite velocity, before or after the update, is reset to zero.
/// Positions are left to [`sanitize`].
pub fn integrate(
    scheme: CalculationType,
    field: &Field,
    state: StateVectors,
    impulse: Vec3,
    dt: Num,
) -> StateVectors {
    let StateVectors {
        mut position,
        mut velocity,
    } = state;

    velocity = finite_or_reset(velocity, field.exclude, "velocity");

    match scheme {
        CalculationType::Euler => {
            velocity += field.acceleration(position) * dt;
            velocity = finite_or_reset(velocity + impulse, field.exclude, "velocity");
            position += velocity * dt;
        }
        CalculationType::Verlet => {
            position += velocity * (dt / 2.0);
            velocity += field.acceleration(position) * dt;
            velocity = finite_or_reset(velocity + impulse, field.exclude, "velocity");
            position += velocity * (dt / 2.0);
        }
        CalculationType::RungeKutta4 => {
            position += velocity * (dt / 2.0);
            velocity += field.runge_kutta_kick(position, dt);
            velocity = finite_or_reset(velocity + impulse, field.exclude, "velocity");
            position += velocity * (dt / 2.0);
        }
    }

    StateVectors::new(position, velocity)
}

/// Resets a non-finite position or velocity to zero.
pub fn sanitize(state: StateVectors, body: BodyId) -> StateVectors {
    StateVectors::new(
        finite_or_reset(state.position, body, "position"),
        finite_or_reset(state.velocity, body, "velocity"),
    )
}

fn finite_or_reset(vector: Vec3, body: BodyId, quantity: &'static str) -> Vec3 {
    if vector.is_finite() {
        vector
    } else {
        warn!(?body, quantity, ?vector, "Non-finite state vector, resetting to zero");
        Vec3::ZERO
    }
}
