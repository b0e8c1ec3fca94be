//! Look-ahead of a launched projectile through a fixed set of attractors.
//!
//! Attractors never move during a prediction, which keeps a run linear in
//! `steps × attractors` and independent of the live simulation.

use tracing::warn;

use crate::astro::{acceleration_by_attraction, standard_gravitational_parameter};
use crate::math::normalize_or_zero;
use crate::{BodyState, Num, PredictorConfig, StateVectors, Vec3};

pub use self::run::{PredictionRun, RunStatus, StopCondition, StopReason};
pub use self::trailing::{TrailingWindow, WindowState};

mod run;
mod trailing;

/// The passive body whose path is predicted.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Projectile {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: Num,
    pub radius: Num,
    /// Fraction of velocity lost per second
    pub drag: Num,
}

impl Projectile {
    pub fn new(position: Vec3, velocity: Vec3, mass: Num) -> Self {
        Self {
            position,
            velocity,
            mass,
            radius: 0.0,
            drag: 0.0,
        }
    }

    pub fn with_radius(mut self, radius: Num) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_drag(mut self, drag: Num) -> Self {
        self.drag = drag;
        self
    }

    /// Applies a launch impulse acting over one physics tick of length `dt`.
    pub fn launched(mut self, impulse: Vec3, dt: Num) -> Self {
        if self.mass > 0.0 {
            self.velocity += impulse / self.mass * dt;
        } else {
            warn!(mass = self.mass, "Cannot launch a massless projectile, impulse ignored");
        }
        self
    }

    pub fn state_vectors(&self) -> StateVectors {
        StateVectors::new(self.position, self.velocity)
    }
}

impl From<BodyState> for Projectile {
    fn from(state: BodyState) -> Self {
        Self {
            position: state.position,
            velocity: state.velocity,
            mass: state.mass,
            radius: state.radius,
            drag: state.drag,
        }
    }
}

/// A static attractor of the prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointMass {
    pub position: Vec3,
    pub mass: Num,
    /// Collision radius
    pub radius: Num,
}

impl PointMass {
    pub fn new(position: Vec3, mass: Num, radius: Num) -> Self {
        Self {
            position,
            mass,
            radius,
        }
    }
}

/// Output of one prediction run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectorySample {
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
    /// The projectile ran into an attractor
    pub hit: bool,
    /// Length of the polyline
    pub arclength: Num,
}

impl TrajectorySample {
    fn starting_at(state: StateVectors) -> Self {
        Self {
            positions: vec![state.position],
            velocities: vec![state.velocity],
            ..Default::default()
        }
    }

    fn push(&mut self, state: StateVectors) {
        if let Some(last) = self.positions.last() {
            self.arclength += last.distance(state.position);
        }
        self.positions.push(state.position);
        self.velocities.push(state.velocity);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrajectoryPredictor {
    config: PredictorConfig,
    attractors: Vec<PointMass>,
}

impl TrajectoryPredictor {
    pub fn new(config: PredictorConfig, attractors: impl IntoIterator<Item = PointMass>) -> Self {
        Self {
            config,
            attractors: attractors.into_iter().collect(),
        }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn attractors(&self) -> &[PointMass] {
        &self.attractors
    }

    /// Attractors with a positive mass.
    pub fn active_attractors(&self) -> impl Iterator<Item = &PointMass> {
        self.attractors.iter().filter(|a| a.mass > 0.0)
    }

    pub fn acceleration(&self, position: Vec3) -> Vec3 {
        self.active_attractors()
            .map(|a| {
                acceleration_by_attraction(
                    position,
                    a.position,
                    standard_gravitational_parameter(a.mass, self.config.gravitational_constant),
                    self.config.min_range,
                    self.config.max_range,
                )
            })
            .sum()
    }

    /// One fixed step: gravity kick, linear drag, then drift.
    pub fn step(&self, state: StateVectors, drag: Num) -> StateVectors {
        let dt = self.config.dt;

        let mut velocity = state.velocity + self.acceleration(state.position) * dt;
        if drag != 0.0 {
            velocity *= 1.0 - dt * drag;
        }

        StateVectors::new(state.position + velocity * dt, velocity)
    }

    /// True when a sphere of `radius` at `position` touches any attractor.
    pub fn collides(&self, position: Vec3, radius: Num) -> bool {
        self.active_attractors()
            .any(|a| a.position.distance(position) < a.radius + radius)
    }

    /// Starts a resumable run. Without any attractor the run finishes at once
    /// with a straight line along the initial velocity.
    pub fn start(&self, projectile: &Projectile, stop: StopCondition) -> PredictionRun {
        if !self.config.is_valid() || !projectile.state_vectors().is_finite() {
            warn!(dt = self.config.dt, ?projectile, "Invalid prediction input");
            return PredictionRun::finished(
                self.clone(),
                stop,
                TrajectorySample::default(),
                StopReason::InvalidInput,
            );
        }

        if self.active_attractors().next().is_none() {
            let length = match stop {
                StopCondition::CollisionOrLength { length, .. } => length.min(self.config.max_distance),
                _ => self.config.max_distance,
            };
            let sample = self.straight_line(projectile, length);

            return PredictionRun::finished(self.clone(), stop, sample, StopReason::Rectilinear);
        }

        PredictionRun::new(self.clone(), projectile, stop)
    }

    /// Two-point line of `length` along the projectile's velocity. Empty when
    /// the projectile is at rest.
    pub fn straight_line(&self, projectile: &Projectile, length: Num) -> TrajectorySample {
        if projectile.velocity.length_squared() < 1e-4 {
            return TrajectorySample::default();
        }

        let direction = normalize_or_zero(projectile.velocity);
        let mut sample = TrajectorySample::starting_at(projectile.state_vectors());
        sample.push(StateVectors::new(
            projectile.position + direction * length,
            projectile.velocity,
        ));
        sample
    }

    /// Launches the projectile with `impulse` and records exactly `step_count`
    /// steps.
    pub fn simulate_fixed_steps(
        &self,
        projectile: &Projectile,
        impulse: Vec3,
        step_count: usize,
    ) -> TrajectorySample {
        let projectile = projectile.launched(impulse, self.config.dt);

        self.start(&projectile, StopCondition::Steps(step_count))
            .finish()
    }

    /// Records steps until the path comes back to its start point.
    pub fn simulate_until_closed(&self, projectile: &Projectile, max_steps: usize) -> TrajectorySample {
        self.start(projectile, StopCondition::Closed { max_steps })
            .finish()
    }

    /// Records steps until the projectile hits an attractor or has travelled
    /// `length`.
    pub fn simulate_until_collision_or_length(
        &self,
        projectile: &Projectile,
        length: Num,
        max_steps: usize,
    ) -> TrajectorySample {
        self.start(projectile, StopCondition::CollisionOrLength { length, max_steps })
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{vec3, DEFAULT_G};

    fn sun() -> PointMass {
        PointMass::new(Vec3::ZERO, 5000.0, 1.0)
    }

    #[test]
    fn launch_spreads_impulse_over_one_tick() {
        let ball = Projectile::new(Vec3::ZERO, Vec3::ZERO, 2.0).launched(vec3(100.0, 0.0, 0.0), 0.02);

        assert!((ball.velocity.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn massless_projectile_ignores_impulse() {
        let ball = Projectile::new(Vec3::ZERO, Vec3::X, 0.0).launched(vec3(100.0, 0.0, 0.0), 0.02);

        assert_eq!(ball.velocity, Vec3::X);
    }

    #[test]
    fn fixed_steps_records_every_position() {
        let predictor = TrajectoryPredictor::new(PredictorConfig::default(), [sun()]);
        let ball = Projectile::new(vec3(10.0, 0.0, 0.0), Vec3::ZERO, 1.0);

        let sample = predictor.simulate_fixed_steps(&ball, vec3(0.0, 10.0, 0.0), 40);

        assert_eq!(sample.len(), 41);
        assert_eq!(sample.velocities.len(), 41);
        assert_eq!(sample.positions[0], vec3(10.0, 0.0, 0.0));
        assert!(!sample.hit);
        // Pulled towards the sun
        assert!(sample.positions[40].x < 10.0);
    }

    #[test]
    fn drag_slows_the_projectile() {
        let far = PointMass::new(vec3(1e6, 0.0, 0.0), 1.0, 1.0);
        let predictor = TrajectoryPredictor::new(PredictorConfig::default(), [far]);
        let ball = Projectile::new(Vec3::ZERO, vec3(0.0, 1.0, 0.0), 1.0).with_drag(0.5);

        let sample = predictor.simulate_fixed_steps(&ball, Vec3::ZERO, 1);

        assert!((sample.velocities[1].y - 0.99).abs() < 1e-9);
    }

    #[test]
    fn circular_orbit_closes() {
        let predictor = TrajectoryPredictor::new(PredictorConfig::default(), [sun()]);
        let speed = (DEFAULT_G * 5000.0 / 10.0).sqrt();
        let ball = Projectile::new(vec3(10.0, 0.0, 0.0), vec3(0.0, speed, 0.0), 1.0);

        let mut run = predictor.start(&ball, StopCondition::Closed { max_steps: 20_000 });
        while run.tick(1000) == RunStatus::Running {}

        assert_eq!(run.stop_reason(), Some(StopReason::Closed));
        let sample = run.sample();
        let first = sample.positions[0];
        let last = sample.positions[sample.len() - 1];
        assert!(first.distance(last) < 0.01);
        // About one period of 281 time units at dt = 0.02
        assert!((14_000..14_100).contains(&sample.len()));
    }

    #[test]
    fn collision_cuts_the_path_short() {
        let planet = PointMass::new(vec3(5.0, 0.0, 0.0), 5000.0, 1.0);
        let predictor = TrajectoryPredictor::new(PredictorConfig::default(), [planet]);
        let empty = TrajectoryPredictor::new(PredictorConfig::default(), []);
        let ball = Projectile::new(Vec3::ZERO, vec3(2.0, 0.0, 0.0), 1.0)
            .with_radius(0.1)
            .with_drag(0.1);

        let blocked = predictor.simulate_until_collision_or_length(&ball, 20.0, 10_000);
        let free = empty.simulate_until_collision_or_length(&ball, 20.0, 10_000);

        assert!(blocked.hit);
        assert!(!free.hit);
        assert!((free.arclength - 20.0).abs() < 1e-9);
        assert!(blocked.arclength < free.arclength);
        let last = blocked.positions[blocked.len() - 1];
        assert!(last.distance(planet.position) < 1.1);
    }

    #[test]
    fn no_collision_during_warmup() {
        let predictor = TrajectoryPredictor::new(PredictorConfig::default(), [sun()]);
        let ball = Projectile::new(vec3(0.5, 0.0, 0.0), vec3(20.0, 0.0, 0.0), 1.0);

        let sample = predictor.simulate_until_collision_or_length(&ball, 1000.0, 50);

        assert!(!sample.hit);
        assert_eq!(sample.len(), 51);
    }

    #[test]
    fn length_target_stops_run() {
        let far = PointMass::new(vec3(1e6, 0.0, 0.0), 1.0, 1.0);
        let predictor = TrajectoryPredictor::new(PredictorConfig::default(), [far]);
        let ball = Projectile::new(Vec3::ZERO, vec3(1.0, 0.0, 0.0), 1.0);

        let mut run = predictor.start(&ball, StopCondition::CollisionOrLength { length: 1.0, max_steps: 1000 });

        assert_eq!(run.tick(1000), RunStatus::Finished(StopReason::LengthReached));
        assert!(run.sample().arclength >= 1.0);
        assert!(run.sample().arclength < 1.0 + 0.03);
    }

    #[test_case(StopCondition::Steps(10) ; "fixed")]
    #[test_case(StopCondition::Closed { max_steps: 10 } ; "closed")]
    fn no_attractors_gives_straight_line(stop: StopCondition) {
        let predictor = TrajectoryPredictor::new(PredictorConfig::default(), [PointMass::new(Vec3::ZERO, 0.0, 1.0)]);
        let ball = Projectile::new(vec3(1.0, 0.0, 0.0), vec3(0.0, 3.0, 0.0), 1.0);

        let mut run = predictor.start(&ball, stop);

        assert_eq!(run.tick(1), RunStatus::Finished(StopReason::Rectilinear));
        assert_eq!(
            run.sample().positions,
            vec![vec3(1.0, 0.0, 0.0), vec3(1.0, 1000.0, 0.0)]
        );
    }

    #[test]
    fn resting_projectile_without_attractors_has_no_path() {
        let predictor = TrajectoryPredictor::new(PredictorConfig::default(), []);
        let ball = Projectile::new(Vec3::ZERO, Vec3::ZERO, 1.0);

        assert!(predictor.simulate_until_closed(&ball, 100).is_empty());
    }

    #[test]
    fn invalid_timestep_gives_empty_path() {
        let config = PredictorConfig {
            dt: -0.02,
            ..Default::default()
        };
        let predictor = TrajectoryPredictor::new(config, [sun()]);
        let ball = Projectile::new(vec3(10.0, 0.0, 0.0), Vec3::Y, 1.0);

        let mut run = predictor.start(&ball, StopCondition::Steps(5));

        assert_eq!(run.tick(10), RunStatus::Finished(StopReason::InvalidInput));
        assert!(run.sample().is_empty());
    }
}
