use tracing::debug;

use super::{Projectile, TrajectoryPredictor, TrajectorySample};
use crate::{Num, StateVectors, Vec3};

/// When a prediction run stops.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopCondition {
    /// Exactly this many steps
    Steps(usize),
    /// Until the path returns to its start point
    Closed { max_steps: usize },
    /// Until the projectile hits an attractor or has travelled `length`
    CollisionOrLength { length: Num, max_steps: usize },
}

impl StopCondition {
    pub fn max_steps(&self) -> usize {
        match *self {
            Self::Steps(steps) => steps,
            Self::Closed { max_steps } | Self::CollisionOrLength { max_steps, .. } => max_steps,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    StepLimit,
    Closed,
    Collision,
    LengthReached,
    /// No attractors, the path is a straight line
    Rectilinear,
    /// Non-positive timestep or non-finite start state
    InvalidInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Running,
    Finished(StopReason),
}

/// A prediction that can be advanced a bounded number of steps at a time,
/// spreading long look-aheads over several frames.
#[derive(Debug, Clone)]
pub struct PredictionRun {
    predictor: TrajectoryPredictor,
    stop: StopCondition,
    start: Vec3,
    state: StateVectors,
    radius: Num,
    drag: Num,
    step_index: usize,
    sample: TrajectorySample,
    finished: Option<StopReason>,
}

impl PredictionRun {
    pub(super) fn new(predictor: TrajectoryPredictor, projectile: &Projectile, stop: StopCondition) -> Self {
        let state = projectile.state_vectors();

        Self {
            predictor,
            stop,
            start: state.position,
            state,
            radius: projectile.radius,
            drag: projectile.drag,
            step_index: 0,
            sample: TrajectorySample::starting_at(state),
            finished: None,
        }
    }

    pub(super) fn finished(
        predictor: TrajectoryPredictor,
        stop: StopCondition,
        sample: TrajectorySample,
        reason: StopReason,
    ) -> Self {
        let state = StateVectors::default();

        Self {
            predictor,
            stop,
            start: state.position,
            state,
            radius: 0.0,
            drag: 0.0,
            step_index: 0,
            sample,
            finished: Some(reason),
        }
    }

    pub fn stop_condition(&self) -> StopCondition {
        self.stop
    }

    /// Steps taken so far.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn sample(&self) -> &TrajectorySample {
        &self.sample
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.finished
    }

    pub fn status(&self) -> RunStatus {
        match self.finished {
            Some(reason) => RunStatus::Finished(reason),
            None => RunStatus::Running,
        }
    }

    /// Takes at most `max_steps` more steps.
    pub fn tick(&mut self, max_steps: usize) -> RunStatus {
        for _ in 0..max_steps {
            if self.finished.is_some() {
                break;
            }

            if let Some(reason) = self.advance() {
                self.finish_with(reason);
            }
        }

        self.status()
    }

    /// Runs to completion and returns the sample.
    pub fn finish(mut self) -> TrajectorySample {
        while self.tick(usize::MAX) == RunStatus::Running {}
        self.sample
    }

    pub fn into_sample(self) -> TrajectorySample {
        self.sample
    }

    fn advance(&mut self) -> Option<StopReason> {
        let max_steps = self.stop.max_steps();
        if self.step_index >= max_steps {
            return Some(StopReason::StepLimit);
        }

        self.state = self.predictor.step(self.state, self.drag);
        self.step_index += 1;
        self.sample.push(self.state);

        let config = self.predictor.config();
        let position = self.state.position;

        let reason = match self.stop {
            StopCondition::Steps(_) => None,
            StopCondition::Closed { .. } => (self.step_index > config.closure_min_steps
                && position.distance(self.start) < config.closure_tolerance)
                .then_some(StopReason::Closed),
            StopCondition::CollisionOrLength { length, .. } => {
                if self.step_index > config.collision_warmup_steps
                    && self.predictor.collides(position, self.radius)
                {
                    self.sample.hit = true;
                    Some(StopReason::Collision)
                } else if self.sample.arclength >= length {
                    Some(StopReason::LengthReached)
                } else {
                    None
                }
            }
        };

        reason.or_else(|| (self.step_index >= max_steps).then_some(StopReason::StepLimit))
    }

    fn finish_with(&mut self, reason: StopReason) {
        self.finished = Some(reason);
        debug!(
            ?reason,
            steps = self.step_index,
            hit = self.sample.hit,
            arclength = self.sample.arclength,
            "Prediction finished"
        );
    }
}
