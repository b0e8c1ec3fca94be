use std::collections::VecDeque;

use tracing::{debug, warn};

use super::{Projectile, TrajectoryPredictor};
use crate::{Num, StateVectors, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowState {
    /// Growing towards capacity, a bounded number of steps per [`TrailingWindow::fill`]
    Filling,
    /// Full, one point in and one point out per tick
    Rolling,
    /// The path hit an attractor, points only drain out
    Draining,
    Exhausted,
}

/// Fixed-length look-ahead that follows a live projectile.
///
/// The front of the window is the projectile's current tick, the back is
/// the furthest predicted position. Each physics tick drops the front and
/// predicts one more step at the back.
#[derive(Debug, Clone)]
pub struct TrailingWindow {
    predictor: TrajectoryPredictor,
    capacity: usize,
    points: VecDeque<Vec3>,
    tail: StateVectors,
    radius: Num,
    drag: Num,
    steps: usize,
    hit: bool,
    state: WindowState,
}

impl TrailingWindow {
    pub fn new(predictor: TrajectoryPredictor, projectile: &Projectile, capacity: usize) -> Self {
        let tail = projectile.state_vectors();
        let mut window = Self {
            predictor,
            capacity,
            points: VecDeque::with_capacity(capacity),
            tail,
            radius: projectile.radius,
            drag: projectile.drag,
            steps: 0,
            hit: false,
            state: WindowState::Exhausted,
        };

        if capacity < 2 || !window.predictor.config().is_valid() || !tail.is_finite() {
            warn!(capacity, dt = window.predictor.config().dt, "Invalid trailing window");
            return window;
        }

        window.points.push_back(tail.position);
        window.state = WindowState::Filling;
        window
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == WindowState::Exhausted
    }

    /// The predicted path ran into an attractor.
    pub fn hit(&self) -> bool {
        self.hit
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &VecDeque<Vec3> {
        &self.points
    }

    pub fn to_vec(&self) -> Vec<Vec3> {
        self.points.iter().copied().collect()
    }

    /// Predicts at most `max_steps` more points while filling.
    pub fn fill(&mut self, max_steps: usize) -> WindowState {
        for _ in 0..max_steps {
            if self.state != WindowState::Filling || self.points.len() >= self.capacity {
                break;
            }
            self.extend();
        }

        self.mark_full();
        self.state
    }

    /// Follows the projectile by one physics tick.
    pub fn advance(&mut self) -> WindowState {
        match self.state {
            WindowState::Filling | WindowState::Rolling => {
                self.points.pop_front();
                self.extend();
                self.mark_full();
            }
            WindowState::Draining => {
                self.points.pop_front();
                if self.points.is_empty() {
                    self.state = WindowState::Exhausted;
                }
            }
            WindowState::Exhausted => {}
        }

        self.state
    }

    fn mark_full(&mut self) {
        if self.state == WindowState::Filling && self.points.len() >= self.capacity {
            self.state = WindowState::Rolling;
        }
    }

    fn extend(&mut self) {
        self.tail = self.predictor.step(self.tail, self.drag);
        self.steps += 1;
        self.points.push_back(self.tail.position);

        if self.steps > self.predictor.config().collision_warmup_steps
            && self.predictor.collides(self.tail.position, self.radius)
        {
            self.hit = true;
            self.state = WindowState::Draining;
            debug!(steps = self.steps, "Trailing window hit an attractor");
        }
    }
}
