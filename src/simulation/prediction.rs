//! Look-ahead of the whole scene, every body moving at once.

use super::Simulation;
use crate::astro::{acceleration_by_attraction, standard_gravitational_parameter};
use crate::{BodyId, Num, SimulationError, Vec3};

/// Working copy of a body during a prediction.
struct Ghost {
    id: BodyId,
    is_fixed: bool,
    mg: Num,
    position: Vec3,
    velocity: Vec3,
    points: Vec<Vec3>,
}

impl Simulation {
    /// Predicts the paths of all active bodies moving together, leaving the
    /// simulation untouched.
    ///
    /// Every active body attracts every other one regardless of its mass,
    /// using [`crate::SimulationConfig::prediction_min_range`] and the global
    /// maximum range. Each step first updates all velocities, then all
    /// positions. Moving bodies get `points_count + 1` points starting at
    /// their current position, fixed bodies a single point.
    pub fn predict_all(
        &self,
        step: Num,
        points_count: usize,
    ) -> Result<Vec<(BodyId, Vec<Vec3>)>, SimulationError> {
        if !step.is_finite() || step < 0.0 {
            return Err(SimulationError::InvalidTimestep(step));
        }

        let g = self.config.gravitational_constant;
        let min_range = self.config.prediction_min_range;
        let max_range = self.config.max_attraction_range;

        let mut ghosts: Vec<Ghost> = self
            .bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| body.active)
            .map(|(i, body)| Ghost {
                id: BodyId(i),
                is_fixed: body.is_fixed,
                mg: standard_gravitational_parameter(body.mass(), g),
                position: body.position(),
                velocity: body.velocity(),
                points: vec![body.position()],
            })
            .collect();

        for _ in 0..points_count {
            for j in 0..ghosts.len() {
                if ghosts[j].is_fixed {
                    continue;
                }

                let position = ghosts[j].position;
                let acceleration: Vec3 = ghosts
                    .iter()
                    .enumerate()
                    .filter(|&(n, _)| n != j)
                    .map(|(_, other)| {
                        acceleration_by_attraction(position, other.position, other.mg, min_range, max_range)
                    })
                    .sum();

                ghosts[j].velocity += acceleration * step;
            }

            for ghost in ghosts.iter_mut().filter(|ghost| !ghost.is_fixed) {
                ghost.position += ghost.velocity * step;
                ghost.points.push(ghost.position);
            }
        }

        Ok(ghosts.into_iter().map(|ghost| (ghost.id, ghost.points)).collect())
    }
}
