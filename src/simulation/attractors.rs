//! Choosing which body another body orbits.

use tracing::debug;

use super::Simulation;
use crate::astro::{relative_perturbation_ratio, standard_gravitational_parameter};
use crate::{BodyId, Num, SimulationError};

impl Simulation {
    /// Active bodies other than `body` that are heavy enough to attract and
    /// close enough for their attraction range.
    fn candidates(&self, body: usize) -> impl Iterator<Item = usize> + '_ {
        let position = self.bodies[body].position();

        self.bodies
            .iter()
            .enumerate()
            .filter(move |&(i, other)| {
                i != body
                    && other.active
                    && other.mass() > self.config.min_attractor_mass
                    && other.position().distance(position)
                        <= self.config.max_attraction_range.min(other.max_attraction_range)
            })
            .map(|(i, _)| i)
    }

    fn distance_squared(&self, a: usize, b: usize) -> Num {
        self.bodies[a].position().distance_squared(self.bodies[b].position())
    }

    pub fn find_nearest_attractor(&self, id: BodyId) -> Result<Option<BodyId>, SimulationError> {
        let body = self.index(id)?;

        Ok(self
            .candidates(body)
            .min_by(|&a, &b| {
                self.distance_squared(body, a)
                    .total_cmp(&self.distance_squared(body, b))
            })
            .map(BodyId))
    }

    /// Candidate whose pull on the body is least perturbed by every other
    /// candidate. More precise than the nearest one near sphere of influence
    /// boundaries, but quadratic in the number of candidates.
    pub fn find_most_proper_attractor(&self, id: BodyId) -> Result<Option<BodyId>, SimulationError> {
        let body = self.index(id)?;
        let target = self.bodies[body].position();
        let g = self.config.gravitational_constant;

        let ratio = |main: usize, perturbing: usize| {
            let (main, perturbing) = (&self.bodies[main], &self.bodies[perturbing]);
            relative_perturbation_ratio(
                target,
                main.position(),
                standard_gravitational_parameter(main.mass(), g),
                perturbing.position(),
                standard_gravitational_parameter(perturbing.mass(), g),
            )
        };

        let best = self.candidates(body).reduce(|current, other| {
            if ratio(current, other) > ratio(other, current) {
                other
            } else {
                current
            }
        });

        Ok(best.map(BodyId))
    }

    pub fn find_biggest_attractor(&self, id: BodyId) -> Result<Option<BodyId>, SimulationError> {
        let body = self.index(id)?;

        Ok(self
            .candidates(body)
            .max_by(|&a, &b| self.bodies[a].mass().total_cmp(&self.bodies[b].mass()))
            .map(BodyId))
    }

    /// Assigns the attractor right away.
    ///
    /// Returns false, changing nothing, when the attractor is already set or
    /// is not heavier than the body.
    pub fn set_attractor(&mut self, id: BodyId, attractor: Option<BodyId>) -> Result<bool, SimulationError> {
        if !self.accepts_attractor(id, attractor)? {
            return Ok(false);
        }

        let body = &mut self.bodies[id.0];
        body.attractor = attractor;
        body.orbit.mark_dirty();
        debug!(body = id.0, ?attractor, "Attractor changed");

        Ok(true)
    }

    /// Queues an attractor change, resolved at the end of the next tick.
    ///
    /// When several requests pile up within one tick the nearest candidate
    /// wins. A lone request made with `check_in_range` is dropped if the
    /// candidate is out of range by then.
    pub fn request_attractor(
        &mut self,
        id: BodyId,
        attractor: Option<BodyId>,
        check_in_range: bool,
    ) -> Result<bool, SimulationError> {
        if !self.accepts_attractor(id, attractor)? {
            return Ok(false);
        }

        let body = &mut self.bodies[id.0];
        if body.pending_attractors.is_empty() {
            body.pending_check_in_range = check_in_range;
        }
        body.pending_attractors.push_back(attractor);

        Ok(true)
    }

    pub fn set_nearest_attractor(&mut self, id: BodyId) -> Result<bool, SimulationError> {
        let attractor = self.find_nearest_attractor(id)?;
        self.set_attractor(id, attractor)
    }

    pub fn set_most_proper_attractor(&mut self, id: BodyId) -> Result<bool, SimulationError> {
        let attractor = self.find_most_proper_attractor(id)?;
        self.set_attractor(id, attractor)
    }

    pub fn set_biggest_attractor(&mut self, id: BodyId) -> Result<bool, SimulationError> {
        let attractor = self.find_biggest_attractor(id)?;
        self.set_attractor(id, attractor)
    }

    fn accepts_attractor(&self, id: BodyId, attractor: Option<BodyId>) -> Result<bool, SimulationError> {
        let body = self.index(id)?;
        if self.bodies[body].attractor == attractor {
            return Ok(false);
        }

        let Some(attractor) = attractor else {
            return Ok(true);
        };

        let candidate = self.index(attractor)?;
        if candidate == body {
            return Err(SimulationError::SelfAttractor(id));
        }

        Ok(self.bodies[candidate].mass() > self.bodies[body].mass())
    }

    pub(super) fn resolve_attractor_requests(&mut self) {
        for i in 0..self.bodies.len() {
            if self.bodies[i].pending_attractors.is_empty() {
                continue;
            }

            let requests: Vec<Option<BodyId>> = self.bodies[i].pending_attractors.drain(..).collect();

            let chosen = match requests.as_slice() {
                [single] => {
                    if self.bodies[i].pending_check_in_range && !self.in_range(i, *single) {
                        debug!(body = i, attractor = ?single, "Requested attractor out of range");
                        continue;
                    }
                    *single
                }
                _ => requests
                    .iter()
                    .copied()
                    .min_by(|a, b| self.request_distance(i, *a).total_cmp(&self.request_distance(i, *b)))
                    .flatten(),
            };

            let body = &mut self.bodies[i];
            body.attractor = chosen;
            body.orbit.mark_dirty();
            debug!(body = i, attractor = ?chosen, "Attractor changed");
        }
    }

    /// Advances the search timers and re-picks the most proper attractor for
    /// every body whose interval has elapsed.
    pub(super) fn run_attractor_searches(&mut self, dt: Num) -> Result<(), SimulationError> {
        for i in 0..self.bodies.len() {
            let body = &mut self.bodies[i];
            let Some(interval) = body.attractor_search_interval else {
                continue;
            };
            if !body.active {
                continue;
            }

            body.attractor_search_timer += dt;
            if body.attractor_search_timer < interval {
                continue;
            }

            body.attractor_search_timer = 0.0;
            self.set_most_proper_attractor(BodyId(i))?;
        }

        Ok(())
    }

    fn request_distance(&self, body: usize, attractor: Option<BodyId>) -> Num {
        attractor.map_or(Num::INFINITY, |a| self.distance_squared(body, a.0))
    }

    fn in_range(&self, body: usize, attractor: Option<BodyId>) -> bool {
        let Some(attractor) = attractor else {
            return true;
        };

        let range = self
            .config
            .max_attraction_range
            .min(self.bodies[attractor.0].max_attraction_range);

        self.distance_squared(body, attractor.0).sqrt() < range
    }
}
