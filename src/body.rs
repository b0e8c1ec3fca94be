use std::collections::VecDeque;

use crate::{Num, OrbitElements, StateVectors, Vec3};

/// Handle to a body owned by a [`crate::Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyId(pub usize);

/// Initial conditions supplied by the game layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: Num,
    pub radius: Num,
    /// Linear drag coefficient, used by the predictor
    pub drag: Num,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            mass: 1.0,
            radius: 0.0,
            drag: 0.0,
        }
    }
}

impl BodyState {
    pub fn new(position: Vec3, velocity: Vec3, mass: Num) -> Self {
        Self {
            position,
            velocity,
            mass,
            ..Default::default()
        }
    }
}

/// A body simulated by [`crate::Simulation`].
///
/// Position, velocity and mass go through setters so that the cached orbit
/// is invalidated whenever they change.
#[derive(Debug, Clone)]
pub struct Body {
    position: Vec3,
    velocity: Vec3,
    mass: Num,
    pub radius: Num,
    pub drag: Num,

    /// Fixed bodies still attract others but never move
    pub is_fixed: bool,
    /// Inactive bodies neither move nor attract
    pub active: bool,
    pub max_attraction_range: Num,
    /// Move along the analytic orbit around the attractor instead of
    /// integrating forces
    pub use_kepler_motion: bool,
    /// Re-pick the most proper attractor every this many simulated seconds
    pub attractor_search_interval: Option<Num>,

    pub(crate) kepler_motion: bool,
    pub(crate) attractor_search_timer: Num,
    pub(crate) attractor: Option<BodyId>,
    pub(crate) orbit: OrbitElements,
    pub(crate) additional_velocity: Vec3,
    pub(crate) pending_attractors: VecDeque<Option<BodyId>>,
    pub(crate) pending_check_in_range: bool,
}

impl Body {
    pub fn new(state: BodyState) -> Self {
        Self {
            position: state.position,
            velocity: state.velocity,
            mass: state.mass,
            radius: state.radius,
            drag: state.drag,
            is_fixed: false,
            active: true,
            max_attraction_range: Num::INFINITY,
            use_kepler_motion: false,
            attractor_search_interval: None,
            kepler_motion: true,
            attractor_search_timer: 0.0,
            attractor: None,
            orbit: OrbitElements::default(),
            additional_velocity: Vec3::ZERO,
            pending_attractors: VecDeque::new(),
            pending_check_in_range: false,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.is_fixed = true;
        self
    }

    pub fn with_kepler_motion(mut self) -> Self {
        self.use_kepler_motion = true;
        self
    }

    pub fn with_attractor_search(mut self, interval: Num) -> Self {
        self.attractor_search_interval = Some(interval);
        self
    }

    pub fn with_max_attraction_range(mut self, range: Num) -> Self {
        self.max_attraction_range = range;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn mass(&self) -> Num {
        self.mass
    }

    pub fn state_vectors(&self) -> StateVectors {
        StateVectors::new(self.position, self.velocity)
    }

    pub fn attractor(&self) -> Option<BodyId> {
        self.attractor
    }

    /// Cached orbit around the attractor. Stale while
    /// [`OrbitElements::is_dirty`] holds; see
    /// [`crate::Simulation::orbit_elements`] for a fresh one.
    pub fn orbit(&self) -> &OrbitElements {
        &self.orbit
    }

    /// True while the body follows its analytic orbit.
    pub fn is_kepler_motion(&self) -> bool {
        self.use_kepler_motion && self.kepler_motion
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.orbit.mark_dirty();
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
        self.orbit.mark_dirty();
    }

    pub fn set_mass(&mut self, mass: Num) {
        self.mass = mass;
        self.orbit.mark_dirty();
    }

    /// Queues a velocity change, applied once on the next tick. Interrupts
    /// Kepler motion for that tick.
    pub fn add_external_velocity(&mut self, delta_velocity: Vec3) {
        self.additional_velocity += delta_velocity;
        self.kepler_motion = false;
        self.orbit.mark_dirty();
    }

    /// Queues an impulse of `force / mass`.
    pub fn add_external_force(&mut self, force: Vec3) {
        self.add_external_velocity(force / self.mass);
    }

    /// Drops the position and velocity components along `normal`.
    pub fn project_onto_plane(&mut self, normal: Vec3) {
        self.position = crate::utils::project_onto_plane(self.position, normal);
        self.velocity = crate::utils::project_onto_plane(self.velocity, normal);
        self.orbit.mark_dirty();
    }

    pub(crate) fn set_state(&mut self, state: StateVectors) {
        self.position = state.position;
        self.velocity = state.velocity;
    }

    pub(crate) fn take_additional_velocity(&mut self) -> Vec3 {
        std::mem::take(&mut self.additional_velocity)
    }
}

impl From<BodyState> for Body {
    fn from(state: BodyState) -> Self {
        Self::new(state)
    }
}
