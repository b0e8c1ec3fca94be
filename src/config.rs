use crate::{Num, Vec3, DEFAULT_G};

/// Integration scheme applied to every Newtonian body on each tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalculationType {
    /// Semi-implicit Euler: kick, then drift
    Euler,
    /// Drift half a step, kick, drift the other half
    #[default]
    Verlet,
    /// Four-stage velocity kick between two half drifts
    RungeKutta4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    pub gravitational_constant: Num,
    /// Below this separation attraction is ignored
    pub min_attraction_range: Num,
    /// Above this separation attraction is ignored. Zero disables the limit.
    pub max_attraction_range: Num,
    /// Only bodies heavier than this attract others
    pub min_attractor_mass: Num,
    /// Multiplier applied to frame time by [`crate::Simulation::update`]
    pub time_scale: Num,
    pub calculation_type: CalculationType,
    pub ecliptic_normal: Vec3,
    pub ecliptic_up: Vec3,
    pub keep_bodies_on_ecliptic: bool,
    /// Minimum separation used by [`crate::Simulation::predict_all`]
    pub prediction_min_range: Num,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: DEFAULT_G,
            min_attraction_range: 0.1,
            max_attraction_range: Num::INFINITY,
            min_attractor_mass: 100.0,
            time_scale: 1.0,
            calculation_type: CalculationType::default(),
            ecliptic_normal: Vec3::NEG_Z,
            ecliptic_up: Vec3::Y,
            keep_bodies_on_ecliptic: false,
            prediction_min_range: 0.5,
        }
    }
}

/// Parameters of the trajectory predictor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PredictorConfig {
    /// Fixed physics timestep of one prediction step
    pub dt: Num,
    pub gravitational_constant: Num,
    pub min_range: Num,
    /// Zero disables the limit
    pub max_range: Num,
    /// Distance to the start point that counts as a closed orbit
    pub closure_tolerance: Num,
    /// Closure is only tested after this many steps
    pub closure_min_steps: usize,
    /// Collisions are only tested after this many steps
    pub collision_warmup_steps: usize,
    /// Length of the straight line drawn when nothing attracts the projectile
    pub max_distance: Num,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,
            gravitational_constant: DEFAULT_G,
            min_range: 0.1,
            max_range: 0.0,
            closure_tolerance: 0.01,
            closure_min_steps: 15,
            collision_warmup_steps: 10,
            max_distance: 1000.0,
        }
    }
}

impl PredictorConfig {
    pub fn is_valid(&self) -> bool {
        self.dt.is_finite() && self.dt > 0.0
    }
}
