//! Orbital mechanics core: Keplerian orbit elements, Kepler equation solvers,
//! an n-body integrator and a drag-and-launch trajectory predictor.

pub mod astro;
pub mod body;
pub mod config;
pub mod constants;
pub mod elements;
pub mod error;
pub mod math;
pub mod predictor;
pub mod simulation;
pub mod state_vectors;
pub mod utils;

pub type Num = f64;
pub type Vec3 = glam::DVec3;
pub type Quat = glam::DQuat;

pub use glam::dvec3 as vec3;

pub use self::body::{Body, BodyId, BodyState};
pub use self::config::{CalculationType, PredictorConfig, SimulationConfig};
pub use self::constants::*;
pub use self::elements::OrbitElements;
pub use self::error::{KeplerError, SimulationError};
pub use self::predictor::{
    PointMass, PredictionRun, Projectile, RunStatus, StopCondition, StopReason, TrailingWindow,
    TrajectoryPredictor, TrajectorySample, WindowState,
};
pub use self::simulation::Simulation;
pub use self::state_vectors::StateVectors;
