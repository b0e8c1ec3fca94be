use thiserror::Error;

use crate::{BodyId, Num};

/// Caller contract violations of the simulation driver.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SimulationError {
    #[error("timestep must be finite and non-negative, got {0}")]
    InvalidTimestep(Num),
    #[error("body {0:?} does not belong to this simulation")]
    UnknownBody(BodyId),
    #[error("body {0:?} cannot be its own attractor")]
    SelfAttractor(BodyId),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum KeplerError {
    /// The root finder ran out of iterations or produced a non-finite step.
    /// `estimate` is the last finite approximation.
    #[error("kepler solver did not converge after {iterations} iterations (estimate = {estimate})")]
    NotConverged { estimate: Num, iterations: usize },
}

impl KeplerError {
    pub fn estimate(&self) -> Num {
        match self {
            Self::NotConverged { estimate, .. } => *estimate,
        }
    }
}
