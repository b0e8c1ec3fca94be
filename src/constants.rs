use crate::Num;

pub use std::f64::consts::PI;

pub const TWO_PI: Num = 2.0 * PI;

/// Gravitational constant tuned for gameplay scales.
/// The real value (6.67430e-11) is not very useful for the game.
pub const DEFAULT_G: Num = 0.0001;

/// Threshold under which a quantity counts as zero when validating an orbit.
pub const EPSILON: Num = 1e-27;

/// Vectors shorter than this normalize to zero.
pub const NORMALIZE_EPSILON: Num = 1e-5;

/// Convergence tolerance of the hyperbolic Kepler solver.
pub const HYPERBOLIC_TOLERANCE: Num = 1e-5;

/// Iteration cap of the hyperbolic Kepler solver.
pub const HYPERBOLIC_MAX_ITERATIONS: usize = 100;

/// Lower bound for `|1 - e²|` so the parabolic boundary stays finite.
pub const MIN_COMPRESSION_RATIO: Num = 1e-12;
