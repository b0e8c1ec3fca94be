use crate::{Num, OrbitElements, Vec3};

/// Position and velocity of a body, usually relative to its attractor.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateVectors {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl StateVectors {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self { position, velocity }
    }

    pub fn abs_diff(&self, other: &Self) -> Num {
        self.position.distance(other.position) + self.velocity.distance(other.velocity)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    /// Relative state of `self` with respect to `origin`.
    pub fn relative_to(&self, origin: &Self) -> Self {
        Self {
            position: self.position - origin.position,
            velocity: self.velocity - origin.velocity,
        }
    }

    /// Orbit around an attractor of `attractor_mass`, with `self` expressed
    /// relative to that attractor.
    pub fn to_elements(&self, attractor_mass: Num, g: Num) -> OrbitElements {
        OrbitElements::from_state_vectors(self, attractor_mass, g)
    }
}
