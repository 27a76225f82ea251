//! Fluid particles
//!
//! A particle is a point with a velocity and a back-pointer to the grid cell
//! that owns it in the membership index.

use crate::core::grid::CellId;
use crate::math::{Vector, vector_is_finite, zero_vector};

/// Dense particle index into the particle set.
pub type ParticleId = usize;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vector,
    pub velocity: Vector,
    /// Containing cell. Unset until the first transition pass places it, and
    /// possibly stale between integration and that pass.
    pub cell: Option<CellId>,
}

impl Particle {
    pub fn zeroed() -> Self {
        Self {
            position: zero_vector(),
            velocity: zero_vector(),
            cell: None,
        }
    }

    pub fn new(position: Vector) -> Self {
        Self {
            position,
            ..Self::zeroed()
        }
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    #[inline(always)]
    pub fn is_finite(&self) -> bool {
        vector_is_finite(self.position) && vector_is_finite(self.velocity)
    }
}
