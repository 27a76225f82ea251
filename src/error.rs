//! Error types reported by the simulation core.
//!
//! Only configuration problems and bad external queries surface as errors.
//! Broken invariants inside a tick panic instead.

use thiserror::Error;

use crate::core::CellId;
use crate::math::Vector;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("grid would contain no cells")]
    EmptyGrid,
    #[error("invalid decay table: {0}")]
    DecayTable(String),
    #[error("radius {requested} is beyond the neighbor table range (max {max})")]
    RadiusOutOfRange { requested: usize, max: usize },
    #[error("no cell with id {0}")]
    UnknownCell(CellId),
    #[error("lattice particle {index} at {position} lies outside the box")]
    LatticeOutsideBox { index: usize, position: Vector },
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
