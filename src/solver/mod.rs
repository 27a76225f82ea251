//! Per-tick solver phases
//!
//! Run in this order by [`crate::FluidState::tick`]:
//!
//! * [`integrator`] - damping, gravity, repulsion, caps, reflection
//! * [`transition`] - scan, aggregate and apply cell crossings
//! * [`diffusion`] - density-gradient force per occupied cell
//! * [`momentum`] - hand stored cell momentum back to residents

pub mod diffusion;
pub mod integrator;
pub mod momentum;
pub mod transition;

pub use diffusion::DiffusionSolver;
pub use integrator::{
    LocalForceParams, StepConstants, apply_speed_cap, calc_local_force, integrate, local_forces,
    reflect_boundary,
};
pub use momentum::distribute_momentum;
pub use transition::{CellDelta, DeltaMap, Transition};
