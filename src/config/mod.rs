//! Configuration and parameters
//!
//! Default constants and the scalar parameter surface of the simulation.

pub mod constants;
pub mod sim_params;

pub use constants::*;
pub use sim_params::*;
