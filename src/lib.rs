use std::time::Duration;

use bevy::log::{error, info};
use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod error;
pub mod math;
pub mod simulation;
pub mod solver;

// Public re-exports for clean API
pub use crate::config::{SimParams, TickFlags};
pub use crate::core::{CellId, CellView, Particle, ParticleId, TickStats};
pub use crate::error::SimError;
pub use crate::simulation::FluidState;

/// Stats of the most recent fixed step.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct LastTickStats(pub TickStats);

/// Drives a [`FluidState`] resource from the fixed-timestep schedule.
///
/// The state is built at startup from the [`SimParams`] resource, so params
/// can still be replaced after the plugin is added.
pub struct FluidGridPlugin {
    pub params: SimParams,
    pub timestep: Duration,
}

impl Default for FluidGridPlugin {
    fn default() -> Self {
        Self {
            params: SimParams::default(),
            timestep: Duration::from_secs_f32(config::REFERENCE_DT),
        }
    }
}

impl Plugin for FluidGridPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.params.clone())
            .insert_resource(Time::<Fixed>::from_duration(self.timestep))
            .init_resource::<TickFlags>()
            .init_resource::<LastTickStats>()
            .add_systems(Startup, init_fluid_state)
            .add_systems(FixedUpdate, (step_fluid, log_tick_stats).chain());
    }
}

fn init_fluid_state(mut commands: Commands, params: Res<SimParams>) {
    match FluidState::initialize(params.clone()) {
        Ok(state) => commands.insert_resource(state),
        Err(err) => error!("fluid state not created: {err}"),
    }
}

fn step_fluid(
    time: Res<Time>,
    flags: Res<TickFlags>,
    state: Option<ResMut<FluidState>>,
    mut last: ResMut<LastTickStats>,
) {
    let Some(mut state) = state else {
        return;
    };
    last.0 = state.tick(time.delta_secs(), *flags);
}

fn log_tick_stats(state: Option<Res<FluidState>>) {
    let Some(state) = state else {
        return;
    };
    if state.tick_count() % 60 != 0 {
        return;
    }
    let totals = state.stats();
    info!(
        "tick {}: {} occupied cells, density {:.1}, {} transitions / {} soft caps / {} hard caps so far",
        state.tick_count(),
        state.occupied_cell_count(),
        state.total_density(),
        totals.transitions,
        totals.soft_caps,
        totals.hard_caps
    );
}
