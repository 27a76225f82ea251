use std::time::Duration;

use bevy::log::{LogPlugin, error, info};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use cellfluid2d::config::REFERENCE_DT;
use cellfluid2d::{FluidGridPlugin, FluidState, LastTickStats, SimParams, TickFlags};

const FRAMES: u32 = 600;

fn main() {
    let step = Duration::from_secs_f32(REFERENCE_DT);

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(FluidGridPlugin {
            params: SimParams::default(),
            timestep: step,
        })
        .insert_resource(TimeUpdateStrategy::ManualDuration(step))
        .add_systems(Update, drive_gravity);
    app.finish();
    app.cleanup();

    for _ in 0..FRAMES {
        app.update();
    }

    let world = app.world();
    let Some(state) = world.get_resource::<FluidState>() else {
        return;
    };
    let last = world.resource::<LastTickStats>();
    info!(
        "finished {} ticks: {} particles in {} cells, max speed {:.2}, last tick {} transitions",
        state.tick_count(),
        state.particle_count(),
        state.occupied_cell_count(),
        state.max_particle_speed(),
        last.0.transitions
    );
    if let Err(err) = state.check_invariants() {
        error!("state inconsistent after run: {err}");
    }
}

/// Gravity for the first half of the run, sideways gravity for the rest.
fn drive_gravity(mut flags: ResMut<TickFlags>, state: Option<Res<FluidState>>) {
    let Some(state) = state else {
        return;
    };
    let sideways = state.tick_count() >= u64::from(FRAMES / 2);
    flags.gravity = !sideways;
    flags.x_gravity = sideways;
}
