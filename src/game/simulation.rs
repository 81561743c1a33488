//! Simulation layer: deterministic fixed-tick state shared by critters and
//! the edit command surface.
//!
//! Everything that advances game state runs in `FixedUpdate`, partitioned
//! into [`SimSet`]s that chain in declaration order. The grid mutates only
//! in `Input` (edit commands), critters read the flow field in `Steering`
//! and move in `Integration`, so within one tick no critter ever acts on a
//! field older than its last completed step.

use bevy::prelude::*;

use crate::game::config::{GameConfig, GameConfigHandle, InitialConfig};
use crate::game::fixed_math::{FixedNum, FixedVec2};
use crate::game::GameState;

// ============================================================================
// System sets
// ============================================================================

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    Input,       // Draining edit commands into grid mutations
    Steering,    // Deriving critter headings from the flow field
    Integration, // Applying velocity to position
}

// ============================================================================
// Resources
// ============================================================================

/// Monotonic fixed-update counter. Wave pacing is expressed in ticks so the
/// spawn schedule is independent of wall-clock jitter.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 += 1;
    }
}

/// Simulation parameters converted once from [`InitialConfig`] floats into
/// fixed-point, so the conversion point is singular and the simulation never
/// touches f32 math.
#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    pub tick_rate: f64,
    pub critter_speed: FixedNum,
    /// Ticks between critter spawns within a wave.
    pub spawn_interval_ticks: u64,
    pub wave_size: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20.0,
            critter_speed: FixedNum::from_num(2.5),
            spawn_interval_ticks: 20,
            wave_size: 10,
        }
    }
}

impl SimConfig {
    pub fn from_initial(config: &InitialConfig) -> Self {
        let spawn_interval_ticks =
            ((config.spawn_interval as f64 * config.tick_rate).round() as u64).max(1);
        Self {
            tick_rate: config.tick_rate,
            critter_speed: FixedNum::from_num(config.critter_speed),
            spawn_interval_ticks,
            wave_size: config.wave_size,
        }
    }

    /// Fixed-point duration of one tick.
    pub fn tick_delta(&self) -> FixedNum {
        FixedNum::ONE / FixedNum::from_num(self.tick_rate)
    }
}

// ============================================================================
// Components
// ============================================================================

/// Logical position of an entity in cell space (1.0 = one cell edge).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SimPosition(pub FixedVec2);

/// Logical velocity of an entity in cells per second.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SimVelocity(pub FixedVec2);

// ============================================================================
// Plugin
// ============================================================================

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(20.0)); // Overridden from config below
        app.init_resource::<SimTick>();
        app.init_resource::<SimConfig>();

        app.configure_sets(
            FixedUpdate,
            (SimSet::Input, SimSet::Steering, SimSet::Integration)
                .chain()
                .run_if(in_state(GameState::InGame).or(in_state(GameState::Editor))),
        );

        app.add_systems(Startup, init_sim_config);
        app.add_systems(Update, update_sim_from_config);
        app.add_systems(
            FixedUpdate,
            (
                increment_sim_tick.before(SimSet::Input),
                apply_velocity.in_set(SimSet::Integration),
            ),
        );
    }
}

// ============================================================================
// Systems
// ============================================================================

fn init_sim_config(
    mut sim_config: ResMut<SimConfig>,
    mut fixed_time: ResMut<Time<Fixed>>,
    initial: Res<InitialConfig>,
) {
    *sim_config = SimConfig::from_initial(&initial);
    fixed_time.set_timestep_hz(sim_config.tick_rate);
    info!(
        "Simulation configured: {} Hz, critter speed {} cells/s, wave of {} every {} ticks",
        sim_config.tick_rate,
        sim_config.critter_speed,
        sim_config.wave_size,
        sim_config.spawn_interval_ticks
    );
}

/// Re-apply the fixed timestep when the runtime config asset hot-reloads.
/// Only the wall-clock pacing changes; per-tick deltas stay derived from
/// [`SimConfig::tick_rate`], so determinism is unaffected.
fn update_sim_from_config(
    mut fixed_time: ResMut<Time<Fixed>>,
    config_handle: Option<Res<GameConfigHandle>>,
    game_configs: Res<Assets<GameConfig>>,
    mut events: MessageReader<AssetEvent<GameConfig>>,
) {
    let Some(config_handle) = config_handle else {
        return;
    };
    for event in events.read() {
        if event.is_modified(config_handle.0.id())
            || event.is_loaded_with_dependencies(config_handle.0.id())
        {
            if let Some(config) = game_configs.get(&config_handle.0) {
                fixed_time.set_timestep_hz(config.tick_rate);
                info!("Updated tick rate to {}", config.tick_rate);
            }
        }
    }
}

pub fn increment_sim_tick(mut tick: ResMut<SimTick>) {
    tick.increment();
}

pub fn apply_velocity(
    mut query: Query<(&mut SimPosition, &SimVelocity)>,
    sim_config: Res<SimConfig>,
) {
    let delta = sim_config.tick_delta();
    for (mut pos, vel) in query.iter_mut() {
        if vel.0 != FixedVec2::ZERO {
            pos.0 += vel.0 * delta;
        }
    }
}
