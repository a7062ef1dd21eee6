//! Data layer — populates every registry at game startup.
//!
//! This plugin runs in OnEnter(GameState::Loading), fills the dialogue
//! registry, the NPC registry, and the timer configuration from the
//! hard-coded content defined in submodules, validates every dialogue
//! graph, then transitions the game into GameState::MainMenu.
//!
//! No other domain needs to seed these resources. All domain plugins can
//! safely read them once GameState has advanced past Loading.

mod dialogue;
mod npcs;
mod timers;

use bevy::prelude::*;

use crate::dialogue::DialogueRegistry;
use crate::npcs::NpcRegistry;
use crate::shared::*;
use crate::timers::TimerConfig;

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogueRegistry>()
            .add_systems(OnEnter(GameState::Loading), load_all_data);
    }
}

/// Single system that populates every registry and then transitions to
/// MainMenu. Dialogue graphs are validated here, at load time, so play
/// never sees an out-of-range branch target.
fn load_all_data(
    mut dialogue_registry: ResMut<DialogueRegistry>,
    mut npc_registry: ResMut<NpcRegistry>,
    mut timer_config: ResMut<TimerConfig>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    info!("DataPlugin: populating registries…");

    dialogue::populate_dialogue(&mut dialogue_registry);
    let mut defects = 0;
    for ((npc_id, state), graph) in dialogue_registry.graphs.iter_mut() {
        defects += graph.validate(&format!("{npc_id}/{state:?}"));
    }
    info!(
        "  Dialogue graphs loaded: {} ({} defects clamped)",
        dialogue_registry.graphs.len(),
        defects
    );

    npcs::populate_npcs(&mut npc_registry);
    info!("  NPCs loaded: {}", npc_registry.npcs.len());

    timers::populate_timer_config(&mut timer_config);
    info!("  Timers configured: {}", timer_config.specs.len());

    next_state.set(GameState::MainMenu);
}
