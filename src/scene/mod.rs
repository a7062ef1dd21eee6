//! Scene-loader collaborator — tears the loop scene down and rebuilds it.
//!
//! The contract: by the time `OnEnter(Playing)` systems run after a
//! `SceneReloadEvent`, every loop-scoped entity from the previous scene
//! is gone and a fresh set will be initialized. Persisted-state and
//! timer restoration happen elsewhere in the same frame, before that
//! re-entry.

use bevy::prelude::*;

use crate::npcs::DialogueSession;
use crate::shared::*;

/// True while the next entry into Playing is a genuinely fresh scene
/// (new game, continue, or post-reset reload) rather than a return from
/// a dialogue, minigame, or pause overlay. OnEnter(Playing) initializers
/// that must not clobber mid-loop state check this flag; it clears after
/// the first Playing frame.
#[derive(Resource, Debug)]
pub struct SceneNeedsInit(pub bool);

impl Default for SceneNeedsInit {
    fn default() -> Self {
        Self(true)
    }
}

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneNeedsInit>()
            .add_systems(Update, handle_scene_reload.run_if(in_gameplay))
            .add_systems(
                Update,
                clear_scene_init_flag.run_if(in_state(GameState::Playing)),
            );
    }
}

/// Runs after every OnEnter(Playing) initializer has seen the flag.
fn clear_scene_init_flag(mut needs_init: ResMut<SceneNeedsInit>) {
    if needs_init.0 {
        needs_init.0 = false;
    }
}

fn handle_scene_reload(
    mut commands: Commands,
    mut events: EventReader<SceneReloadEvent>,
    scoped: Query<Entity, With<LoopScoped>>,
    mut needs_init: ResMut<SceneNeedsInit>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for _ev in events.read() {
        let count = scoped.iter().count();
        info!("Scene reload: despawning {count} loop-scoped entities");
        for entity in &scoped {
            commands.entity(entity).despawn_recursive();
        }
        // A conversation can't survive its participants.
        commands.remove_resource::<DialogueSession>();
        needs_init.0 = true;

        if *state.get() != GameState::Playing {
            next_state.set(GameState::Playing);
        }
    }
}
