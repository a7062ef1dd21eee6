//! Audio collaborator — turns `PlaySfxEvent` ids into one-shot playback.
//!
//! Core logic only ever names an id; this is the single place that knows
//! about asset paths. Unknown ids are dropped silently so a missing sound
//! never interrupts play.

use bevy::prelude::*;

use crate::shared::*;

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, handle_play_sfx);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SFX PATH MAPPING
// ═══════════════════════════════════════════════════════════════════════

/// Maps SFX ids (sent by other domains) to actual audio file paths.
fn sfx_path(sfx_id: &str) -> Option<&'static str> {
    match sfx_id {
        "dialogue_blip" => Some("audio/sfx/sfx_menu_move1.ogg"),
        "menu_select" => Some("audio/sfx/sfx_menu_select1.ogg"),
        "pickup" => Some("audio/sfx/sfx_coin_single1.ogg"),
        "gear_click" => Some("audio/sfx/sfx_sounds_interaction5.ogg"),
        "wire_grab" => Some("audio/sfx/sfx_movement_jump1.ogg"),
        "wire_connect" => Some("audio/sfx/sfx_sounds_powerup1.ogg"),
        "spark" => Some("audio/sfx/sfx_sounds_error1.ogg"),
        "panel_open" => Some("audio/sfx/sfx_movement_dooropen1.ogg"),
        "machine_purr" => Some("audio/sfx/sfx_sounds_interaction3.ogg"),
        "win_fanfare" => Some("audio/sfx/sfx_sounds_fanfare1.ogg"),
        "achievement" => Some("audio/sfx/sfx_sounds_fanfare2.ogg"),
        "remedy" => Some("audio/sfx/sfx_sounds_powerup3.ogg"),
        "choir" => Some("audio/sfx/sfx_sounds_fanfare3.ogg"),
        "loop_reset" => Some("audio/sfx/sfx_sounds_negative1.ogg"),
        "wake" => Some("audio/sfx/sfx_sounds_pause1_in.ogg"),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Listen for PlaySfxEvent and spawn one-shot audio sources that
/// auto-despawn when playback ends.
fn handle_play_sfx(
    mut events: EventReader<PlaySfxEvent>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
) {
    for event in events.read() {
        if let Some(path) = sfx_path(&event.sfx_id) {
            commands.spawn((
                AudioPlayer::new(asset_server.load(path)),
                PlaybackSettings::DESPAWN,
            ));
        }
    }
}
