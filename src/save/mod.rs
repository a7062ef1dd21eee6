//! Checkpoint persistence for Everloop.
//!
//! One checkpoint file holds everything that survives the loop reset:
//! world-state flags, held items, and unlocked achievements. Writes are
//! atomic — the blob goes to a temp file which is then renamed over the
//! old checkpoint, so a reader sees either the old record or the new one,
//! never a mix.
//!
//! Only the loop controller writes the checkpoint during a reset cycle;
//! this module additionally owns the main-menu entry points (new game,
//! continue) and the existence check that gates the continue affordance.

use bevy::prelude::*;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use crate::scene::SceneNeedsInit;
use crate::sched::ScheduledTasks;
use crate::shared::*;
use crate::timers::TimerRegistry;

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CheckpointAvailable>()
            // Refresh the continue affordance whenever the menu is entered
            .add_systems(OnEnter(GameState::MainMenu), scan_checkpoint)
            .add_systems(
                Update,
                (handle_new_game, handle_continue_game).run_if(in_state(GameState::MainMenu)),
            );
    }
}

/// Whether a checkpoint exists on disk. Read by the main menu to decide
/// if "continue" is offered.
#[derive(Resource, Debug, Clone, Default)]
pub struct CheckpointAvailable(pub bool);

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM HELPERS
// ═══════════════════════════════════════════════════════════════════════

#[cfg(not(target_arch = "wasm32"))]
fn saves_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join("saves")
}

#[cfg(not(target_arch = "wasm32"))]
fn checkpoint_path() -> PathBuf {
    saves_directory().join("checkpoint.json")
}

#[cfg(not(target_arch = "wasm32"))]
fn ensure_saves_dir() -> Result<(), std::io::Error> {
    let dir = saves_directory();
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// SAVE / LOAD PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════

#[cfg(not(target_arch = "wasm32"))]
pub fn write_save(data: &SaveData) -> Result<(), String> {
    ensure_saves_dir().map_err(|e| format!("Could not create saves directory: {}", e))?;

    let json =
        serde_json::to_string_pretty(data).map_err(|e| format!("Serialization failed: {}", e))?;

    let path = checkpoint_path();
    // Write to a temp file first, then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json)
        .map_err(|e| format!("Write failed for {}: {}", tmp_path.display(), e))?;
    fs::rename(&tmp_path, &path).map_err(|e| format!("Rename failed: {}", e))?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub fn write_save(_data: &SaveData) -> Result<(), String> {
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn read_save() -> Result<SaveData, String> {
    let path = checkpoint_path();
    if !path.exists() {
        return Err("No checkpoint exists".to_string());
    }
    let json = fs::read_to_string(&path)
        .map_err(|e| format!("Read failed for {}: {}", path.display(), e))?;
    let data: SaveData =
        serde_json::from_str(&json).map_err(|e| format!("Deserialization failed: {}", e))?;

    // Version check — future versions can add migration here
    if data.version != SAVE_VERSION {
        warn!(
            "Checkpoint has version {} but current version is {}. Attempting to load anyway.",
            data.version, SAVE_VERSION
        );
    }

    Ok(data)
}

#[cfg(target_arch = "wasm32")]
pub fn read_save() -> Result<SaveData, String> {
    Err("Checkpoints not available in browser".to_string())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_exists() -> bool {
    checkpoint_path().exists()
}

#[cfg(target_arch = "wasm32")]
pub fn save_exists() -> bool {
    false
}

// ═══════════════════════════════════════════════════════════════════════
// BLOB <-> RESOURCES
// ═══════════════════════════════════════════════════════════════════════

/// Assembles the checkpoint blob from the live persisted resources.
pub fn collect_save_data(
    flags: &WorldFlags,
    inventory: &Inventory,
    achievements: &Achievements,
) -> SaveData {
    let mut items: Vec<ItemId> = inventory.items.iter().cloned().collect();
    items.sort();
    SaveData {
        version: SAVE_VERSION,
        flags: flags.clone(),
        items,
        achievements: achievements.unlocked.clone(),
    }
}

/// Applies a loaded blob back onto the live resources. Runs before any
/// NPC or minigame initializes for the new scene. Flags and items are
/// replaced; achievements are unioned — an unlock can race the
/// checkpoint write by a frame, and unlocks never revoke.
pub fn apply_save_data(
    data: SaveData,
    flags: &mut WorldFlags,
    inventory: &mut Inventory,
    achievements: &mut Achievements,
) {
    *flags = data.flags;
    inventory.items = data.items.into_iter().collect();
    for id in data.achievements {
        if !achievements.is_unlocked(&id) {
            achievements.unlocked.push(id);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// MENU SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

fn scan_checkpoint(mut available: ResMut<CheckpointAvailable>) {
    available.0 = save_exists();
    info!(
        "Checkpoint scan complete: {}",
        if available.0 { "found" } else { "none" }
    );
}

/// Resets every persisted resource to defaults and enters play.
fn handle_new_game(
    mut events: EventReader<StartNewGameEvent>,
    mut flags: ResMut<WorldFlags>,
    mut inventory: ResMut<Inventory>,
    mut unlocked: ResMut<Achievements>,
    mut registry: ResMut<TimerRegistry>,
    mut tasks: ResMut<ScheduledTasks>,
    mut needs_init: ResMut<SceneNeedsInit>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for _ev in events.read() {
        info!("Starting new game");

        *flags = WorldFlags::default();
        *unlocked = Achievements::default();
        *inventory = Inventory::default();
        // The expedition pack: tools for both broken machines.
        inventory.add(ITEM_WIRE_SPOOL);
        inventory.add(ITEM_WRENCH);

        registry.clear();
        tasks.clear();
        needs_init.0 = true;

        next_state.set(GameState::Playing);
    }
}

/// Loads the checkpoint and enters play with the persisted world state.
fn handle_continue_game(
    mut events: EventReader<ContinueGameEvent>,
    mut complete_writer: EventWriter<LoadCompleteEvent>,
    mut flags: ResMut<WorldFlags>,
    mut inventory: ResMut<Inventory>,
    mut unlocked: ResMut<Achievements>,
    mut registry: ResMut<TimerRegistry>,
    mut tasks: ResMut<ScheduledTasks>,
    mut needs_init: ResMut<SceneNeedsInit>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for _ev in events.read() {
        match read_save() {
            Ok(data) => {
                apply_save_data(data, &mut flags, &mut inventory, &mut unlocked);
                registry.clear();
                tasks.clear();
                needs_init.0 = true;

                info!("Checkpoint loaded; loop {} resumes", flags.loop_count);
                complete_writer.send(LoadCompleteEvent {
                    success: true,
                    error_message: None,
                });
                next_state.set(GameState::Playing);
            }
            Err(e) => {
                warn!("Continue FAILED: {}", e);
                complete_writer.send(LoadCompleteEvent {
                    success: false,
                    error_message: Some(e),
                });
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════
