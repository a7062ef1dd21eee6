//! Loop controller — the day-reset cycle.
//!
//! Responsible for:
//! - Ending the loop when the day clock (or the seraph's patience) runs out
//! - Snapshotting timer run/pause state and re-arming timers for the next loop
//! - Writing the checkpoint BEFORE any scene reload is requested
//! - Showing the end-of-loop screen, then requesting the scene reload
//! - Restoring persisted state and the timer snapshot once the scene reloads
//!
//! A reset requested while one is already in flight is ignored, so a
//! pile-up of triggers schedules exactly one reload.

use bevy::prelude::*;

use crate::save;
use crate::sched::{ScheduledTasks, TaskAction, TaskOwner};
use crate::shared::*;
use crate::timers::{TimerRegistry, TimerSnapshot};

// ═══════════════════════════════════════════════════════════════════════
// LOOP STATE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    #[default]
    Active,
    Resetting,
}

#[derive(Resource, Debug, Default)]
pub struct LoopState {
    pub phase: LoopPhase,
    /// Timer state captured at loop-end, re-applied after the reload.
    pub snapshot: Option<TimerSnapshot>,
    /// Set once the first reset of this session completes; drives the
    /// wake-up presentation cue on later scene starts.
    pub has_looped: bool,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct LoopPlugin;

impl Plugin for LoopPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoopState>()
            .add_systems(
                Update,
                (trigger_reset_on_timer, handle_reset_loop, restore_after_reload)
                    .chain()
                    .run_if(in_gameplay),
            )
            .add_systems(OnEnter(GameState::Playing), announce_wake);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// The loop ends when the day clock expires, or early if the seraph's
/// patience timer was never removed. The clock that ended the loop is
/// re-armed here, before the snapshot, so it comes back running in the
/// next loop like any other mid-flight timer.
fn trigger_reset_on_timer(
    mut finished: EventReader<TimerFinishedEvent>,
    mut registry: ResMut<TimerRegistry>,
    mut reset_writer: EventWriter<ResetLoopEvent>,
) {
    for ev in finished.read() {
        match ev.name.as_str() {
            TIMER_DAY => {
                info!("Day clock ran out — the loop closes");
            }
            TIMER_SERAPH => {
                info!("The seraph's patience is spent — the loop collapses early");
            }
            _ => continue,
        }
        registry.reset(&ev.name);
        registry.start(&ev.name);
        reset_writer.send(ResetLoopEvent);
    }
}

/// The full reset sequence. The checkpoint write happens here,
/// synchronously, so it has completed (or visibly failed) before the
/// scene reload is even scheduled.
#[allow(clippy::too_many_arguments)]
fn handle_reset_loop(
    mut events: EventReader<ResetLoopEvent>,
    mut loop_state: ResMut<LoopState>,
    mut registry: ResMut<TimerRegistry>,
    mut flags: ResMut<WorldFlags>,
    mut inventory: ResMut<Inventory>,
    achievements: Res<Achievements>,
    mut tasks: ResMut<ScheduledTasks>,
    mut save_complete: EventWriter<SaveCompleteEvent>,
    mut ach_writer: EventWriter<AchievementUnlockEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for _ev in events.read() {
        if loop_state.phase == LoopPhase::Resetting {
            info!("ResetLoop ignored — a reset is already in flight");
            continue;
        }
        loop_state.phase = LoopPhase::Resetting;

        // Capture which timers were mid-flight vs paused, then re-arm:
        // was-running timers reset and restart from zero, was-paused
        // timers reset and stay put.
        let snapshot = registry.snapshot();
        registry.restore(&snapshot);
        loop_state.snapshot = Some(snapshot);

        flags.loop_count += 1;
        // After the first death the player starts keeping the journal.
        inventory.add(ITEM_LOOP_JOURNAL);

        let data = save::collect_save_data(&flags, &inventory, &achievements);
        match save::write_save(&data) {
            Ok(()) => {
                info!("Checkpoint written for loop {}", flags.loop_count);
                save_complete.send(SaveCompleteEvent {
                    success: true,
                    error_message: None,
                });
            }
            Err(e) => {
                error!("Checkpoint write FAILED — progress may not survive: {}", e);
                save_complete.send(SaveCompleteEvent {
                    success: false,
                    error_message: Some(e),
                });
            }
        }

        ach_writer.send(AchievementUnlockEvent {
            id: ACH_LOOP_DEATH.to_string(),
        });
        if flags.loop_count >= SURVIVOR_LOOPS {
            ach_writer.send(AchievementUnlockEvent {
                id: ACH_LOOP_SURVIVOR.to_string(),
            });
        }

        sfx_writer.send(PlaySfxEvent {
            sfx_id: "loop_reset".to_string(),
        });

        tasks.schedule(
            END_SCREEN_DELAY_SECS,
            TaskOwner::Loop,
            TaskAction::ReloadScene,
        );
        next_state.set(GameState::LoopEnd);
    }
}

/// Runs when the scene reload fires: re-applies the checkpoint and the
/// timer snapshot before any `OnEnter(Playing)` initialization sees the
/// world.
fn restore_after_reload(
    mut events: EventReader<SceneReloadEvent>,
    mut loop_state: ResMut<LoopState>,
    mut registry: ResMut<TimerRegistry>,
    mut flags: ResMut<WorldFlags>,
    mut inventory: ResMut<Inventory>,
    mut achievements: ResMut<Achievements>,
    mut load_complete: EventWriter<LoadCompleteEvent>,
) {
    for _ev in events.read() {
        match save::read_save() {
            Ok(data) => {
                save::apply_save_data(data, &mut flags, &mut inventory, &mut achievements);
                load_complete.send(LoadCompleteEvent {
                    success: true,
                    error_message: None,
                });
            }
            Err(e) => {
                // In-memory state is still coherent; play on with it.
                warn!("Checkpoint load failed after reset: {}", e);
                load_complete.send(LoadCompleteEvent {
                    success: false,
                    error_message: Some(e),
                });
            }
        }

        if let Some(snapshot) = loop_state.snapshot.take() {
            registry.restore(&snapshot);
        }

        loop_state.phase = LoopPhase::Active;
        loop_state.has_looped = true;
    }
}

/// Wake-up cue on post-loop scene starts.
fn announce_wake(
    needs_init: Res<crate::scene::SceneNeedsInit>,
    loop_state: Res<LoopState>,
    flags: Res<WorldFlags>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    if needs_init.0 && loop_state.has_looped {
        info!(
            "Loop {} begins — the player wakes at the gate again",
            flags.loop_count + 1
        );
        sfx_writer.send(PlaySfxEvent {
            sfx_id: "wake".to_string(),
        });
    }
}
