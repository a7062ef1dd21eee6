//! Minigame domain — board construction, the active-game gate, and the
//! shared win/finish flow.
//!
//! Boards are rebuilt for every scene instance. A game already won in a
//! previous loop comes back in its solved configuration and never
//! re-signals. Winning schedules a short presentation beat before control
//! returns to free movement.

pub mod gears;
pub mod wires;

use bevy::prelude::*;

use crate::scene::SceneNeedsInit;
use crate::sched::{ScheduledTasks, TaskAction, TaskOwner};
use crate::shared::*;

use gears::{GearBoard, GearSpec};
use wires::WireBoard;

// ═══════════════════════════════════════════════════════════════════════
// BOARD LAYOUTS
// ═══════════════════════════════════════════════════════════════════════

/// Rusty's panel: four sockets, three correct connections needed.
pub const WIRE_SLOT_LAYOUT: [WireId; 4] = [WireId::Two, WireId::Four, WireId::One, WireId::Three];
pub const WIRE_WIN_THRESHOLD: usize = 3;

/// Cog's machine: three gears of varying sizes.
pub const GEAR_LAYOUT: [GearSpec; 3] = [
    GearSpec { sizes: 4, correct_index: 2 },
    GearSpec { sizes: 4, correct_index: 0 },
    GearSpec { sizes: 3, correct_index: 1 },
];

/// Which minigame currently owns the Minigame screen, if any.
#[derive(Resource, Debug, Clone, Default)]
pub struct ActiveMinigame(pub Option<MinigameId>);

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct MinigamePlugin;

impl Plugin for MinigamePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveMinigame>()
            .init_resource::<WireBoard>()
            .init_resource::<GearBoard>()
            .add_systems(OnEnter(GameState::Playing), build_boards)
            .add_systems(OnExit(GameState::Minigame), clear_active_minigame)
            .add_systems(
                Update,
                (
                    handle_minigame_start,
                    wires::handle_connect_wire,
                    wires::handle_disconnect_wire,
                    gears::handle_cycle_gear,
                    handle_minigame_won,
                    handle_minigame_finished,
                )
                    .run_if(in_gameplay),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Rebuilds both boards for a new scene instance, honoring wins that
/// survived the loop reset. Returning to Playing from a dialogue or the
/// pause overlay keeps partial progress untouched.
fn build_boards(
    needs_init: Res<SceneNeedsInit>,
    flags: Res<WorldFlags>,
    mut wire_board: ResMut<WireBoard>,
    mut gear_board: ResMut<GearBoard>,
    mut active: ResMut<ActiveMinigame>,
) {
    if !needs_init.0 {
        return;
    }
    active.0 = None;

    *wire_board = WireBoard::new(WIRE_SLOT_LAYOUT.to_vec(), WIRE_WIN_THRESHOLD);
    if flags.wire_game_won {
        wire_board.force_complete();
    }

    *gear_board = GearBoard::new(&GEAR_LAYOUT);
    if flags.gear_game_won {
        gear_board.force_complete();
    }

    info!(
        "Minigame boards built (wires won: {}, gears won: {})",
        flags.wire_game_won, flags.gear_game_won
    );
}

/// Walking away (or finishing) closes the gate on board input.
fn clear_active_minigame(mut active: ResMut<ActiveMinigame>) {
    active.0 = None;
}

fn handle_minigame_start(
    mut events: EventReader<MinigameStartEvent>,
    mut active: ResMut<ActiveMinigame>,
) {
    for ev in events.read() {
        info!("Minigame {:?} begins", ev.minigame);
        active.0 = Some(ev.minigame);
    }
}

/// Win presentation: fanfare plus the achievement for that machine, then
/// a scheduled beat before the screen closes.
fn handle_minigame_won(
    mut events: EventReader<MinigameWonEvent>,
    mut tasks: ResMut<ScheduledTasks>,
    mut ach_writer: EventWriter<AchievementUnlockEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    for ev in events.read() {
        let achievement = match ev.minigame {
            MinigameId::Wires => ACH_WIRE_MASTER,
            MinigameId::Gears => ACH_GEAR_MASTER,
        };
        ach_writer.send(AchievementUnlockEvent {
            id: achievement.to_string(),
        });
        sfx_writer.send(PlaySfxEvent {
            sfx_id: "win_fanfare".to_string(),
        });
        tasks.schedule(
            WIN_PRESENTATION_DELAY_SECS,
            TaskOwner::Minigame(ev.minigame),
            TaskAction::FinishMinigame(ev.minigame),
        );
    }
}

/// The presentation beat ended; hand the screen back.
fn handle_minigame_finished(
    mut events: EventReader<MinigameFinishedEvent>,
    mut active: ResMut<ActiveMinigame>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for ev in events.read() {
        if active.0 == Some(ev.minigame) {
            active.0 = None;
        }
        if *state.get() == GameState::Minigame {
            next_state.set(GameState::Playing);
        }
    }
}
