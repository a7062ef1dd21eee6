//! Headless integration tests for Everloop.
//!
//! These tests exercise the game's ECS logic without a window or GPU.
//! They build an app from the real domain plugins (minus audio and UI,
//! which need assets and input devices), drive it with events, and
//! control time manually so delays are deterministic.
//!
//! Run with: `cargo test --test headless`

use std::sync::Mutex;
use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimePlugin;

use everloop::loops::{LoopPhase, LoopState};
use everloop::minigames::{gears::GearBoard, wires::WireBoard, GEAR_LAYOUT, WIRE_SLOT_LAYOUT};
use everloop::npcs::{DialogueSession, NpcStateMachine};
use everloop::sched::{ScheduledTasks, TaskAction, TaskOwner};
use everloop::shared::*;
use everloop::timers::TimerRegistry;
use everloop::{achievements, data, loops, minigames, npcs, save, scene, sched, timers};

/// The checkpoint file is a fixed path next to the test binary; tests
/// that touch it must not interleave.
static CHECKPOINT_LOCK: Mutex<()> = Mutex::new(());

fn checkpoint_guard() -> std::sync::MutexGuard<'static, ()> {
    CHECKPOINT_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─────────────────────────────────────────────────────────────────────────────
// Test App Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Counts externally observable events across the whole run, so "exactly
/// once" assertions don't depend on event-buffer timing.
#[derive(Resource, Default)]
struct EventCounters {
    reloads: usize,
    wins: usize,
}

fn count_events(
    mut counters: ResMut<EventCounters>,
    mut reloads: EventReader<SceneReloadEvent>,
    mut wins: EventReader<MinigameWonEvent>,
) {
    counters.reloads += reloads.read().count();
    counters.wins += wins.read().count();
}

/// Builds an app with every logic plugin but no rendering, audio, UI, or
/// real clock. `Time` is advanced manually via `tick`.
fn build_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins.build().disable::<TimePlugin>());
    app.init_resource::<Time>();
    app.add_plugins(StatesPlugin);

    app.init_state::<GameState>();
    app.init_resource::<WorldFlags>();
    app.init_resource::<Inventory>();

    app.add_event::<TimerFinishedEvent>()
        .add_event::<RemoveTimerEvent>()
        .add_event::<ResetLoopEvent>()
        .add_event::<SceneReloadEvent>()
        .add_event::<SaveCompleteEvent>()
        .add_event::<LoadCompleteEvent>()
        .add_event::<StartNewGameEvent>()
        .add_event::<ContinueGameEvent>()
        .add_event::<NpcInteractEvent>()
        .add_event::<DialogueStartEvent>()
        .add_event::<DialogueAdvanceEvent>()
        .add_event::<DialogueEndEvent>()
        .add_event::<MinigameStartEvent>()
        .add_event::<MinigameWonEvent>()
        .add_event::<MinigameFinishedEvent>()
        .add_event::<ConnectWireEvent>()
        .add_event::<DisconnectWireEvent>()
        .add_event::<CycleGearEvent>()
        .add_event::<ForcePostMinigameEvent>()
        .add_event::<ItemPickupEvent>()
        .add_event::<PlaySfxEvent>()
        .add_event::<AchievementUnlockEvent>();

    app.add_plugins((
        sched::SchedPlugin,
        timers::TimersPlugin,
        save::SavePlugin,
        loops::LoopPlugin,
        npcs::NpcPlugin,
        minigames::MinigamePlugin,
        achievements::AchievementPlugin,
        scene::ScenePlugin,
        data::DataPlugin,
    ));

    app.init_resource::<EventCounters>();
    app.add_systems(Update, count_events);

    app
}

/// Advances the manual clock by `secs` and runs one frame.
fn tick(app: &mut App, secs: f32) {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(secs));
    app.update();
}

fn game_state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

/// Boots through Loading into MainMenu.
fn boot(app: &mut App) {
    tick(app, 0.0); // Loading: data populates, NextState = MainMenu
    tick(app, 0.0); // transition applies
    assert_eq!(game_state(app), GameState::MainMenu);
}

/// Boots and starts a new game, landing in Playing with a fresh scene.
fn new_game(app: &mut App) {
    boot(app);
    app.world_mut().send_event(StartNewGameEvent);
    tick(app, 0.0); // handle_new_game, NextState = Playing
    tick(app, 0.0); // transition applies, OnEnter(Playing) init
    assert_eq!(game_state(app), GameState::Playing);
}

fn npc_entity(app: &mut App, id: &str) -> Entity {
    let mut query = app.world_mut().query::<(Entity, &Npc)>();
    query
        .iter(app.world())
        .find(|(_, npc)| npc.id == id)
        .map(|(entity, _)| entity)
        .unwrap_or_else(|| panic!("NPC '{id}' not spawned"))
}

fn npc_state(app: &mut App, id: &str) -> NpcState {
    let mut query = app.world_mut().query::<(&Npc, &NpcStateMachine)>();
    query
        .iter(app.world())
        .find(|(npc, _)| npc.id == id)
        .map(|(_, sm)| sm.state)
        .unwrap_or_else(|| panic!("NPC '{id}' not spawned"))
}

/// Talks to an NPC and waits for the dialogue screen.
fn open_dialogue(app: &mut App, id: &str) {
    let entity = npc_entity(app, id);
    app.world_mut().send_event(NpcInteractEvent { entity });
    tick(app, 0.0); // interaction handled, NextState = Dialogue
    tick(app, 0.0); // transition applies
    assert_eq!(game_state(app), GameState::Dialogue);
}

fn choose_response(app: &mut App, index: usize) {
    app.world_mut().send_event(DialogueAdvanceEvent {
        response_index: index,
    });
    tick(app, 0.0);
    tick(app, 0.0);
}

/// Starts Rusty's wire minigame through the dialogue flow.
fn start_wire_game(app: &mut App) {
    open_dialogue(app, NPC_RUSTY);
    assert_eq!(
        npc_state(app, NPC_RUSTY),
        NpcState::MinigameReady,
        "holding the spool readies the minigame on interact"
    );
    choose_response(app, 0); // "Let's fix you." — ends dialogue, starts game
    assert_eq!(game_state(app), GameState::Minigame);
    assert_eq!(npc_state(app, NPC_RUSTY), NpcState::PlayingMinigame);
}

// ─────────────────────────────────────────────────────────────────────────────
// Boot
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_boot_populates_registries_and_reaches_main_menu() {
    let mut app = build_test_app();
    boot(&mut app);

    let graphs = app
        .world()
        .resource::<everloop::dialogue::DialogueRegistry>()
        .graphs
        .len();
    let npcs = app.world().resource::<npcs::NpcRegistry>().npcs.len();
    let specs = app
        .world()
        .resource::<everloop::timers::TimerConfig>()
        .specs
        .len();

    assert!(graphs >= 10, "dialogue graphs should be populated");
    assert_eq!(npcs, 3, "three residents at the gate");
    assert_eq!(specs, 2, "day clock and the seraph's patience");
}

#[test]
fn test_new_game_spawns_scene() {
    let mut app = build_test_app();
    new_game(&mut app);

    let mut query = app.world_mut().query::<&Npc>();
    assert_eq!(query.iter(app.world()).count(), 3);

    let registry = app.world().resource::<TimerRegistry>();
    let day = registry.get(TIMER_DAY).expect("day timer registered");
    assert!(day.is_running(), "day clock autostarts");
    assert!(registry.is_registered(TIMER_SERAPH));
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties 1 & 2 — timer snapshot/restore across a full reset
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_running_and_paused_timers_survive_the_reset() {
    let _guard = checkpoint_guard();
    let mut app = build_test_app();
    new_game(&mut app);

    // Let time pass, then pause the seraph's timer mid-flight.
    tick(&mut app, 30.0);
    app.world_mut()
        .resource_mut::<TimerRegistry>()
        .pause(TIMER_SERAPH);

    app.world_mut().send_event(ResetLoopEvent);
    tick(&mut app, 0.0); // reset handled
    tick(&mut app, 0.0); // LoopEnd entered
    assert_eq!(game_state(&mut app), GameState::LoopEnd);
    tick(&mut app, END_SCREEN_DELAY_SECS + 0.1); // reload fires, restore runs
    tick(&mut app, 0.0);
    tick(&mut app, 0.0); // back to Playing, scene re-init

    assert_eq!(game_state(&mut app), GameState::Playing);
    let registry = app.world().resource::<TimerRegistry>();

    let day = registry.get(TIMER_DAY).expect("day timer survives");
    assert!(day.is_running(), "was-running timer resumes after restore");
    assert!(
        day.elapsed <= END_SCREEN_DELAY_SECS + 1.0,
        "restored timer counts from zero again, not from loop-end"
    );

    let seraph = registry.get(TIMER_SERAPH).expect("patience timer survives");
    assert!(seraph.is_paused(), "was-paused timer restores paused");
    assert!(!seraph.is_running());
}

// ─────────────────────────────────────────────────────────────────────────────
// Property 3 — checkpoint round trip
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_checkpoint_round_trips() {
    let _guard = checkpoint_guard();

    let mut flags = WorldFlags::default();
    flags.gear_game_won = true;
    flags.loop_count = 7;
    let mut inventory = Inventory::default();
    inventory.add(ITEM_REMEDY);
    let achievements = Achievements {
        unlocked: vec![ACH_GEAR_MASTER.to_string()],
    };

    let blob = save::collect_save_data(&flags, &inventory, &achievements);
    save::write_save(&blob).expect("checkpoint write succeeds");
    assert!(save::save_exists());

    let loaded = save::read_save().expect("checkpoint read succeeds");
    assert_eq!(loaded.version, SAVE_VERSION);
    assert!(loaded.flags.gear_game_won);
    assert_eq!(loaded.flags.loop_count, 7);
    assert_eq!(loaded.items, vec![ITEM_REMEDY.to_string()]);
    assert_eq!(loaded.achievements, vec![ACH_GEAR_MASTER.to_string()]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Property 4 — double reset schedules exactly one reload
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_double_reset_triggers_one_scene_reload() {
    let _guard = checkpoint_guard();
    let mut app = build_test_app();
    new_game(&mut app);

    app.world_mut().send_event(ResetLoopEvent);
    app.world_mut().send_event(ResetLoopEvent);
    tick(&mut app, 0.0);
    tick(&mut app, 0.0);
    assert_eq!(game_state(&mut app), GameState::LoopEnd);
    assert_eq!(
        app.world().resource::<ScheduledTasks>().pending(),
        1,
        "only one reload continuation is pending"
    );

    // A third request mid-reset is also ignored.
    app.world_mut().send_event(ResetLoopEvent);
    tick(&mut app, 0.0);
    assert_eq!(app.world().resource::<ScheduledTasks>().pending(), 1);

    tick(&mut app, END_SCREEN_DELAY_SECS + 0.1);
    tick(&mut app, 0.0);
    tick(&mut app, 0.0);

    assert_eq!(game_state(&mut app), GameState::Playing);
    assert_eq!(
        app.world().resource::<EventCounters>().reloads,
        1,
        "exactly one scene reload for the whole pile-up"
    );
    assert_eq!(
        app.world().resource::<LoopState>().phase,
        LoopPhase::Active
    );
    assert_eq!(app.world().resource::<WorldFlags>().loop_count, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Property 5 — wire game wins exactly once at the threshold
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_wire_game_wins_once_at_threshold() {
    let mut app = build_test_app();
    new_game(&mut app);
    start_wire_game(&mut app);

    // Correct wires for slots 0..3 per the layout, one at a time. The
    // second settle tick lets the frame-ordered event counter catch up.
    for (i, slot_index) in [0usize, 1, 2].into_iter().enumerate() {
        app.world_mut().send_event(ConnectWireEvent {
            slot_index,
            wire: WIRE_SLOT_LAYOUT[slot_index],
        });
        tick(&mut app, 0.0);
        tick(&mut app, 0.0);
        let expected_wins = if i == 2 { 1 } else { 0 };
        assert_eq!(
            app.world().resource::<EventCounters>().wins,
            expected_wins,
            "win signal fires on the third correct slot only"
        );
    }

    assert!(app.world().resource::<WorldFlags>().wire_game_won);
    tick(&mut app, 0.0);
    assert_eq!(npc_state(&mut app, NPC_RUSTY), NpcState::PostMinigame);

    // A fourth correct slot after the win changes nothing.
    app.world_mut().send_event(ConnectWireEvent {
        slot_index: 3,
        wire: WIRE_SLOT_LAYOUT[3],
    });
    tick(&mut app, 0.0);
    assert_eq!(app.world().resource::<EventCounters>().wins, 1);

    // The presentation beat closes the minigame screen.
    tick(&mut app, WIN_PRESENTATION_DELAY_SECS + 0.1);
    tick(&mut app, 0.0);
    tick(&mut app, 0.0);
    assert_eq!(game_state(&mut app), GameState::Playing);
}

// ─────────────────────────────────────────────────────────────────────────────
// Property 6 — completion signal for an unstarted minigame is a no-op
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_premature_completion_leaves_idle_npc_alone() {
    let mut app = build_test_app();
    new_game(&mut app);

    assert_eq!(npc_state(&mut app, NPC_COG), NpcState::DefaultIdle);
    app.world_mut().send_event(MinigameWonEvent {
        minigame: MinigameId::Gears,
    });
    tick(&mut app, 0.0);
    tick(&mut app, 0.0);

    assert_eq!(
        npc_state(&mut app, NPC_COG),
        NpcState::DefaultIdle,
        "a completion signal for a game never started must not transition"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Property 7 — gated response falls back without the item
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_gated_seraph_response_falls_back_without_journal() {
    let mut app = build_test_app();
    new_game(&mut app);
    open_dialogue(&mut app, NPC_SERAPH);

    // Response 1 is gated on the loop journal, which a first-loop player
    // lacks: resolution must land on the brush-off node (2), not the
    // revelation node (3).
    app.world_mut()
        .send_event(DialogueAdvanceEvent { response_index: 1 });
    tick(&mut app, 0.0);

    let session = app.world().resource::<DialogueSession>();
    assert_eq!(session.node, 2, "fallback path taken without the journal");
}

#[test]
fn test_gated_seraph_response_takes_primary_with_journal() {
    let mut app = build_test_app();
    new_game(&mut app);

    app.world_mut().send_event(ItemPickupEvent {
        item_id: ITEM_LOOP_JOURNAL.to_string(),
    });
    tick(&mut app, 0.0);

    open_dialogue(&mut app, NPC_SERAPH);
    app.world_mut()
        .send_event(DialogueAdvanceEvent { response_index: 1 });
    tick(&mut app, 0.0);

    let session = app.world().resource::<DialogueSession>();
    assert_eq!(session.node, 3, "primary path taken with the journal");
}

// ─────────────────────────────────────────────────────────────────────────────
// Property 8 — disconnect clears slot correctness immediately
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_disconnect_clears_correctness_before_recount() {
    let mut app = build_test_app();
    new_game(&mut app);
    start_wire_game(&mut app);

    app.world_mut().send_event(ConnectWireEvent {
        slot_index: 0,
        wire: WIRE_SLOT_LAYOUT[0],
    });
    tick(&mut app, 0.0);
    assert!(app.world().resource::<WireBoard>().slots[0].correct);

    app.world_mut()
        .send_event(DisconnectWireEvent { slot_index: 0 });
    tick(&mut app, 0.0);

    let board = app.world().resource::<WireBoard>();
    assert!(!board.slots[0].correct, "correctness cleared on disconnect");
    assert_eq!(board.slots[0].connected, None);
    assert_eq!(board.correct_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Gear game through the full dialogue flow
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_gear_game_wins_when_all_gears_lock() {
    let mut app = build_test_app();
    new_game(&mut app);

    open_dialogue(&mut app, NPC_COG);
    assert_eq!(npc_state(&mut app, NPC_COG), NpcState::MinigameReady);
    choose_response(&mut app, 0);
    assert_eq!(game_state(&mut app), GameState::Minigame);

    // Pin the board to known starting sizes, one click away per gear.
    app.world_mut()
        .insert_resource(GearBoard::with_starts(&GEAR_LAYOUT, &[1, 3, 0]));

    for gear_index in 0..3 {
        app.world_mut().send_event(CycleGearEvent { gear_index });
        tick(&mut app, 0.0);
    }
    tick(&mut app, 0.0);

    assert!(app.world().resource::<GearBoard>().won);
    assert!(app.world().resource::<WorldFlags>().gear_game_won);
    assert_eq!(npc_state(&mut app, NPC_COG), NpcState::PostMinigame);
}

// ─────────────────────────────────────────────────────────────────────────────
// Bypass item — remedy forces PostMinigame after the beat
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_remedy_bypass_heals_the_seraph() {
    let mut app = build_test_app();
    new_game(&mut app);

    app.world_mut().send_event(ItemPickupEvent {
        item_id: ITEM_REMEDY.to_string(),
    });
    tick(&mut app, 0.0);

    open_dialogue(&mut app, NPC_SERAPH);
    choose_response(&mut app, 0); // any response triggers the bypass

    assert_eq!(
        game_state(&mut app),
        GameState::Playing,
        "bypass ends the dialogue immediately"
    );
    assert_eq!(
        npc_state(&mut app, NPC_SERAPH),
        NpcState::DefaultIdle,
        "the forced transition waits for its presentation beat"
    );

    tick(&mut app, BYPASS_TRANSITION_DELAY_SECS + 0.1);
    tick(&mut app, 0.0);
    tick(&mut app, 0.0);

    assert_eq!(npc_state(&mut app, NPC_SERAPH), NpcState::PostMinigame);
    let flags = app.world().resource::<WorldFlags>();
    assert!(flags.seraph_healed);

    let unlocked = app.world().resource::<Achievements>();
    assert!(unlocked.is_unlocked(ACH_TRUE_ENDING));
    assert!(
        unlocked.is_unlocked(ACH_SPEEDRUN),
        "healing seconds into the loop is well inside the speedrun window"
    );

    // The pressure timer is gone once the seraph is whole.
    tick(&mut app, 0.0);
    assert!(!app
        .world()
        .resource::<TimerRegistry>()
        .is_registered(TIMER_SERAPH));
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduled continuations — despawned owners never fire
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_continuation_for_despawned_entity_is_dropped() {
    let mut app = build_test_app();
    new_game(&mut app);

    let entity = npc_entity(&mut app, NPC_SERAPH);
    app.world_mut()
        .resource_mut::<ScheduledTasks>()
        .schedule(0.1, TaskOwner::Npc(entity), TaskAction::ForcePostMinigame(entity));
    app.world_mut().despawn(entity);

    tick(&mut app, 0.5);
    tick(&mut app, 0.0);

    assert_eq!(app.world().resource::<ScheduledTasks>().pending(), 0);
    let fired = app
        .world()
        .resource::<Events<ForcePostMinigameEvent>>()
        .len();
    assert_eq!(fired, 0, "a dead owner's continuation must not fire");
}

// ─────────────────────────────────────────────────────────────────────────────
// Achievements — idempotent unlocks
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_achievement_unlock_is_idempotent() {
    let mut app = build_test_app();
    new_game(&mut app);

    for _ in 0..3 {
        app.world_mut().send_event(AchievementUnlockEvent {
            id: ACH_WIRE_MASTER.to_string(),
        });
        tick(&mut app, 0.0);
    }

    let unlocked = app.world().resource::<Achievements>();
    let count = unlocked
        .unlocked
        .iter()
        .filter(|id| id.as_str() == ACH_WIRE_MASTER)
        .count();
    assert_eq!(count, 1, "repeat unlock requests record one entry");
}

// ─────────────────────────────────────────────────────────────────────────────
// Timer-driven reset and persistence across the reload
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_patience_running_out_resets_the_loop() {
    let _guard = checkpoint_guard();
    let mut app = build_test_app();
    new_game(&mut app);

    tick(&mut app, SERAPH_PATIENCE_SECS + 1.0);
    tick(&mut app, 0.0);
    tick(&mut app, 0.0);

    assert_eq!(game_state(&mut app), GameState::LoopEnd);
    assert_eq!(app.world().resource::<WorldFlags>().loop_count, 1);
}

#[test]
fn test_progress_survives_the_loop_reset() {
    let _guard = checkpoint_guard();
    let mut app = build_test_app();
    new_game(&mut app);

    // Win the wire game, then die.
    start_wire_game(&mut app);
    for slot_index in [0usize, 1, 2] {
        app.world_mut().send_event(ConnectWireEvent {
            slot_index,
            wire: WIRE_SLOT_LAYOUT[slot_index],
        });
    }
    tick(&mut app, 0.0);
    tick(&mut app, 0.0);
    assert!(app.world().resource::<WorldFlags>().wire_game_won);

    app.world_mut().send_event(ResetLoopEvent);
    tick(&mut app, 0.0);
    tick(&mut app, 0.0);
    tick(&mut app, END_SCREEN_DELAY_SECS + 0.1);
    tick(&mut app, 0.0);
    tick(&mut app, 0.0);
    assert_eq!(game_state(&mut app), GameState::Playing);

    // The repaired panel stays repaired in the next loop.
    let flags = app.world().resource::<WorldFlags>();
    assert!(flags.wire_game_won);
    assert_eq!(flags.loop_count, 1);
    assert_eq!(npc_state(&mut app, NPC_RUSTY), NpcState::PostMinigame);
    assert!(
        app.world().resource::<WireBoard>().won,
        "the board rebuilds in its solved configuration"
    );

    // Dying once hands the player the loop journal.
    assert!(app.world().resource::<Inventory>().has(ITEM_LOOP_JOURNAL));

    // Achievements persisted through the checkpoint.
    let unlocked = app.world().resource::<Achievements>();
    assert!(unlocked.is_unlocked(ACH_WIRE_MASTER));
    assert!(unlocked.is_unlocked(ACH_LOOP_DEATH));
}
