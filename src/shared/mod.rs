//! Shared components, resources, events, and states for Everloop.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain directly.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE — top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    MainMenu,
    Playing,
    Dialogue,
    Minigame,
    LoopEnd,
    Paused,
}

/// True while the frame loop should advance timers and scheduled work.
/// Paused, menu, and loading screens freeze the world; the end-of-loop
/// screen keeps ticking so the reload delay can fire.
pub fn in_gameplay(state: Res<State<GameState>>) -> bool {
    matches!(
        state.get(),
        GameState::Playing | GameState::Dialogue | GameState::Minigame | GameState::LoopEnd
    )
}

// ═══════════════════════════════════════════════════════════════════════
// IDENTITIES
// ═══════════════════════════════════════════════════════════════════════

/// String IDs for data-driven flexibility.
pub type ItemId = String;
pub type NpcId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinigameId {
    Wires,
    Gears,
}

/// Wire identity for the wire-matching minigame. A slot is correct when
/// the connected wire's id equals the slot's expected id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    One,
    Two,
    Three,
    Four,
}

// ═══════════════════════════════════════════════════════════════════════
// NPC STATE MACHINE
// ═══════════════════════════════════════════════════════════════════════

/// Per-NPC interaction state. Transitions are total: any signal that has
/// no defined edge from the current state is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NpcState {
    #[default]
    DefaultIdle,
    MinigameReady,
    PlayingMinigame,
    PostMinigame,
}

/// Behavior variant tag. Dialogue variant selection, response-path
/// resolution, and state-entry hooks dispatch through this tag instead of
/// an inheritance chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcVariant {
    Seraph,
    Rusty,
    Cog,
}

#[derive(Component, Debug, Clone)]
pub struct Npc {
    pub id: NpcId,
    pub variant: NpcVariant,
}

/// Marker for entities that belong to the current loop's scene instance.
/// Every one of these is despawned when the loop resets.
#[derive(Component, Debug, Clone, Copy)]
pub struct LoopScoped;

// ═══════════════════════════════════════════════════════════════════════
// WORLD-STATE FLAGS & INVENTORY
// ═══════════════════════════════════════════════════════════════════════

/// Flags that survive the loop reset. The loop engine persists and
/// restores these but never interprets them; dialogue and NPC logic do.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldFlags {
    pub wire_game_won: bool,
    pub gear_game_won: bool,
    pub seraph_healed: bool,
    pub loop_count: u32,
}

impl WorldFlags {
    pub fn both_minigames_won(&self) -> bool {
        self.wire_game_won && self.gear_game_won
    }

    pub fn minigame_won(&self, minigame: MinigameId) -> bool {
        match minigame {
            MinigameId::Wires => self.wire_game_won,
            MinigameId::Gears => self.gear_game_won,
        }
    }
}

/// Held items. Items gate dialogue branches and NPC state transitions;
/// they persist across loops via the checkpoint.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub items: HashSet<ItemId>,
}

impl Inventory {
    pub fn has(&self, item_id: &str) -> bool {
        self.items.contains(item_id)
    }

    pub fn add(&mut self, item_id: &str) -> bool {
        self.items.insert(item_id.to_string())
    }

    pub fn remove(&mut self, item_id: &str) -> bool {
        self.items.remove(item_id)
    }
}

/// Unlocked platform achievements. Persisted in the checkpoint so unlocks
/// survive the loop reset.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Achievements {
    pub unlocked: Vec<String>,
}

impl Achievements {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|a| a == id)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS — cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

/// A registered timer ran to completion. Fired at most once per run cycle.
#[derive(Event, Debug, Clone)]
pub struct TimerFinishedEvent {
    pub name: String,
}

/// Ask the registry to drop a timer entirely (e.g. a pressure timer that
/// no longer applies once its NPC is healed).
#[derive(Event, Debug, Clone)]
pub struct RemoveTimerEvent {
    pub name: String,
}

/// Begin a full loop reset: snapshot timers, checkpoint, end screen,
/// scene reload. Ignored while a reset is already in flight.
#[derive(Event, Debug, Clone)]
pub struct ResetLoopEvent;

/// Tear down the current scene instance and rebuild it. By the time
/// `OnEnter(Playing)` systems run again, a fresh set of scene objects
/// exists.
#[derive(Event, Debug, Clone)]
pub struct SceneReloadEvent;

/// Checkpoint write finished (success or failure). Failure is visible,
/// never silent: the reset cycle continues but the player can be told.
#[derive(Event, Debug, Clone)]
pub struct SaveCompleteEvent {
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Event, Debug, Clone)]
pub struct LoadCompleteEvent {
    pub success: bool,
    pub error_message: Option<String>,
}

/// Main-menu intents.
#[derive(Event, Debug, Clone)]
pub struct StartNewGameEvent;

#[derive(Event, Debug, Clone)]
pub struct ContinueGameEvent;

/// Player attempts to talk to an NPC.
#[derive(Event, Debug, Clone)]
pub struct NpcInteractEvent {
    pub entity: Entity,
}

/// Dialogue opened for an NPC; the UI layer renders the session.
#[derive(Event, Debug, Clone)]
pub struct DialogueStartEvent {
    pub npc_id: NpcId,
}

/// Player picked a response option in the open dialogue.
#[derive(Event, Debug, Clone)]
pub struct DialogueAdvanceEvent {
    pub response_index: usize,
}

/// Dialogue closed; control returns to free movement (or a minigame).
#[derive(Event, Debug, Clone)]
pub struct DialogueEndEvent;

/// An NPC's minigame begins.
#[derive(Event, Debug, Clone)]
pub struct MinigameStartEvent {
    pub minigame: MinigameId,
}

/// A minigame reached its win condition. Fired exactly once per minigame.
#[derive(Event, Debug, Clone)]
pub struct MinigameWonEvent {
    pub minigame: MinigameId,
}

/// Win presentation finished; leave the minigame screen.
#[derive(Event, Debug, Clone)]
pub struct MinigameFinishedEvent {
    pub minigame: MinigameId,
}

/// Wire minigame input: plug a wire into a slot.
#[derive(Event, Debug, Clone)]
pub struct ConnectWireEvent {
    pub slot_index: usize,
    pub wire: WireId,
}

/// Wire minigame input: unplug whatever is in a slot.
#[derive(Event, Debug, Clone)]
pub struct DisconnectWireEvent {
    pub slot_index: usize,
}

/// Gear minigame input: cycle a gear to its next size.
#[derive(Event, Debug, Clone)]
pub struct CycleGearEvent {
    pub gear_index: usize,
}

/// Scheduled continuation: force an NPC into PostMinigame (bypass item).
#[derive(Event, Debug, Clone)]
pub struct ForcePostMinigameEvent {
    pub npc: Entity,
}

/// Player picked up an item somewhere in the world.
#[derive(Event, Debug, Clone)]
pub struct ItemPickupEvent {
    pub item_id: ItemId,
}

/// One-shot sound request. The audio module maps ids to asset paths; core
/// logic only ever names the event.
#[derive(Event, Debug, Clone)]
pub struct PlaySfxEvent {
    pub sfx_id: String,
}

/// Fire-and-forget platform achievement request. Duplicate unlocks for
/// the same id are tolerated without error.
#[derive(Event, Debug, Clone)]
pub struct AchievementUnlockEvent {
    pub id: String,
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const SCREEN_WIDTH: f32 = 960.0;
pub const SCREEN_HEIGHT: f32 = 540.0;

/// Length of one in-game day before the loop forcibly resets.
pub const DAY_LOOP_SECS: f32 = 600.0;
/// How long the seraph holds on before its collapse ends the loop early.
pub const SERAPH_PATIENCE_SECS: f32 = 540.0;
/// End-of-loop screen display time before the scene reload is requested.
pub const END_SCREEN_DELAY_SECS: f32 = 3.0;
/// Presentation beat between choosing the bypass response and the forced
/// PostMinigame transition.
pub const BYPASS_TRANSITION_DELAY_SECS: f32 = 0.2;
/// Win fanfare time before a minigame screen closes.
pub const WIN_PRESENTATION_DELAY_SECS: f32 = 1.5;
/// Healing the seraph within this window of loop start earns the
/// speedrun achievement.
pub const SPEEDRUN_WINDOW_SECS: f32 = 480.0;

pub const TIMER_DAY: &str = "day";
pub const TIMER_SERAPH: &str = "seraph_patience";

pub const ITEM_WIRE_SPOOL: &str = "wire_spool";
pub const ITEM_WRENCH: &str = "wrench";
pub const ITEM_REMEDY: &str = "remedy";
pub const ITEM_LOOP_JOURNAL: &str = "loop_journal";

pub const NPC_SERAPH: &str = "seraph";
pub const NPC_RUSTY: &str = "rusty";
pub const NPC_COG: &str = "cog";

pub const ACH_LOOP_DEATH: &str = "loop_death";
pub const ACH_LOOP_SURVIVOR: &str = "loop_survivor";
pub const ACH_WIRE_MASTER: &str = "wire_master";
pub const ACH_GEAR_MASTER: &str = "gear_master";
pub const ACH_TRUE_ENDING: &str = "true_ending";
pub const ACH_SPEEDRUN: &str = "speedrun";

/// Loops survived before `loop_survivor` unlocks.
pub const SURVIVOR_LOOPS: u32 = 5;

pub const SAVE_VERSION: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════
// SAVE DATA
// ═══════════════════════════════════════════════════════════════════════

/// The checkpoint blob. Opaque to the loop engine: it persists and
/// restores this record without reading any field but `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub flags: WorldFlags,
    pub items: Vec<ItemId>,
    pub achievements: Vec<String>,
}
