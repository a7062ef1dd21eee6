//! NPC domain — interaction, dialogue sessions, and the per-NPC state
//! machine.
//!
//! Each NPC is `DefaultIdle`, `MinigameReady`, `PlayingMinigame`, or
//! `PostMinigame`. Transitions are total: a signal with no edge from the
//! current state is a no-op, so a stray minigame-completion event can
//! never yank an idle NPC forward. Variant-specific logic (the seraph's
//! remedy bypass, alternate greetings) lives behind the `NpcBehavior`
//! capability set in `behavior`.

pub mod behavior;

use bevy::prelude::*;
use std::collections::HashMap;

use crate::dialogue::DialogueRegistry;
use crate::sched::{ScheduledTasks, TaskAction, TaskOwner};
use crate::shared::*;
use crate::timers::TimerRegistry;

use behavior::{behavior_for, BehaviorCtx, NpcEffect, ResponseOutcome};

// ═══════════════════════════════════════════════════════════════════════
// DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════

/// Static description of one NPC, populated by the data layer.
#[derive(Debug, Clone)]
pub struct NpcDef {
    pub id: NpcId,
    pub name: String,
    pub variant: NpcVariant,
    /// The minigame this NPC hosts, if any.
    pub minigame: Option<MinigameId>,
    /// Item required before the NPC will offer its minigame.
    pub required_item: Option<ItemId>,
    /// Item that skips straight to PostMinigame (the seraph's remedy).
    pub bypass_item: Option<ItemId>,
    /// Pressure timer removed when this NPC reaches PostMinigame.
    pub pressure_timer: Option<String>,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct NpcRegistry {
    pub npcs: HashMap<NpcId, NpcDef>,
}

impl NpcRegistry {
    pub fn get(&self, id: &str) -> Option<&NpcDef> {
        self.npcs.get(id)
    }
}

/// Per-instance interaction state. Owned exclusively by one NPC entity.
#[derive(Component, Debug, Clone, Default)]
pub struct NpcStateMachine {
    pub state: NpcState,
}

/// The open dialogue, if any. Inserted when an interaction starts and
/// removed when the dialogue closes.
#[derive(Resource, Debug, Clone)]
pub struct DialogueSession {
    pub npc: Entity,
    pub npc_id: NpcId,
    pub node: usize,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct NpcPlugin;

impl Plugin for NpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NpcRegistry>()
            .add_systems(OnEnter(GameState::Playing), spawn_npcs)
            .add_systems(
                Update,
                handle_npc_interaction.run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                handle_dialogue_advance.run_if(in_state(GameState::Dialogue)),
            )
            .add_systems(
                Update,
                (
                    handle_minigame_won,
                    handle_force_post_minigame,
                    handle_item_pickup,
                )
                    .run_if(in_gameplay),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════

/// Where an NPC starts a fresh scene, given what already survived the
/// loop. A healed seraph or a repaired machine stays repaired.
pub fn initial_npc_state(def: &NpcDef, flags: &WorldFlags) -> NpcState {
    let hub_healed = def.variant == NpcVariant::Seraph && flags.seraph_healed;
    let minigame_done = def
        .minigame
        .map(|m| flags.minigame_won(m))
        .unwrap_or(false);
    if hub_healed || minigame_done {
        NpcState::PostMinigame
    } else {
        NpcState::DefaultIdle
    }
}

/// DefaultIdle → MinigameReady precondition.
pub fn minigame_ready(def: &NpcDef, inventory: &Inventory) -> bool {
    if def.minigame.is_none() {
        return false;
    }
    def.required_item
        .as_deref()
        .map(|item| inventory.has(item))
        .unwrap_or(true)
}

/// Applies a state transition plus its behavior hook effects. A
/// transition to the state the NPC is already in is a no-op.
#[allow(clippy::too_many_arguments)]
fn enter_state(
    sm: &mut NpcStateMachine,
    new_state: NpcState,
    ctx: &BehaviorCtx,
    flags: &mut WorldFlags,
    remove_timer_writer: &mut EventWriter<RemoveTimerEvent>,
    ach_writer: &mut EventWriter<AchievementUnlockEvent>,
    sfx_writer: &mut EventWriter<PlaySfxEvent>,
) {
    if sm.state == new_state {
        return;
    }
    info!("NPC '{}': {:?} -> {:?}", ctx.def.id, sm.state, new_state);
    sm.state = new_state;

    if new_state == NpcState::PostMinigame && ctx.def.variant == NpcVariant::Seraph {
        flags.seraph_healed = true;
    }

    for effect in behavior_for(ctx.def.variant).on_enter_state(new_state, ctx) {
        match effect {
            NpcEffect::RemoveTimer(name) => {
                remove_timer_writer.send(RemoveTimerEvent { name });
            }
            NpcEffect::Unlock(id) => {
                ach_writer.send(AchievementUnlockEvent { id });
            }
            NpcEffect::Sfx(sfx_id) => {
                sfx_writer.send(PlaySfxEvent { sfx_id });
            }
        }
    }
}

fn day_elapsed(timers: &TimerRegistry) -> f32 {
    timers.get(TIMER_DAY).map(|t| t.elapsed).unwrap_or(0.0)
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Spawns the cast for a fresh scene instance. Skipped when NPCs already
/// exist (the state was merely toggled, not reloaded).
fn spawn_npcs(
    mut commands: Commands,
    registry: Res<NpcRegistry>,
    flags: Res<WorldFlags>,
    existing: Query<Entity, With<Npc>>,
    mut remove_timer_writer: EventWriter<RemoveTimerEvent>,
) {
    if !existing.is_empty() {
        return;
    }
    for def in registry.npcs.values() {
        let state = initial_npc_state(def, &flags);
        info!("Spawning NPC '{}' in {:?}", def.id, state);
        // An NPC that already made it past its minigame keeps its pressure
        // timer off, even though the scene re-registers configured timers.
        if state == NpcState::PostMinigame {
            if let Some(timer) = &def.pressure_timer {
                remove_timer_writer.send(RemoveTimerEvent {
                    name: timer.clone(),
                });
            }
        }
        commands.spawn((
            Npc {
                id: def.id.clone(),
                variant: def.variant,
            },
            NpcStateMachine { state },
            LoopScoped,
            Name::new(def.name.clone()),
        ));
    }
}

/// Player talks to an NPC: run the idle precondition check, then open a
/// dialogue session on the tree for the NPC's (possibly new) state.
#[allow(clippy::too_many_arguments)]
fn handle_npc_interaction(
    mut commands: Commands,
    mut events: EventReader<NpcInteractEvent>,
    mut npc_query: Query<(&Npc, &mut NpcStateMachine)>,
    registry: Res<NpcRegistry>,
    dialogue_registry: Res<DialogueRegistry>,
    inventory: Res<Inventory>,
    mut flags: ResMut<WorldFlags>,
    timers: Res<TimerRegistry>,
    mut start_writer: EventWriter<DialogueStartEvent>,
    mut remove_timer_writer: EventWriter<RemoveTimerEvent>,
    mut ach_writer: EventWriter<AchievementUnlockEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for ev in events.read() {
        let Ok((npc, mut sm)) = npc_query.get_mut(ev.entity) else {
            warn!("Interaction with a non-NPC entity ignored");
            continue;
        };
        let Some(def) = registry.get(&npc.id) else {
            warn!("NPC '{}' has no definition; interaction ignored", npc.id);
            continue;
        };

        if sm.state == NpcState::DefaultIdle && minigame_ready(def, &inventory) {
            let flags_view = flags.clone();
            let ctx = BehaviorCtx {
                def,
                flags: &flags_view,
                inventory: &inventory,
                state: sm.state,
                day_elapsed: day_elapsed(&timers),
            };
            enter_state(
                &mut sm,
                NpcState::MinigameReady,
                &ctx,
                &mut flags,
                &mut remove_timer_writer,
                &mut ach_writer,
                &mut sfx_writer,
            );
        }

        if dialogue_registry.graph_for(&npc.id, sm.state).is_none() {
            warn!("NPC '{}' has no dialogue authored; interaction ignored", npc.id);
            continue;
        }

        commands.insert_resource(DialogueSession {
            npc: ev.entity,
            npc_id: npc.id.clone(),
            node: 0,
        });
        start_writer.send(DialogueStartEvent {
            npc_id: npc.id.clone(),
        });
        sfx_writer.send(PlaySfxEvent {
            sfx_id: "dialogue_blip".to_string(),
        });
        next_state.set(GameState::Dialogue);
    }
}

/// Player picked a response in the open dialogue. Resolution dispatches
/// through the NPC's behavior variant; closing the dialogue from
/// MinigameReady drops straight into the minigame.
#[allow(clippy::too_many_arguments)]
fn handle_dialogue_advance(
    mut commands: Commands,
    mut events: EventReader<DialogueAdvanceEvent>,
    session: Option<ResMut<DialogueSession>>,
    mut npc_query: Query<(&Npc, &mut NpcStateMachine)>,
    registry: Res<NpcRegistry>,
    dialogue_registry: Res<DialogueRegistry>,
    inventory: Res<Inventory>,
    mut flags: ResMut<WorldFlags>,
    timers: Res<TimerRegistry>,
    mut tasks: ResMut<ScheduledTasks>,
    mut end_writer: EventWriter<DialogueEndEvent>,
    mut mg_start_writer: EventWriter<MinigameStartEvent>,
    mut remove_timer_writer: EventWriter<RemoveTimerEvent>,
    mut ach_writer: EventWriter<AchievementUnlockEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let Some(mut session) = session else {
        events.clear();
        return;
    };

    for ev in events.read() {
        let Ok((npc, mut sm)) = npc_query.get_mut(session.npc) else {
            warn!("Dialogue target despawned mid-conversation; closing");
            commands.remove_resource::<DialogueSession>();
            end_writer.send(DialogueEndEvent);
            next_state.set(GameState::Playing);
            break;
        };
        let Some(def) = registry.get(&npc.id) else {
            warn!("NPC '{}' lost its definition; closing dialogue", npc.id);
            commands.remove_resource::<DialogueSession>();
            end_writer.send(DialogueEndEvent);
            next_state.set(GameState::Playing);
            break;
        };
        let Some(node) = dialogue_registry
            .graph_for(&npc.id, sm.state)
            .and_then(|graph| graph.node(session.node))
        else {
            warn!(
                "Dialogue node {} missing for '{}'; closing",
                session.node, npc.id
            );
            commands.remove_resource::<DialogueSession>();
            end_writer.send(DialogueEndEvent);
            next_state.set(GameState::Playing);
            break;
        };
        let Some(resp) = node.responses.get(ev.response_index) else {
            warn!(
                "Response index {} out of range for node {}; ignored",
                ev.response_index, session.node
            );
            continue;
        };

        let flags_view = flags.clone();
        let ctx = BehaviorCtx {
            def,
            flags: &flags_view,
            inventory: &inventory,
            state: sm.state,
            day_elapsed: day_elapsed(&timers),
        };

        match behavior_for(def.variant).resolve_response(resp, &ctx) {
            ResponseOutcome::Goto(index) => {
                session.node = index;
                sfx_writer.send(PlaySfxEvent {
                    sfx_id: "dialogue_blip".to_string(),
                });
            }
            ResponseOutcome::End => {
                commands.remove_resource::<DialogueSession>();
                end_writer.send(DialogueEndEvent);

                let start_game = match (sm.state, def.minigame) {
                    (NpcState::MinigameReady, Some(minigame)) => {
                        enter_state(
                            &mut sm,
                            NpcState::PlayingMinigame,
                            &ctx,
                            &mut flags,
                            &mut remove_timer_writer,
                            &mut ach_writer,
                            &mut sfx_writer,
                        );
                        Some(minigame)
                    }
                    // Re-entering an unfinished game after a pep talk.
                    (NpcState::PlayingMinigame, Some(minigame))
                        if !flags.minigame_won(minigame) =>
                    {
                        Some(minigame)
                    }
                    _ => None,
                };

                if let Some(minigame) = start_game {
                    mg_start_writer.send(MinigameStartEvent { minigame });
                    next_state.set(GameState::Minigame);
                } else {
                    next_state.set(GameState::Playing);
                }
                break;
            }
            ResponseOutcome::Bypass => {
                info!(
                    "Bypass item ends the '{}' dialogue; forced transition scheduled",
                    npc.id
                );
                tasks.schedule(
                    BYPASS_TRANSITION_DELAY_SECS,
                    TaskOwner::Npc(session.npc),
                    TaskAction::ForcePostMinigame(session.npc),
                );
                sfx_writer.send(PlaySfxEvent {
                    sfx_id: "remedy".to_string(),
                });
                commands.remove_resource::<DialogueSession>();
                end_writer.send(DialogueEndEvent);
                next_state.set(GameState::Playing);
                break;
            }
        }
    }
}

/// A minigame reported completion. Only NPCs actually mid-game move to
/// PostMinigame; an idle NPC hosting the same game is untouched.
#[allow(clippy::too_many_arguments)]
fn handle_minigame_won(
    mut events: EventReader<MinigameWonEvent>,
    mut npc_query: Query<(&Npc, &mut NpcStateMachine)>,
    registry: Res<NpcRegistry>,
    inventory: Res<Inventory>,
    mut flags: ResMut<WorldFlags>,
    timers: Res<TimerRegistry>,
    mut remove_timer_writer: EventWriter<RemoveTimerEvent>,
    mut ach_writer: EventWriter<AchievementUnlockEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    for ev in events.read() {
        for (npc, mut sm) in npc_query.iter_mut() {
            let Some(def) = registry.get(&npc.id) else {
                continue;
            };
            if def.minigame != Some(ev.minigame) {
                continue;
            }
            if sm.state != NpcState::PlayingMinigame {
                debug!(
                    "'{}' hears {:?} completion in {:?}; no transition",
                    npc.id, ev.minigame, sm.state
                );
                continue;
            }
            let flags_view = flags.clone();
            let ctx = BehaviorCtx {
                def,
                flags: &flags_view,
                inventory: &inventory,
                state: sm.state,
                day_elapsed: day_elapsed(&timers),
            };
            enter_state(
                &mut sm,
                NpcState::PostMinigame,
                &ctx,
                &mut flags,
                &mut remove_timer_writer,
                &mut ach_writer,
                &mut sfx_writer,
            );
        }
    }
}

/// The scheduled bypass continuation landed: force the NPC into
/// PostMinigame unless something already got it there.
#[allow(clippy::too_many_arguments)]
fn handle_force_post_minigame(
    mut events: EventReader<ForcePostMinigameEvent>,
    mut npc_query: Query<(&Npc, &mut NpcStateMachine)>,
    registry: Res<NpcRegistry>,
    inventory: Res<Inventory>,
    mut flags: ResMut<WorldFlags>,
    timers: Res<TimerRegistry>,
    mut remove_timer_writer: EventWriter<RemoveTimerEvent>,
    mut ach_writer: EventWriter<AchievementUnlockEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    for ev in events.read() {
        let Ok((npc, mut sm)) = npc_query.get_mut(ev.npc) else {
            warn!("Forced transition target despawned; dropped");
            continue;
        };
        let Some(def) = registry.get(&npc.id) else {
            continue;
        };
        if sm.state == NpcState::PostMinigame {
            continue;
        }
        let flags_view = flags.clone();
        let ctx = BehaviorCtx {
            def,
            flags: &flags_view,
            inventory: &inventory,
            state: sm.state,
            day_elapsed: day_elapsed(&timers),
        };
        enter_state(
            &mut sm,
            NpcState::PostMinigame,
            &ctx,
            &mut flags,
            &mut remove_timer_writer,
            &mut ach_writer,
            &mut sfx_writer,
        );
    }
}

fn handle_item_pickup(
    mut events: EventReader<ItemPickupEvent>,
    mut inventory: ResMut<Inventory>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    for ev in events.read() {
        if inventory.add(&ev.item_id) {
            info!("Picked up '{}'", ev.item_id);
            sfx_writer.send(PlaySfxEvent {
                sfx_id: "pickup".to_string(),
            });
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════
