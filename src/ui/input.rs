//! Keyboard input → game intents. The single place hardware keys become
//! events; everything downstream is key-agnostic.

use bevy::prelude::*;

use crate::minigames::{ActiveMinigame, WIRE_SLOT_LAYOUT};
use crate::shared::*;

/// Which wire slot the Tab key has highlighted.
#[derive(Resource, Debug, Default)]
pub struct SelectedWireSlot(pub usize);

/// Playing state: digits 1-3 talk to the seraph, Rusty, and Cog.
pub fn interact_keys(
    keys: Res<ButtonInput<KeyCode>>,
    npc_query: Query<(Entity, &Npc)>,
    mut interact_writer: EventWriter<NpcInteractEvent>,
) {
    let target = if keys.just_pressed(KeyCode::Digit1) {
        Some(NPC_SERAPH)
    } else if keys.just_pressed(KeyCode::Digit2) {
        Some(NPC_RUSTY)
    } else if keys.just_pressed(KeyCode::Digit3) {
        Some(NPC_COG)
    } else {
        None
    };
    let Some(target) = target else { return };

    if let Some((entity, _)) = npc_query.iter().find(|(_, npc)| npc.id == target) {
        interact_writer.send(NpcInteractEvent { entity });
    }
}

/// Dialogue state: digits pick the matching response option.
pub fn dialogue_response_keys(
    keys: Res<ButtonInput<KeyCode>>,
    mut advance_writer: EventWriter<DialogueAdvanceEvent>,
) {
    for (index, key) in [
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
    ]
    .into_iter()
    .enumerate()
    {
        if keys.just_pressed(key) {
            advance_writer.send(DialogueAdvanceEvent {
                response_index: index,
            });
        }
    }
}

/// Minigame state: Tab selects a wire slot, digits plug wires (or cycle
/// gears), X unplugs, Escape walks away with the game unfinished.
#[allow(clippy::too_many_arguments)]
pub fn minigame_keys(
    keys: Res<ButtonInput<KeyCode>>,
    active: Res<ActiveMinigame>,
    mut selected: ResMut<SelectedWireSlot>,
    mut connect_writer: EventWriter<ConnectWireEvent>,
    mut disconnect_writer: EventWriter<DisconnectWireEvent>,
    mut cycle_writer: EventWriter<CycleGearEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        next_state.set(GameState::Playing);
        return;
    }

    match active.0 {
        Some(MinigameId::Wires) => {
            if keys.just_pressed(KeyCode::Tab) {
                selected.0 = (selected.0 + 1) % WIRE_SLOT_LAYOUT.len();
            }
            if keys.just_pressed(KeyCode::KeyX) {
                disconnect_writer.send(DisconnectWireEvent {
                    slot_index: selected.0,
                });
            }
            let wire = if keys.just_pressed(KeyCode::Digit1) {
                Some(WireId::One)
            } else if keys.just_pressed(KeyCode::Digit2) {
                Some(WireId::Two)
            } else if keys.just_pressed(KeyCode::Digit3) {
                Some(WireId::Three)
            } else if keys.just_pressed(KeyCode::Digit4) {
                Some(WireId::Four)
            } else {
                None
            };
            if let Some(wire) = wire {
                connect_writer.send(ConnectWireEvent {
                    slot_index: selected.0,
                    wire,
                });
            }
        }
        Some(MinigameId::Gears) => {
            for (index, key) in [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3]
                .into_iter()
                .enumerate()
            {
                if keys.just_pressed(key) {
                    cycle_writer.send(CycleGearEvent { gear_index: index });
                }
            }
        }
        None => {}
    }
}

/// Escape pauses and unpauses.
pub fn pause_keys(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !keys.just_pressed(KeyCode::Escape) {
        return;
    }
    match state.get() {
        GameState::Playing => next_state.set(GameState::Paused),
        GameState::Paused => next_state.set(GameState::Playing),
        _ => {}
    }
}
