//! Dialogue panel — renders the open session's node text and responses.
//!
//! Rebuilt whenever the session moves to a new node. Variant selection
//! goes through the NPC's behavior so the panel always shows the same
//! text the state machine reasoned about.

use bevy::prelude::*;

use crate::dialogue::DialogueRegistry;
use crate::npcs::behavior::{behavior_for, BehaviorCtx};
use crate::npcs::{DialogueSession, NpcRegistry, NpcStateMachine};
use crate::shared::*;
use crate::timers::TimerRegistry;

#[derive(Component)]
pub struct DialoguePanelRoot;

#[derive(Component)]
pub struct DialogueNpcName;

#[derive(Component)]
pub struct DialogueText;

#[derive(Component)]
pub struct DialogueResponses;

pub fn spawn_dialogue_panel(mut commands: Commands) {
    commands
        .spawn((
            DialoguePanelRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::FlexEnd,
                align_items: AlignItems::Center,
                flex_direction: FlexDirection::Column,
                padding: UiRect::bottom(Val::Px(20.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.3)),
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Node {
                        width: Val::Px(700.0),
                        flex_direction: FlexDirection::Column,
                        padding: UiRect::all(Val::Px(16.0)),
                        row_gap: Val::Px(8.0),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.08, 0.08, 0.12, 0.95)),
                ))
                .with_children(|panel| {
                    panel.spawn((
                        DialogueNpcName,
                        Text::new(""),
                        TextFont {
                            font_size: 18.0,
                            ..default()
                        },
                        TextColor(Color::srgb(1.0, 0.9, 0.6)),
                    ));
                    panel.spawn((
                        DialogueText,
                        Text::new(""),
                        TextFont {
                            font_size: 16.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                    panel.spawn((
                        DialogueResponses,
                        Text::new(""),
                        TextFont {
                            font_size: 14.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.6, 0.7, 0.9)),
                    ));
                });
        });
}

pub fn despawn_dialogue_panel(
    mut commands: Commands,
    query: Query<Entity, With<DialoguePanelRoot>>,
) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

/// Repaints the panel from the live session every frame; cheap at this
/// scale and always in sync with the state machine.
#[allow(clippy::too_many_arguments)]
pub fn update_dialogue_panel(
    session: Option<Res<DialogueSession>>,
    npc_query: Query<(&Npc, &NpcStateMachine)>,
    registry: Res<NpcRegistry>,
    dialogue_registry: Res<DialogueRegistry>,
    flags: Res<WorldFlags>,
    inventory: Res<Inventory>,
    timers: Res<TimerRegistry>,
    mut name_query: Query<&mut Text, With<DialogueNpcName>>,
    mut text_query: Query<&mut Text, (With<DialogueText>, Without<DialogueNpcName>)>,
    mut resp_query: Query<
        &mut Text,
        (
            With<DialogueResponses>,
            Without<DialogueText>,
            Without<DialogueNpcName>,
        ),
    >,
) {
    let Some(session) = session else { return };
    let Ok((npc, sm)) = npc_query.get(session.npc) else {
        return;
    };
    let Some(def) = registry.get(&npc.id) else {
        return;
    };
    let Some(node) = dialogue_registry
        .graph_for(&npc.id, sm.state)
        .and_then(|graph| graph.node(session.node))
    else {
        return;
    };

    let ctx = BehaviorCtx {
        def,
        flags: &flags,
        inventory: &inventory,
        state: sm.state,
        day_elapsed: timers.get(TIMER_DAY).map(|t| t.elapsed).unwrap_or(0.0),
    };
    let variant = behavior_for(def.variant)
        .select_variant(node, &ctx)
        .min(node.variants.len().saturating_sub(1));
    let line = node
        .variants
        .get(variant)
        .cloned()
        .unwrap_or_else(|| "...".to_string());

    let responses = node
        .responses
        .iter()
        .enumerate()
        .map(|(i, resp)| format!("[{}] {}", i + 1, resp.text))
        .collect::<Vec<_>>()
        .join("\n");

    for mut text in &mut name_query {
        **text = def.name.clone();
    }
    for mut text in &mut text_query {
        **text = line.clone();
    }
    for mut text in &mut resp_query {
        **text = responses.clone();
    }
}
