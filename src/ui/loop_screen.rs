//! End-of-loop screen, shown while the reload delay runs, and the pause
//! overlay.

use bevy::prelude::*;

use crate::shared::*;

#[derive(Component)]
pub struct LoopScreenRoot;

#[derive(Component)]
pub struct PauseOverlayRoot;

pub fn spawn_loop_screen(mut commands: Commands, flags: Res<WorldFlags>) {
    commands
        .spawn((
            LoopScreenRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(10.0),
                ..default()
            },
            BackgroundColor(Color::srgb(0.02, 0.02, 0.04)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("THE DUSK RESETS"),
                TextFont {
                    font_size: 40.0,
                    ..default()
                },
                TextColor(Color::srgb(0.9, 0.3, 0.3)),
            ));
            parent.spawn((
                Text::new(format!("Loop {}", flags.loop_count)),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::srgb(0.6, 0.6, 0.6)),
            ));
        });
}

pub fn despawn_loop_screen(mut commands: Commands, query: Query<Entity, With<LoopScreenRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

/// Surfaces a failed checkpoint write on the end screen, so lost progress
/// is never silent.
pub fn show_save_failures(
    mut events: EventReader<SaveCompleteEvent>,
    mut commands: Commands,
    screen: Query<Entity, With<LoopScreenRoot>>,
) {
    for ev in events.read() {
        if ev.success {
            continue;
        }
        let message = ev
            .error_message
            .clone()
            .unwrap_or_else(|| "unknown error".to_string());
        if let Ok(root) = screen.get_single() {
            commands.entity(root).with_children(|parent| {
                parent.spawn((
                    Text::new(format!("! progress not saved: {message}")),
                    TextFont {
                        font_size: 14.0,
                        ..default()
                    },
                    TextColor(Color::srgb(0.95, 0.6, 0.2)),
                ));
            });
        }
    }
}

pub fn spawn_pause_overlay(mut commands: Commands) {
    commands
        .spawn((
            PauseOverlayRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("PAUSED — [Esc] resume"),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

pub fn despawn_pause_overlay(
    mut commands: Commands,
    query: Query<Entity, With<PauseOverlayRoot>>,
) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}
