//! Main menu — title card, new game, and the continue affordance.

use bevy::prelude::*;

use crate::save::CheckpointAvailable;
use crate::shared::*;

#[derive(Component)]
pub struct MainMenuRoot;

pub fn spawn_main_menu(mut commands: Commands, checkpoint: Res<CheckpointAvailable>) {
    let continue_line = if checkpoint.0 {
        "[C] Continue the dusk"
    } else {
        ""
    };

    commands
        .spawn((
            MainMenuRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(12.0),
                ..default()
            },
            BackgroundColor(Color::srgb(0.05, 0.05, 0.09)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("E V E R L O O P"),
                TextFont {
                    font_size: 48.0,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.85, 0.55)),
            ));
            parent.spawn((
                Text::new("[N] New dusk"),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
            parent.spawn((
                Text::new(continue_line),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::srgb(0.7, 0.7, 0.7)),
            ));
        });
}

pub fn despawn_main_menu(mut commands: Commands, query: Query<Entity, With<MainMenuRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

pub fn main_menu_keys(
    keys: Res<ButtonInput<KeyCode>>,
    checkpoint: Res<CheckpointAvailable>,
    mut new_writer: EventWriter<StartNewGameEvent>,
    mut continue_writer: EventWriter<ContinueGameEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    if keys.just_pressed(KeyCode::KeyN) {
        sfx_writer.send(PlaySfxEvent {
            sfx_id: "menu_select".to_string(),
        });
        new_writer.send(StartNewGameEvent);
    }
    if keys.just_pressed(KeyCode::KeyC) && checkpoint.0 {
        sfx_writer.send(PlaySfxEvent {
            sfx_id: "menu_select".to_string(),
        });
        continue_writer.send(ContinueGameEvent);
    }
}
