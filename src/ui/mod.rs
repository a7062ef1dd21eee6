//! UI domain plugin — menus, the dialogue panel, the end-of-loop screen,
//! and keyboard input. Thin presentation over shared events; no game
//! logic lives here.

mod dialogue_panel;
mod input;
mod loop_screen;
mod main_menu;

use bevy::prelude::*;

use crate::shared::*;

pub use input::SelectedWireSlot;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SelectedWireSlot>();

        // ─── MAIN MENU ───
        app.add_systems(OnEnter(GameState::MainMenu), main_menu::spawn_main_menu)
            .add_systems(OnExit(GameState::MainMenu), main_menu::despawn_main_menu)
            .add_systems(
                Update,
                main_menu::main_menu_keys.run_if(in_state(GameState::MainMenu)),
            );

        // ─── GAMEPLAY KEYS ───
        app.add_systems(
            Update,
            (input::interact_keys, input::pause_keys).run_if(in_state(GameState::Playing)),
        )
        .add_systems(
            Update,
            input::pause_keys.run_if(in_state(GameState::Paused)),
        );

        // ─── DIALOGUE PANEL ───
        app.add_systems(
            OnEnter(GameState::Dialogue),
            dialogue_panel::spawn_dialogue_panel,
        )
        .add_systems(
            OnExit(GameState::Dialogue),
            dialogue_panel::despawn_dialogue_panel,
        )
        .add_systems(
            Update,
            (
                input::dialogue_response_keys,
                dialogue_panel::update_dialogue_panel,
            )
                .run_if(in_state(GameState::Dialogue)),
        );

        // ─── MINIGAME KEYS ───
        app.add_systems(
            Update,
            input::minigame_keys.run_if(in_state(GameState::Minigame)),
        );

        // ─── END-OF-LOOP SCREEN ───
        app.add_systems(OnEnter(GameState::LoopEnd), loop_screen::spawn_loop_screen)
            .add_systems(OnExit(GameState::LoopEnd), loop_screen::despawn_loop_screen)
            .add_systems(
                Update,
                loop_screen::show_save_failures.run_if(in_state(GameState::LoopEnd)),
            );

        // ─── PAUSE OVERLAY ───
        app.add_systems(OnEnter(GameState::Paused), loop_screen::spawn_pause_overlay)
            .add_systems(
                OnExit(GameState::Paused),
                loop_screen::despawn_pause_overlay,
            );
    }
}
