mod shared;
mod sched;
mod timers;
mod save;
mod loops;
mod dialogue;
mod npcs;
mod minigames;
mod audio;
mod achievements;
mod scene;
mod data;
mod ui;

use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};

use shared::*;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Everloop".into(),
                        resolution: WindowResolution::new(SCREEN_WIDTH, SCREEN_HEIGHT),
                        present_mode: PresentMode::AutoVsync,
                        resizable: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )
        // Game state
        .init_state::<GameState>()
        // Shared resources
        .init_resource::<WorldFlags>()
        .init_resource::<Inventory>()
        // Events
        .add_event::<TimerFinishedEvent>()
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
        .add_event::<AchievementUnlockEvent>()
        // Domain plugins
        .add_plugins(sched::SchedPlugin)
        .add_plugins(timers::TimersPlugin)
        .add_plugins(save::SavePlugin)
        .add_plugins(loops::LoopPlugin)
        .add_plugins(npcs::NpcPlugin)
        .add_plugins(minigames::MinigamePlugin)
        .add_plugins(audio::AudioPlugin)
        .add_plugins(achievements::AchievementPlugin)
        .add_plugins(scene::ScenePlugin)
        .add_plugins(ui::UiPlugin)
        // Data loading
        .add_plugins(data::DataPlugin)
        // Camera
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
