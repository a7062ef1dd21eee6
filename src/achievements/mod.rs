//! Achievement collaborator for Everloop.
//!
//! Defines every achievement, listens for fire-and-forget unlock
//! requests, and records new unlocks in the shared `Achievements`
//! resource (persisted in the checkpoint). Requesting an id twice is
//! explicitly fine: the second request is a quiet no-op, mirroring how
//! platform SDKs tolerate repeated unlock calls.

use bevy::prelude::*;

use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// ACHIEVEMENT DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════

/// Static description of a single achievement.
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: ACH_LOOP_DEATH,
        name: "And Again",
        description: "Reach the end of a loop",
    },
    AchievementDef {
        id: ACH_LOOP_SURVIVOR,
        name: "Old Hand",
        description: "Live through five loops",
    },
    AchievementDef {
        id: ACH_WIRE_MASTER,
        name: "Live Wire",
        description: "Repair Rusty's panel",
    },
    AchievementDef {
        id: ACH_GEAR_MASTER,
        name: "Well Oiled",
        description: "Set Cog's machine right",
    },
    AchievementDef {
        id: ACH_TRUE_ENDING,
        name: "Whole Again",
        description: "Heal the seraph",
    },
    AchievementDef {
        id: ACH_SPEEDRUN,
        name: "Before the Bell",
        description: "Heal the seraph within eight minutes of waking",
    },
];

pub fn achievement_def(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|def| def.id == id)
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct AchievementPlugin;

impl Plugin for AchievementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Achievements>()
            .add_systems(Update, handle_unlock_request);
    }
}

/// Records new unlocks; duplicate requests and unknown ids are tolerated
/// without error.
fn handle_unlock_request(
    mut events: EventReader<AchievementUnlockEvent>,
    mut achievements: ResMut<Achievements>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    for ev in events.read() {
        if achievements.is_unlocked(&ev.id) {
            debug!("Achievement '{}' already unlocked; request ignored", ev.id);
            continue;
        }
        let Some(def) = achievement_def(&ev.id) else {
            warn!("Unlock request for unknown achievement '{}'", ev.id);
            continue;
        };
        achievements.unlocked.push(def.id.to_string());
        info!("Achievement unlocked: \"{}\" — {}", def.name, def.description);
        sfx_writer.send(PlaySfxEvent {
            sfx_id: "achievement".to_string(),
        });
    }
}
