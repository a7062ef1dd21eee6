//! Scheduled continuations — "wait N seconds, then do X" without coroutines.
//!
//! Every timed wait in the game (the end-of-loop reload delay, the bypass
//! transition beat, the minigame win fanfare) is a task in one queue,
//! advanced by a single per-frame system. Cancellation is removal from the
//! queue: a task owned by a despawned entity is dropped, never fired
//! against a dead target.

use bevy::prelude::*;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// TASK MODEL
// ═══════════════════════════════════════════════════════════════════════

/// Who a task belongs to, for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOwner {
    Loop,
    Npc(Entity),
    Minigame(MinigameId),
}

/// What happens when a task's delay elapses. Each action is translated
/// into the matching shared event so consumers stay decoupled from the
/// scheduler.
#[derive(Debug, Clone)]
pub enum TaskAction {
    ReloadScene,
    ForcePostMinigame(Entity),
    FinishMinigame(MinigameId),
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    remaining: f32,
    owner: TaskOwner,
    action: TaskAction,
}

#[derive(Resource, Debug, Default)]
pub struct ScheduledTasks {
    tasks: Vec<ScheduledTask>,
}

impl ScheduledTasks {
    pub fn schedule(&mut self, after_secs: f32, owner: TaskOwner, action: TaskAction) {
        self.tasks.push(ScheduledTask {
            remaining: after_secs.max(0.0),
            owner,
            action,
        });
    }

    /// Cancel every pending task belonging to `owner`.
    pub fn cancel_owner(&mut self, owner: TaskOwner) {
        self.tasks.retain(|t| t.owner != owner);
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SchedPlugin;

impl Plugin for SchedPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScheduledTasks>().add_systems(
            Update,
            tick_scheduled_tasks.run_if(in_gameplay),
        );
    }
}

/// Advances all pending tasks by the frame delta and fires the ones that
/// reached zero. Entity-owned tasks whose entity is gone are dropped
/// silently — the scene may have torn the owner down mid-wait.
pub fn tick_scheduled_tasks(
    time: Res<Time>,
    mut tasks: ResMut<ScheduledTasks>,
    live_entities: Query<Entity>,
    mut reload_writer: EventWriter<SceneReloadEvent>,
    mut force_post_writer: EventWriter<ForcePostMinigameEvent>,
    mut finished_writer: EventWriter<MinigameFinishedEvent>,
) {
    let dt = time.delta_secs();
    let mut due = Vec::new();

    tasks.tasks.retain_mut(|task| {
        task.remaining -= dt;
        if task.remaining > 0.0 {
            return true;
        }
        if let TaskOwner::Npc(entity) = task.owner {
            if !live_entities.contains(entity) {
                debug!("Scheduled task for despawned entity {entity:?} dropped");
                return false;
            }
        }
        due.push(task.action.clone());
        false
    });

    for action in due {
        match action {
            TaskAction::ReloadScene => {
                reload_writer.send(SceneReloadEvent);
            }
            TaskAction::ForcePostMinigame(npc) => {
                force_post_writer.send(ForcePostMinigameEvent { npc });
            }
            TaskAction::FinishMinigame(minigame) => {
                finished_writer.send(MinigameFinishedEvent { minigame });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_cancel_owner() {
        let mut tasks = ScheduledTasks::default();
        tasks.schedule(1.0, TaskOwner::Loop, TaskAction::ReloadScene);
        tasks.schedule(
            2.0,
            TaskOwner::Minigame(MinigameId::Wires),
            TaskAction::FinishMinigame(MinigameId::Wires),
        );
        assert_eq!(tasks.pending(), 2);

        tasks.cancel_owner(TaskOwner::Loop);
        assert_eq!(tasks.pending(), 1);

        tasks.cancel_owner(TaskOwner::Minigame(MinigameId::Wires));
        assert_eq!(tasks.pending(), 0);
    }

    #[test]
    fn test_negative_delay_clamps_to_zero() {
        let mut tasks = ScheduledTasks::default();
        tasks.schedule(-5.0, TaskOwner::Loop, TaskAction::ReloadScene);
        assert_eq!(tasks.pending(), 1);
        assert!(tasks.tasks[0].remaining == 0.0);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut tasks = ScheduledTasks::default();
        tasks.schedule(1.0, TaskOwner::Loop, TaskAction::ReloadScene);
        tasks.schedule(1.0, TaskOwner::Loop, TaskAction::ReloadScene);
        tasks.clear();
        assert_eq!(tasks.pending(), 0);
    }
}
