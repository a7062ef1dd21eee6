//! Timer registry — named, restartable countdown timers.
//!
//! Responsible for:
//! - Owning every loop-scoped timer (the day clock, NPC pressure timers)
//! - Advancing running timers by the frame delta
//! - Emitting TimerFinishedEvent at most once per run cycle
//! - Snapshotting running/paused state at loop-end and restoring it after
//!   the scene reload
//!
//! Operating on an unknown timer name is a logged no-op, never fatal: one
//! missing timer must not block a full scene reset.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// TIMER MODEL
// ═══════════════════════════════════════════════════════════════════════

/// A timer is exactly one of stopped, running, or paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerPhase {
    #[default]
    Stopped,
    Running,
    Paused,
}

#[derive(Debug, Clone)]
pub struct LoopTimer {
    pub name: String,
    pub duration: f32,
    pub elapsed: f32,
    pub phase: TimerPhase,
    /// Completion already announced for the current run cycle. Cleared by
    /// reset, never by start.
    fired: bool,
}

impl LoopTimer {
    fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            elapsed: 0.0,
            phase: TimerPhase::Stopped,
            fired: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == TimerPhase::Paused
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }
}

/// Captured running/paused state of one timer at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshotEntry {
    pub name: String,
    pub was_running: bool,
    pub was_paused: bool,
}

/// Ordered capture of the whole registry. Entries whose timer no longer
/// exists at restore time are skipped, not errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub entries: Vec<TimerSnapshotEntry>,
}

// ═══════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Default)]
pub struct TimerRegistry {
    /// Registration order is snapshot order.
    timers: Vec<LoopTimer>,
}

impl TimerRegistry {
    /// Registers a new stopped timer. Re-registering a name replaces the
    /// old timer; the restore pass re-applies state afterwards.
    pub fn register(&mut self, name: &str, duration: f32) {
        if let Some(existing) = self.timers.iter_mut().find(|t| t.name == name) {
            warn!("Timer '{name}' re-registered; replacing previous instance");
            *existing = LoopTimer::new(name, duration);
            return;
        }
        self.timers.push(LoopTimer::new(name, duration));
    }

    pub fn unregister(&mut self, name: &str) {
        let before = self.timers.len();
        self.timers.retain(|t| t.name != name);
        if self.timers.len() == before {
            warn!("Timer '{name}' not registered; unregister ignored");
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.timers.iter().any(|t| t.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&LoopTimer> {
        self.timers.iter().find(|t| t.name == name)
    }

    pub fn start(&mut self, name: &str) {
        match self.timers.iter_mut().find(|t| t.name == name) {
            Some(timer) => timer.phase = TimerPhase::Running,
            None => warn!("Timer '{name}' not registered; start ignored"),
        }
    }

    pub fn pause(&mut self, name: &str) {
        match self.timers.iter_mut().find(|t| t.name == name) {
            Some(timer) => {
                if timer.phase == TimerPhase::Running {
                    timer.phase = TimerPhase::Paused;
                }
            }
            None => warn!("Timer '{name}' not registered; pause ignored"),
        }
    }

    /// Elapsed back to zero, stopped, eligible to fire again.
    pub fn reset(&mut self, name: &str) {
        match self.timers.iter_mut().find(|t| t.name == name) {
            Some(timer) => {
                timer.elapsed = 0.0;
                timer.phase = TimerPhase::Stopped;
                timer.fired = false;
            }
            None => warn!("Timer '{name}' not registered; reset ignored"),
        }
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Captures which timers were running vs paused right now.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            entries: self
                .timers
                .iter()
                .map(|t| TimerSnapshotEntry {
                    name: t.name.clone(),
                    was_running: t.is_running(),
                    was_paused: t.is_paused(),
                })
                .collect(),
        }
    }

    /// Re-applies the captured state, not the current one: a timer that
    /// was mid-flight at loop-end comes back running from zero, a paused
    /// one comes back paused. Snapshot entries with no matching timer are
    /// skipped.
    pub fn restore(&mut self, snapshot: &TimerSnapshot) {
        for entry in &snapshot.entries {
            let Some(timer) = self.timers.iter_mut().find(|t| t.name == entry.name) else {
                debug!("Snapshot entry '{}' has no timer; skipped", entry.name);
                continue;
            };
            timer.elapsed = 0.0;
            timer.fired = false;
            timer.phase = if entry.was_running {
                TimerPhase::Running
            } else if entry.was_paused {
                TimerPhase::Paused
            } else {
                TimerPhase::Stopped
            };
        }
    }

    /// Advances running timers and returns names that just completed.
    pub fn advance(&mut self, dt: f32) -> Vec<String> {
        let mut finished = Vec::new();
        for timer in self.timers.iter_mut() {
            if timer.phase != TimerPhase::Running {
                continue;
            }
            timer.elapsed = (timer.elapsed + dt).min(timer.duration);
            if timer.elapsed >= timer.duration && !timer.fired {
                timer.fired = true;
                timer.phase = TimerPhase::Stopped;
                finished.push(timer.name.clone());
            }
        }
        finished
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════

/// One timer the scene should carry, from the data layer.
#[derive(Debug, Clone)]
pub struct TimerSpec {
    pub name: String,
    pub duration: f32,
    pub autostart: bool,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct TimerConfig {
    pub specs: Vec<TimerSpec>,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct TimersPlugin;

impl Plugin for TimersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TimerRegistry>()
            .init_resource::<TimerConfig>()
            .add_systems(OnEnter(GameState::Playing), ensure_configured_timers)
            .add_systems(
                Update,
                (tick_timers, handle_remove_timer).run_if(in_gameplay),
            );
    }
}

/// Registers any configured timer not already present, on fresh scene
/// entry only. Timers that survived a scene reload (the snapshot restore
/// re-armed them) are left alone, and a mid-loop return from a dialogue
/// or pause never resurrects a removed timer.
fn ensure_configured_timers(
    needs_init: Res<crate::scene::SceneNeedsInit>,
    config: Res<TimerConfig>,
    mut registry: ResMut<TimerRegistry>,
) {
    if !needs_init.0 {
        return;
    }
    for spec in &config.specs {
        if registry.is_registered(&spec.name) {
            continue;
        }
        info!("Registering timer '{}' ({}s)", spec.name, spec.duration);
        registry.register(&spec.name, spec.duration);
        if spec.autostart {
            registry.start(&spec.name);
        }
    }
}

fn tick_timers(
    time: Res<Time>,
    mut registry: ResMut<TimerRegistry>,
    mut finished_writer: EventWriter<TimerFinishedEvent>,
) {
    for name in registry.advance(time.delta_secs()) {
        info!("Timer '{name}' finished");
        finished_writer.send(TimerFinishedEvent { name });
    }
}

fn handle_remove_timer(
    mut events: EventReader<RemoveTimerEvent>,
    mut registry: ResMut<TimerRegistry>,
) {
    for ev in events.read() {
        info!("Removing timer '{}'", ev.name);
        registry.unregister(&ev.name);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[(&str, f32)]) -> TimerRegistry {
        let mut reg = TimerRegistry::default();
        for (name, duration) in names {
            reg.register(name, *duration);
        }
        reg
    }

    #[test]
    fn test_registered_timer_starts_stopped() {
        let reg = registry_with(&[("day", 10.0)]);
        let timer = reg.get("day").unwrap();
        assert_eq!(timer.phase, TimerPhase::Stopped);
        assert_eq!(timer.elapsed, 0.0);
    }

    #[test]
    fn test_advance_only_moves_running_timers() {
        let mut reg = registry_with(&[("a", 10.0), ("b", 10.0)]);
        reg.start("a");
        reg.advance(1.0);
        assert_eq!(reg.get("a").unwrap().elapsed, 1.0);
        assert_eq!(reg.get("b").unwrap().elapsed, 0.0);
    }

    #[test]
    fn test_elapsed_never_exceeds_duration() {
        let mut reg = registry_with(&[("a", 2.0)]);
        reg.start("a");
        reg.advance(100.0);
        assert_eq!(reg.get("a").unwrap().elapsed, 2.0);
    }

    #[test]
    fn test_completion_fires_once_per_run_cycle() {
        let mut reg = registry_with(&[("a", 1.0)]);
        reg.start("a");
        assert_eq!(reg.advance(2.0), vec!["a".to_string()]);
        // Restarting without a reset must not re-fire.
        reg.start("a");
        assert!(reg.advance(2.0).is_empty());
        // Reset opens a new run cycle.
        reg.reset("a");
        reg.start("a");
        assert_eq!(reg.advance(2.0), vec!["a".to_string()]);
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut reg = registry_with(&[("a", 10.0)]);
        reg.start("a");
        reg.advance(3.0);
        reg.pause("a");
        reg.advance(3.0);
        let timer = reg.get("a").unwrap();
        assert_eq!(timer.elapsed, 3.0);
        assert!(timer.is_paused());
    }

    #[test]
    fn test_pause_on_stopped_timer_is_noop() {
        let mut reg = registry_with(&[("a", 10.0)]);
        reg.pause("a");
        assert_eq!(reg.get("a").unwrap().phase, TimerPhase::Stopped);
    }

    #[test]
    fn test_operations_on_unknown_name_do_not_panic() {
        let mut reg = TimerRegistry::default();
        reg.start("ghost");
        reg.pause("ghost");
        reg.reset("ghost");
        reg.unregister("ghost");
        assert!(reg.snapshot().entries.is_empty());
    }

    #[test]
    fn test_restore_running_timer_resumes_from_zero() {
        let mut reg = registry_with(&[("day", 10.0)]);
        reg.start("day");
        reg.advance(7.0);

        let snap = reg.snapshot();
        reg.restore(&snap);

        let timer = reg.get("day").unwrap();
        assert!(timer.is_running(), "was-running timer restores to running");
        assert_eq!(timer.elapsed, 0.0, "restored timer counts from zero");
    }

    #[test]
    fn test_restore_paused_timer_stays_paused() {
        let mut reg = registry_with(&[("patience", 10.0)]);
        reg.start("patience");
        reg.advance(2.0);
        reg.pause("patience");

        let snap = reg.snapshot();
        reg.restore(&snap);

        let timer = reg.get("patience").unwrap();
        assert!(timer.is_paused(), "was-paused timer restores to paused");
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed, 0.0);
    }

    #[test]
    fn test_restore_ignores_missing_timers() {
        let mut reg = registry_with(&[("a", 5.0), ("b", 5.0)]);
        reg.start("a");
        let snap = reg.snapshot();

        reg.unregister("b");
        reg.restore(&snap);

        assert!(reg.get("a").unwrap().is_running());
        assert!(reg.get("b").is_none());
    }

    #[test]
    fn test_snapshot_preserves_registration_order() {
        let reg = registry_with(&[("first", 1.0), ("second", 1.0), ("third", 1.0)]);
        let names: Vec<_> = reg.snapshot().entries.iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_reregister_replaces_timer() {
        let mut reg = registry_with(&[("a", 5.0)]);
        reg.start("a");
        reg.advance(2.0);
        reg.register("a", 9.0);
        let timer = reg.get("a").unwrap();
        assert_eq!(timer.duration, 9.0);
        assert_eq!(timer.elapsed, 0.0);
        assert_eq!(timer.phase, TimerPhase::Stopped);
    }
}
