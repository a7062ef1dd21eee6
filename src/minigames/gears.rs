//! Gear-matching minigame state.
//!
//! Each gear cycles through its available sizes on interaction and locks
//! once it lands on the correct one. The board wins when every gear is
//! locked, idempotently. Starting sizes are randomized away from the
//! solution so a fresh board is never pre-solved.

use bevy::prelude::*;
use rand::Rng;

use crate::shared::*;

use super::ActiveMinigame;

// ═══════════════════════════════════════════════════════════════════════
// BOARD
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
pub struct GearSpec {
    pub sizes: usize,
    pub correct_index: usize,
}

#[derive(Debug, Clone)]
pub struct GearSlot {
    pub sizes: usize,
    pub current: usize,
    pub correct_index: usize,
    pub complete: bool,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct GearBoard {
    pub gears: Vec<GearSlot>,
    pub won: bool,
}

impl GearBoard {
    /// Builds a board with explicit starting sizes (tests, save restore).
    /// A start index outside the gear's range falls back to zero.
    pub fn with_starts(specs: &[GearSpec], starts: &[usize]) -> Self {
        let gears = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                // A gear needs at least one size; clamp degenerate config.
                let sizes = spec.sizes.max(1);
                let start = starts.get(i).copied().unwrap_or(0);
                let current = if start < sizes { start } else { 0 };
                GearSlot {
                    sizes,
                    current,
                    correct_index: spec.correct_index.min(sizes - 1),
                    complete: false,
                }
            })
            .collect();
        Self { gears, won: false }
    }

    /// Builds a board with randomized starting sizes, never the correct
    /// one.
    pub fn new(specs: &[GearSpec]) -> Self {
        let mut rng = rand::thread_rng();
        let starts: Vec<usize> = specs
            .iter()
            .map(|spec| {
                if spec.sizes <= 1 {
                    return 0;
                }
                // Uniform over the non-correct indices.
                let roll = rng.gen_range(0..spec.sizes - 1);
                if roll >= spec.correct_index {
                    roll + 1
                } else {
                    roll
                }
            })
            .collect();
        Self::with_starts(specs, &starts)
    }

    /// Cycles a gear to its next size. Returns whether that gear just
    /// locked complete, or None when the gear is unknown, already locked,
    /// or the board is won.
    pub fn cycle(&mut self, gear_index: usize) -> Option<bool> {
        if self.won {
            return None;
        }
        let gear = self.gears.get_mut(gear_index)?;
        if gear.complete {
            return None;
        }
        gear.current = (gear.current + 1) % gear.sizes;
        if gear.current == gear.correct_index {
            gear.complete = true;
            return Some(true);
        }
        Some(false)
    }

    pub fn complete_count(&self) -> usize {
        self.gears.iter().filter(|g| g.complete).count()
    }

    /// Latches the win when every gear is locked. Returns true only on
    /// the transition into the won state.
    pub fn check_win(&mut self) -> bool {
        if self.won {
            return false;
        }
        if !self.gears.is_empty() && self.complete_count() == self.gears.len() {
            self.won = true;
            return true;
        }
        false
    }

    /// Snaps every gear to its correct size and latches the win (a board
    /// already solved in a previous loop).
    pub fn force_complete(&mut self) {
        for gear in self.gears.iter_mut() {
            gear.current = gear.correct_index;
            gear.complete = true;
        }
        self.won = true;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

pub fn handle_cycle_gear(
    mut events: EventReader<CycleGearEvent>,
    active: Res<ActiveMinigame>,
    mut board: ResMut<GearBoard>,
    mut flags: ResMut<WorldFlags>,
    mut won_writer: EventWriter<MinigameWonEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    for ev in events.read() {
        if active.0 != Some(MinigameId::Gears) {
            continue;
        }
        match board.cycle(ev.gear_index) {
            Some(locked) => {
                sfx_writer.send(PlaySfxEvent {
                    sfx_id: "gear_click".to_string(),
                });
                if locked && board.check_win() {
                    info!("Gear game won: all {} gears locked", board.gears.len());
                    flags.gear_game_won = true;
                    won_writer.send(MinigameWonEvent {
                        minigame: MinigameId::Gears,
                    });
                }
            }
            None => {
                if !board.won && board.gears.get(ev.gear_index).is_none() {
                    warn!("Cycle on unknown gear {}; ignored", ev.gear_index);
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════
