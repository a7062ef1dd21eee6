//! Wire-matching minigame state.
//!
//! Four slots, each expecting one wire id. Connecting a wire evaluates
//! that slot immediately; disconnecting always clears the slot's
//! correctness before any recount, so the global count can never go stale.
//! The board wins once the correct count reaches the threshold and then
//! stops accepting changes — the win signal fires exactly once.

use bevy::prelude::*;

use crate::shared::*;

use super::ActiveMinigame;

// ═══════════════════════════════════════════════════════════════════════
// BOARD
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct WireSlot {
    pub expected: WireId,
    pub connected: Option<WireId>,
    pub correct: bool,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct WireBoard {
    pub slots: Vec<WireSlot>,
    pub threshold: usize,
    pub won: bool,
}

impl WireBoard {
    pub fn new(expected: Vec<WireId>, threshold: usize) -> Self {
        Self {
            slots: expected
                .into_iter()
                .map(|wire| WireSlot {
                    expected: wire,
                    connected: None,
                    correct: false,
                })
                .collect(),
            threshold,
            won: false,
        }
    }

    /// Plugs a wire into a slot and evaluates it. Returns whether the
    /// connection is correct, or None for an unknown slot (safe no-op).
    /// A won board refuses further changes.
    pub fn connect(&mut self, slot_index: usize, wire: WireId) -> Option<bool> {
        if self.won {
            return None;
        }
        let slot = self.slots.get_mut(slot_index)?;
        slot.connected = Some(wire);
        slot.correct = wire == slot.expected;
        Some(slot.correct)
    }

    /// Unplugs a slot. Correctness clears immediately, before anything
    /// recounts.
    pub fn disconnect(&mut self, slot_index: usize) -> bool {
        if self.won {
            return false;
        }
        let Some(slot) = self.slots.get_mut(slot_index) else {
            return false;
        };
        slot.correct = false;
        slot.connected = None;
        true
    }

    pub fn correct_count(&self) -> usize {
        self.slots.iter().filter(|s| s.correct).count()
    }

    /// Latches the win when the threshold is reached. Returns true only
    /// on the transition into the won state.
    pub fn check_win(&mut self) -> bool {
        if self.won {
            return false;
        }
        if self.correct_count() >= self.threshold {
            self.won = true;
            return true;
        }
        false
    }

    /// Used when the win already happened in a previous loop: rebuild the
    /// board in its solved configuration.
    pub fn force_complete(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.connected = Some(slot.expected);
            slot.correct = true;
        }
        self.won = true;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

pub fn handle_connect_wire(
    mut events: EventReader<ConnectWireEvent>,
    active: Res<ActiveMinigame>,
    mut board: ResMut<WireBoard>,
    mut flags: ResMut<WorldFlags>,
    mut won_writer: EventWriter<MinigameWonEvent>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    for ev in events.read() {
        if active.0 != Some(MinigameId::Wires) {
            continue;
        }
        match board.connect(ev.slot_index, ev.wire) {
            Some(true) => {
                sfx_writer.send(PlaySfxEvent {
                    sfx_id: "wire_connect".to_string(),
                });
                if board.check_win() {
                    info!(
                        "Wire game won: {}/{} slots correct",
                        board.correct_count(),
                        board.threshold
                    );
                    flags.wire_game_won = true;
                    won_writer.send(MinigameWonEvent {
                        minigame: MinigameId::Wires,
                    });
                }
            }
            Some(false) => {
                sfx_writer.send(PlaySfxEvent {
                    sfx_id: "spark".to_string(),
                });
            }
            None => {
                if !board.won {
                    warn!("Connect to unknown wire slot {}; ignored", ev.slot_index);
                }
            }
        }
    }
}

pub fn handle_disconnect_wire(
    mut events: EventReader<DisconnectWireEvent>,
    active: Res<ActiveMinigame>,
    mut board: ResMut<WireBoard>,
    mut sfx_writer: EventWriter<PlaySfxEvent>,
) {
    for ev in events.read() {
        if active.0 != Some(MinigameId::Wires) {
            continue;
        }
        if board.disconnect(ev.slot_index) {
            sfx_writer.send(PlaySfxEvent {
                sfx_id: "wire_grab".to_string(),
            });
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> WireBoard {
        WireBoard::new(
            vec![WireId::One, WireId::Two, WireId::Three, WireId::Four],
            3,
        )
    }

    #[test]
    fn test_correct_connection_sets_correctness() {
        let mut b = board();
        assert_eq!(b.connect(0, WireId::One), Some(true));
        assert!(b.slots[0].correct);
        assert_eq!(b.correct_count(), 1);
    }

    #[test]
    fn test_wrong_connection_is_tracked_but_incorrect() {
        let mut b = board();
        assert_eq!(b.connect(0, WireId::Two), Some(false));
        assert_eq!(b.slots[0].connected, Some(WireId::Two));
        assert!(!b.slots[0].correct);
        assert_eq!(b.correct_count(), 0);
    }

    #[test]
    fn test_unknown_slot_is_safe_noop() {
        let mut b = board();
        assert_eq!(b.connect(99, WireId::One), None);
        assert_eq!(b.correct_count(), 0);
    }

    #[test]
    fn test_disconnect_clears_correctness_immediately() {
        let mut b = board();
        b.connect(0, WireId::One);
        assert!(b.slots[0].correct);

        b.disconnect(0);
        // Queried before any recount: already false.
        assert!(!b.slots[0].correct);
        assert_eq!(b.slots[0].connected, None);
        assert_eq!(b.correct_count(), 0);
    }

    #[test]
    fn test_win_fires_exactly_once_at_threshold() {
        let mut b = board();
        b.connect(0, WireId::One);
        assert!(!b.check_win());
        b.connect(1, WireId::Two);
        assert!(!b.check_win());
        b.connect(2, WireId::Three);
        assert!(b.check_win(), "third correct slot reaches the threshold");
        assert!(!b.check_win(), "the win never re-fires");
    }

    #[test]
    fn test_won_board_rejects_further_changes() {
        let mut b = board();
        b.connect(0, WireId::One);
        b.connect(1, WireId::Two);
        b.connect(2, WireId::Three);
        assert!(b.check_win());

        // A fourth correct slot after the win changes nothing.
        assert_eq!(b.connect(3, WireId::Four), None);
        assert!(!b.check_win());
        assert!(!b.disconnect(0));
        assert!(b.slots[0].correct, "won board is frozen");
    }

    #[test]
    fn test_reconnecting_over_wrong_wire_reevaluates() {
        let mut b = board();
        b.connect(0, WireId::Four);
        assert_eq!(b.correct_count(), 0);
        b.connect(0, WireId::One);
        assert_eq!(b.correct_count(), 1);
    }

    #[test]
    fn test_force_complete_builds_solved_board() {
        let mut b = board();
        b.force_complete();
        assert!(b.won);
        assert_eq!(b.correct_count(), 4);
        assert!(!b.check_win(), "force-completed board never re-signals");
    }
}
