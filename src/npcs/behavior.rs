//! Per-variant NPC behavior — dialogue variant selection, response-path
//! resolution, and state-entry hooks.
//!
//! Each variant implements the `NpcBehavior` capability set and is
//! resolved through its tag; there is no inheritance chain to walk.
//! Hooks return plain effect values so the calling system owns every
//! side channel (timers, achievements, sfx).

use crate::dialogue::{
    resolve_response_default, select_variant_default, DialogueNode, PlayerResponse,
};
use crate::shared::*;

use super::NpcDef;

// ═══════════════════════════════════════════════════════════════════════
// CAPABILITY SET
// ═══════════════════════════════════════════════════════════════════════

/// Read-only world context handed to every behavior call.
pub struct BehaviorCtx<'a> {
    pub def: &'a NpcDef,
    pub flags: &'a WorldFlags,
    pub inventory: &'a Inventory,
    pub state: NpcState,
    /// Elapsed seconds on the day clock, for timing-sensitive hooks.
    pub day_elapsed: f32,
}

/// What a resolved response does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Move the dialogue to this node.
    Goto(usize),
    /// Close the dialogue and return control.
    End,
    /// Close the dialogue and force this NPC into PostMinigame after the
    /// bypass presentation beat.
    Bypass,
}

/// Side effects requested by a state-entry hook, executed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NpcEffect {
    RemoveTimer(String),
    Unlock(String),
    Sfx(String),
}

pub trait NpcBehavior: Send + Sync {
    fn select_variant(&self, node: &DialogueNode, ctx: &BehaviorCtx) -> usize {
        select_variant_default(node, ctx.flags)
    }

    fn resolve_response(&self, resp: &PlayerResponse, ctx: &BehaviorCtx) -> ResponseOutcome {
        match resolve_response_default(resp, ctx.inventory) {
            Some(index) => ResponseOutcome::Goto(index),
            None => ResponseOutcome::End,
        }
    }

    fn on_enter_state(&self, _state: NpcState, _ctx: &BehaviorCtx) -> Vec<NpcEffect> {
        Vec::new()
    }
}

pub fn behavior_for(variant: NpcVariant) -> &'static dyn NpcBehavior {
    match variant {
        NpcVariant::Seraph => &SeraphBehavior,
        NpcVariant::Rusty => &RustyBehavior,
        NpcVariant::Cog => &CogBehavior,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SERAPH — the hub NPC; its healing is the true ending
// ═══════════════════════════════════════════════════════════════════════

struct SeraphBehavior;

impl NpcBehavior for SeraphBehavior {
    /// The seraph speaks differently once both machines hum again.
    fn select_variant(&self, node: &DialogueNode, ctx: &BehaviorCtx) -> usize {
        if ctx.flags.both_minigames_won() && node.variants.len() > 1 {
            1
        } else {
            select_variant_default(node, ctx.flags)
        }
    }

    /// Holding the remedy short-circuits everything: any response chosen
    /// before the seraph is healed ends the dialogue and forces the
    /// PostMinigame transition.
    fn resolve_response(&self, resp: &PlayerResponse, ctx: &BehaviorCtx) -> ResponseOutcome {
        if ctx.state != NpcState::PostMinigame {
            if let Some(bypass) = &ctx.def.bypass_item {
                if ctx.inventory.has(bypass) {
                    return ResponseOutcome::Bypass;
                }
            }
        }
        match resolve_response_default(resp, ctx.inventory) {
            Some(index) => ResponseOutcome::Goto(index),
            None => ResponseOutcome::End,
        }
    }

    fn on_enter_state(&self, state: NpcState, ctx: &BehaviorCtx) -> Vec<NpcEffect> {
        if state != NpcState::PostMinigame {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if let Some(timer) = &ctx.def.pressure_timer {
            effects.push(NpcEffect::RemoveTimer(timer.clone()));
        }
        effects.push(NpcEffect::Unlock(ACH_TRUE_ENDING.to_string()));
        if ctx.day_elapsed <= SPEEDRUN_WINDOW_SECS {
            effects.push(NpcEffect::Unlock(ACH_SPEEDRUN.to_string()));
        }
        effects.push(NpcEffect::Sfx("choir".to_string()));
        effects
    }
}

// ═══════════════════════════════════════════════════════════════════════
// RUSTY — the broken automaton (wire minigame)
// ═══════════════════════════════════════════════════════════════════════

struct RustyBehavior;

impl NpcBehavior for RustyBehavior {
    fn on_enter_state(&self, state: NpcState, _ctx: &BehaviorCtx) -> Vec<NpcEffect> {
        match state {
            NpcState::PlayingMinigame => vec![NpcEffect::Sfx("panel_open".to_string())],
            NpcState::PostMinigame => vec![NpcEffect::Sfx("spark".to_string())],
            _ => Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// COG — the nervous mechanic (gear minigame)
// ═══════════════════════════════════════════════════════════════════════

struct CogBehavior;

impl NpcBehavior for CogBehavior {
    fn on_enter_state(&self, state: NpcState, _ctx: &BehaviorCtx) -> Vec<NpcEffect> {
        match state {
            NpcState::PostMinigame => vec![NpcEffect::Sfx("machine_purr".to_string())],
            _ => Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════
