//! Dialogue graphs — static branching data consumed by NPC controllers.
//!
//! A graph is a list of nodes; a node carries one or more pre-authored
//! text variants (the behavior layer picks which to show) and the player's
//! response options. A response with an empty next-index list is the
//! end-of-dialogue marker.
//!
//! Graphs are validated once at data-load time: a response pointing at a
//! node that does not exist is a content defect, logged and clamped by
//! treating that response as terminal. Nothing here can panic at play
//! time.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// DATA MODEL
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct PlayerResponse {
    pub text: String,
    /// Branch targets. `next[0]` is the fallback path; `next[1]`, when
    /// present and the requirement is met, is the primary path. Empty
    /// means this response ends the dialogue.
    pub next: Vec<usize>,
    /// Item the player must hold to take the primary path.
    pub requires: Option<ItemId>,
}

impl PlayerResponse {
    pub fn new(text: impl Into<String>, next: Vec<usize>) -> Self {
        Self {
            text: text.into(),
            next,
            requires: None,
        }
    }

    pub fn gated(text: impl Into<String>, requires: &str, next: Vec<usize>) -> Self {
        Self {
            text: text.into(),
            next,
            requires: Some(requires.to_string()),
        }
    }

    /// Terminal response: picking it ends the dialogue.
    pub fn end(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    pub fn is_terminal(&self) -> bool {
        self.next.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DialogueNode {
    /// Pre-authored text variants for this node; behavior selection maps
    /// world-state flags to an index.
    pub variants: Vec<String>,
    pub responses: Vec<PlayerResponse>,
}

impl DialogueNode {
    pub fn new(variants: Vec<&str>, responses: Vec<PlayerResponse>) -> Self {
        Self {
            variants: variants.into_iter().map(String::from).collect(),
            responses,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DialogueGraph {
    pub nodes: Vec<DialogueNode>,
}

impl DialogueGraph {
    pub fn new(nodes: Vec<DialogueNode>) -> Self {
        Self { nodes }
    }

    pub fn node(&self, index: usize) -> Option<&DialogueNode> {
        self.nodes.get(index)
    }

    /// Clamps out-of-range branch targets by making the offending
    /// response terminal. Returns how many defects were found.
    pub fn validate(&mut self, graph_name: &str) -> usize {
        let node_count = self.nodes.len();
        let mut defects = 0;
        for (node_idx, node) in self.nodes.iter_mut().enumerate() {
            for (resp_idx, resp) in node.responses.iter_mut().enumerate() {
                if resp.next.iter().any(|&target| target >= node_count) {
                    warn!(
                        "Dialogue graph '{}': node {} response {} targets a missing node; treating as terminal",
                        graph_name, node_idx, resp_idx
                    );
                    resp.next.clear();
                    defects += 1;
                }
            }
        }
        defects
    }
}

// ═══════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════

/// All authored graphs, keyed by NPC and the NPC state they play in.
#[derive(Resource, Debug, Clone, Default)]
pub struct DialogueRegistry {
    pub graphs: HashMap<(NpcId, NpcState), DialogueGraph>,
}

impl DialogueRegistry {
    pub fn insert(&mut self, npc_id: &str, state: NpcState, graph: DialogueGraph) {
        self.graphs.insert((npc_id.to_string(), state), graph);
    }

    /// The graph for this NPC's current state, falling back to the idle
    /// graph when a state has no authored tree (content gap, not an
    /// error worth halting play for).
    pub fn graph_for(&self, npc_id: &str, state: NpcState) -> Option<&DialogueGraph> {
        let keyed = self.graphs.get(&(npc_id.to_string(), state));
        if keyed.is_some() {
            return keyed;
        }
        if state != NpcState::DefaultIdle {
            warn!("No '{npc_id}' graph for {state:?}; falling back to idle tree");
        }
        self.graphs.get(&(npc_id.to_string(), NpcState::DefaultIdle))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// RESOLUTION — pure helpers, no side effects
// ═══════════════════════════════════════════════════════════════════════

/// Default variant selection: the first authored text.
pub fn select_variant_default(_node: &DialogueNode, _flags: &WorldFlags) -> usize {
    0
}

/// Resolves a chosen response to the next node index, or None for
/// end-of-dialogue. A gated response takes the primary path (`next[1]`)
/// only when the required item is held; otherwise the fallback
/// (`next[0]`).
pub fn resolve_response_default(resp: &PlayerResponse, inventory: &Inventory) -> Option<usize> {
    if resp.is_terminal() {
        return None;
    }
    match &resp.requires {
        Some(required) if inventory.has(required) => {
            Some(resp.next.get(1).copied().unwrap_or(resp.next[0]))
        }
        _ => Some(resp.next[0]),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════
