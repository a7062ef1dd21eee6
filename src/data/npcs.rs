//! The cast: three NPCs at the gate.

use crate::npcs::{NpcDef, NpcRegistry};
use crate::shared::*;

pub fn populate_npcs(registry: &mut NpcRegistry) {
    let defs = [
        NpcDef {
            id: NPC_SERAPH.to_string(),
            name: "The Seraph".to_string(),
            variant: NpcVariant::Seraph,
            minigame: None,
            required_item: None,
            bypass_item: Some(ITEM_REMEDY.to_string()),
            pressure_timer: Some(TIMER_SERAPH.to_string()),
        },
        NpcDef {
            id: NPC_RUSTY.to_string(),
            name: "Rusty".to_string(),
            variant: NpcVariant::Rusty,
            minigame: Some(MinigameId::Wires),
            required_item: Some(ITEM_WIRE_SPOOL.to_string()),
            bypass_item: None,
            pressure_timer: None,
        },
        NpcDef {
            id: NPC_COG.to_string(),
            name: "Cog".to_string(),
            variant: NpcVariant::Cog,
            minigame: Some(MinigameId::Gears),
            required_item: Some(ITEM_WRENCH.to_string()),
            bypass_item: None,
            pressure_timer: None,
        },
    ];

    for def in defs {
        registry.npcs.insert(def.id.clone(), def);
    }
}
