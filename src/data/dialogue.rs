//! Authored dialogue graphs for the three residents of the gate.
//!
//! Conventions the runtime relies on:
//! - A response with an empty `next` list ends the dialogue.
//! - For gated responses, `next[0]` is the fallback path and `next[1]`
//!   the primary path taken when the required item is held.
//! - Node 0 is always the entry node for its tree.
//! - Ending any MinigameReady tree drops the player into that NPC's
//!   minigame, so those trees only end where the game should begin.

use crate::dialogue::{DialogueGraph, DialogueNode, DialogueRegistry, PlayerResponse};
use crate::shared::*;

pub fn populate_dialogue(registry: &mut DialogueRegistry) {
    seraph(registry);
    rusty(registry);
    cog(registry);
}

// ─── The Seraph ──────────────────────────────────────────────────────────────

fn seraph(registry: &mut DialogueRegistry) {
    registry.insert(
        NPC_SERAPH,
        NpcState::DefaultIdle,
        DialogueGraph::new(vec![
            // 0: greeting — second variant plays once both machines hum
            DialogueNode::new(
                vec![
                    "A figure of light kneels by the gate, flickering like a bad lamp.",
                    "The seraph straightens as you approach. Its light holds steady now.",
                ],
                vec![
                    PlayerResponse::new("What is this place?", vec![1]),
                    PlayerResponse::gated(
                        "I've been here before, haven't I?",
                        ITEM_LOOP_JOURNAL,
                        vec![2, 3],
                    ),
                    PlayerResponse::end("I should go."),
                ],
            ),
            // 1: lore
            DialogueNode::new(
                vec!["The last dusk. It keeps ending, and the gate keeps putting it back."],
                vec![
                    PlayerResponse::new("Put back? By you?", vec![2]),
                    PlayerResponse::end("That's... a lot. I need air."),
                ],
            ),
            // 2: brush-off (fallback when the journal isn't held)
            DialogueNode::new(
                vec!["You sound unsure. Walk the dusk a while; the gate remembers for you."],
                vec![
                    PlayerResponse::new("Then tell me about this place.", vec![1]),
                    PlayerResponse::end("Fine. I'll walk."),
                ],
            ),
            // 3: the journal proves the loops
            DialogueNode::new(
                vec![
                    "Then you already know how this ends. Wake the machines, or bring me \
                     the remedy, and the dusk can finally finish.",
                ],
                vec![PlayerResponse::end("I'll find a way.")],
            ),
        ]),
    );

    registry.insert(
        NPC_SERAPH,
        NpcState::PostMinigame,
        DialogueGraph::new(vec![
            // 0
            DialogueNode::new(
                vec!["The seraph stands whole, wings of steady light. \"It is done.\""],
                vec![
                    PlayerResponse::new("What happens now?", vec![1]),
                    PlayerResponse::end("Rest, then."),
                ],
            ),
            // 1
            DialogueNode::new(
                vec!["\"Now the dusk gets to become night. Thank you, walker.\""],
                vec![PlayerResponse::end("Goodnight.")],
            ),
        ]),
    );
}

// ─── Rusty, the automaton by the fuse wall ───────────────────────────────────

fn rusty(registry: &mut DialogueRegistry) {
    registry.insert(
        NPC_RUSTY,
        NpcState::DefaultIdle,
        DialogueGraph::new(vec![
            // 0
            DialogueNode::new(
                vec!["Bzzt. Panel's dead, stranger. No wire, no fix, no lights."],
                vec![
                    PlayerResponse::new("What happened to you?", vec![1]),
                    PlayerResponse::end("Hang in there."),
                ],
            ),
            // 1
            DialogueNode::new(
                vec!["Storm took the line out at dusk. Same dusk. Every time. Bzzt."],
                vec![PlayerResponse::end("I'll find you some wire.")],
            ),
        ]),
    );

    registry.insert(
        NPC_RUSTY,
        NpcState::MinigameReady,
        DialogueGraph::new(vec![DialogueNode::new(
            vec!["That spool! Colors to colors, stranger. Pop the panel open?"],
            vec![PlayerResponse::end("Let's fix you.")],
        )]),
    );

    registry.insert(
        NPC_RUSTY,
        NpcState::PlayingMinigame,
        DialogueGraph::new(vec![DialogueNode::new(
            vec!["Panel's open. Match the colors — gently, I feel every spark."],
            vec![PlayerResponse::end("Back to it.")],
        )]),
    );

    registry.insert(
        NPC_RUSTY,
        NpcState::PostMinigame,
        DialogueGraph::new(vec![DialogueNode::new(
            vec!["Systems green. I owe you a dawn, stranger."],
            vec![PlayerResponse::end("Glad to help.")],
        )]),
    );
}

// ─── Cog, the nervous mechanic ───────────────────────────────────────────────

fn cog(registry: &mut DialogueRegistry) {
    registry.insert(
        NPC_COG,
        NpcState::DefaultIdle,
        DialogueGraph::new(vec![
            // 0
            DialogueNode::new(
                vec!["Stay back! The machine bites. ...Unless you've got a wrench on you?"],
                vec![
                    PlayerResponse::new("What's wrong with it?", vec![1]),
                    PlayerResponse::end("Easy, friend."),
                ],
            ),
            // 1
            DialogueNode::new(
                vec!["Gears slipped out of true. I'd set them myself but, well. Teeth."],
                vec![PlayerResponse::end("I'll see what I can do.")],
            ),
        ]),
    );

    registry.insert(
        NPC_COG,
        NpcState::MinigameReady,
        DialogueGraph::new(vec![DialogueNode::new(
            vec!["A wrench! Okay. Okay. You set the gears, I'll watch from here."],
            vec![PlayerResponse::end("Hold my coat.")],
        )]),
    );

    registry.insert(
        NPC_COG,
        NpcState::PlayingMinigame,
        DialogueGraph::new(vec![DialogueNode::new(
            vec!["Careful! The third one's a biter."],
            vec![PlayerResponse::end("Back to it.")],
        )]),
    );

    registry.insert(
        NPC_COG,
        NpcState::PostMinigame,
        DialogueGraph::new(vec![DialogueNode::new(
            vec!["It purrs! Listen to it purr. You're braver than me, stranger."],
            vec![PlayerResponse::end("Any time.")],
        )]),
    );
}
