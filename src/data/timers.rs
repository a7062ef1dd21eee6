//! Timer configuration for the loop scene.

use crate::shared::*;
use crate::timers::{TimerConfig, TimerSpec};

pub fn populate_timer_config(config: &mut TimerConfig) {
    config.specs = vec![
        // The day itself: when this runs out, the loop resets.
        TimerSpec {
            name: TIMER_DAY.to_string(),
            duration: DAY_LOOP_SECS,
            autostart: true,
        },
        // The seraph fades a little faster than the day; healing it
        // removes this timer entirely.
        TimerSpec {
            name: TIMER_SERAPH.to_string(),
            duration: SERAPH_PATIENCE_SECS,
            autostart: true,
        },
    ];
}
