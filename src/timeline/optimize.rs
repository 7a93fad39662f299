//! Redundant-command removal.
//!
//! A single greedy pass compares each command with the last command that was
//! kept, never a window, so the emitted stream can lag a slow drift by up to
//! the threshold.

use super::Timeline;
use crate::lighting::color::rgb_distance;
use crate::lighting::command::{CommandType, LightCommand};

/// Sum of absolute RGB channel differences below which colours are equal.
pub const RGB_THRESHOLD: u32 = 15;
/// Brightness difference below which levels are equal.
pub const BRIGHTNESS_THRESHOLD: u8 = 5;

/// Whether `next` adds nothing visible after `prev`.
///
/// Only colour and brightness commands can be redundant; effects are
/// discrete events and colour-temperature/turn-on commands are always kept.
pub fn is_redundant(prev: &LightCommand, next: &LightCommand) -> bool {
    if prev.command_type != next.command_type {
        return false;
    }
    if !matches!(
        next.command_type,
        CommandType::SetColor | CommandType::SetBrightness
    ) {
        return false;
    }

    let similar_color = match (prev.params.rgb_color, next.params.rgb_color) {
        (Some(a), Some(b)) => rgb_distance(a, b) < RGB_THRESHOLD,
        _ => false,
    };
    let similar_brightness = match (prev.params.brightness, next.params.brightness) {
        (Some(a), Some(b)) => a.abs_diff(b) < BRIGHTNESS_THRESHOLD,
        _ => false,
    };

    similar_color || similar_brightness
}

pub fn remove_redundant(commands: &[LightCommand]) -> Vec<LightCommand> {
    let mut kept: Vec<LightCommand> = Vec::with_capacity(commands.len());
    for command in commands {
        match kept.last() {
            Some(last) if is_redundant(last, command) => {}
            _ => kept.push(command.clone()),
        }
    }
    kept
}

/// Re-runs the redundancy filter over every track. Idempotent.
pub fn optimize_timeline(timeline: &Timeline) -> Timeline {
    let mut optimized = timeline.clone();
    for track in &mut optimized.tracks {
        track.commands = remove_redundant(&track.commands);
    }
    optimized.metadata.command_count = optimized.tracks.iter().map(|t| t.commands.len()).sum();

    log::debug!(
        "Optimized timeline {}: {} -> {} commands",
        timeline.id,
        timeline.metadata.command_count,
        optimized.metadata.command_count
    );
    optimized
}
