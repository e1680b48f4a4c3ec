//! Red-light violation detection

use glam::Vec3;

use super::state::PlayerState;
use crate::tuning::Tuning;

/// Whether the player counts as moving relative to the watch snapshot.
///
/// Either test alone can miss motion at a frame boundary, so both are checked.
pub fn is_violation(player: &PlayerState, snapshot: Vec3, tuning: &Tuning) -> bool {
    let threshold_sq = tuning.violation_distance * tuning.violation_distance;
    player.pos.distance_squared(snapshot) > threshold_sq
        || player.velocity.abs() > tuning.violation_velocity
}
