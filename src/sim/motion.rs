//! Player motion model
//!
//! Forward-only velocity integration with quicker braking than starting.

use super::state::PlayerState;
use crate::tuning::Tuning;

/// Advance the player's velocity and position by one frame
pub fn integrate(player: &mut PlayerState, moving_forward: bool, dt: f32, tuning: &Tuning) {
    let target = if moving_forward { tuning.max_speed } else { 0.0 };

    // Step toward the target without overshooting it
    if player.velocity < target {
        player.velocity = (player.velocity + tuning.acceleration * dt).min(target);
    } else if player.velocity > target {
        player.velocity = (player.velocity - tuning.deceleration * dt).max(target);
    }

    if player.velocity.abs() > tuning.motion_epsilon {
        player.pos.z += player.velocity * dt;
    }

    clamp_to_track(player, tuning);
}

/// Keep the player on the track and behind no further than the start margin
pub fn clamp_to_track(player: &mut PlayerState, tuning: &Tuning) {
    let back_limit = tuning.start_z - tuning.start_margin;
    if player.pos.z < back_limit {
        player.pos.z = back_limit;
    }
    let lateral = tuning.lateral_limit();
    player.pos.x = player.pos.x.clamp(-lateral, lateral);
}
