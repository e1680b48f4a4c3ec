//! Per-frame simulation update
//!
//! Composes the independent stages in a fixed order: phase start, match
//! clock, player motion, red-light check, doll cycle, finish line, terminal
//! countdowns, then effects and camera which run every frame regardless.

use glam::Vec3;

use super::state::{GameState, LossReason, PhaseState};
use super::{motion, outcome, phase, violation};

/// Input sampled for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Forward key held
    pub moving_forward: bool,
    /// Forward key went down while in Ready
    pub start: bool,
}

/// Advance the game state by one frame of `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, state.tuning.max_frame_dt);

    if input.start && matches!(state.phase, PhaseState::Ready) {
        phase::start(state);
    }

    if state.phase().is_active() {
        update_active(state, input, dt);
    } else {
        outcome::update_terminal(state, dt);
    }

    state.effects.update(dt, &state.tuning);

    let anchor = camera_anchor(state);
    state.camera.update(anchor, dt, &state.tuning);
}

fn update_active(state: &mut GameState, input: &TickInput, dt: f32) {
    state.match_timer -= dt;
    if state.match_timer <= 0.0 {
        state.match_timer = 0.0;
        outcome::lose(state, LossReason::TimeUp);
        return;
    }

    motion::integrate(&mut state.player, input.moving_forward, dt, &state.tuning);

    // A violation preempts the watch timer running out on the same frame
    if let Some(snapshot) = state.phase.snapshot() {
        if violation::is_violation(&state.player, snapshot, &state.tuning) {
            outcome::lose(state, LossReason::MovedDuringRedLight);
            return;
        }
    }

    phase::advance(state, dt);

    if outcome::crossed_finish(state) {
        outcome::win(state);
    }
}

/// What the camera trails this frame
pub fn camera_anchor(state: &GameState) -> Vec3 {
    match state.phase {
        PhaseState::Lost { at, .. } => at,
        PhaseState::Ready => state.tuning.start_position(),
        _ => state.player.pos,
    }
}
