//! Win/lose resolution
//!
//! Terminal phases preempt the doll cycle from any active phase and own
//! their own display countdowns.

use super::state::{GameEvent, GameState, LossReason, Outcome, PhaseState};
use crate::consts::{FACING_AWAY, TIMER_EPSILON};

/// End the round as a loss at the player's current position
pub fn lose(state: &mut GameState, reason: LossReason) {
    debug_assert!(state.phase().is_active());
    let at = state.player.pos;

    state.events.push(GameEvent::CueStop);
    state.player.velocity = 0.0;
    state.player.visible = false;
    state.effects.spawn_debris(at, &state.tuning);
    state.enter(PhaseState::Lost {
        respawn_timer: state.tuning.respawn_delay,
        at,
        reason,
    });
    state.events.push(GameEvent::Lost { reason, at });
    log::info!(
        "Lost at z={:.2}: {} ({:.1}s left)",
        at.z,
        reason.message(),
        state.match_timer.max(0.0)
    );
}

/// End the round as a win
pub fn win(state: &mut GameState) {
    debug_assert!(state.phase().is_active());

    state.events.push(GameEvent::CueStop);
    state.doll.face(FACING_AWAY);
    state.effects.spawn_confetti(state.player.pos, &state.tuning);
    state.enter(PhaseState::Won {
        exit_timer: state.tuning.win_delay,
        reported: false,
    });
    state.events.push(GameEvent::Won);
    log::info!(
        "Crossed the finish with {:.1}s to spare",
        state.match_timer.max(0.0)
    );
}

/// Whether the player has crossed the finish line
pub fn crossed_finish(state: &GameState) -> bool {
    state.player.pos.z >= state.tuning.finish_z
}

/// Count down the terminal display and resolve it when it runs out
pub fn update_terminal(state: &mut GameState, dt: f32) {
    match state.phase {
        PhaseState::Lost {
            mut respawn_timer,
            at,
            reason,
        } => {
            respawn_timer -= dt;
            if respawn_timer <= TIMER_EPSILON {
                state.reset();
                state.events.push(GameEvent::Respawned);
                log::info!("Respawned at the start line");
            } else {
                state.phase = PhaseState::Lost {
                    respawn_timer,
                    at,
                    reason,
                };
            }
        }

        PhaseState::Won {
            mut exit_timer,
            reported,
        } => {
            if reported {
                return;
            }
            exit_timer -= dt;
            let done = exit_timer <= TIMER_EPSILON;
            state.phase = PhaseState::Won {
                exit_timer: exit_timer.max(0.0),
                reported: done,
            };
            if done {
                state.events.push(GameEvent::Finished(Outcome::Passed));
            }
        }

        _ => {}
    }
}
