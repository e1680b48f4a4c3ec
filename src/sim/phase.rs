//! Doll phase controller
//!
//! Timed cycle `Moving -> TurningToWatch -> Watching -> TurningToMove ->
//! Moving`. The phase timer is the only thing that moves the cycle on; the
//! doll's angle just follows along and is snapped when a turn ends.

use std::f32::consts::PI;

use super::state::{Doll, GameEvent, GameState, PhaseState};
use crate::consts::{FACING_AWAY, FACING_TOWARD, TIMER_EPSILON};
use crate::shortest_angle_delta;

/// Count a timer down, returning true once it has run out
#[inline]
fn run_down(timer: &mut f32, dt: f32) -> bool {
    *timer -= dt;
    *timer <= TIMER_EPSILON
}

/// Rotate the doll toward its target at half a turn per `turn_duration`
pub fn rotate_doll(doll: &mut Doll, dt: f32, turn_duration: f32) {
    let delta = shortest_angle_delta(doll.angle, doll.target);
    let max_step = PI / turn_duration * dt;
    doll.angle += delta.clamp(-max_step, max_step);
}

/// First forward press: arm the match clock and start the cue
pub fn start(state: &mut GameState) {
    debug_assert!(matches!(state.phase, PhaseState::Ready));
    let timer = state.facing_away_duration();
    debug_assert!(timer > 0.0);

    state.match_timer = state.tuning.time_limit;
    state.doll.face(FACING_AWAY);
    state.enter(PhaseState::Moving { timer });
    state.events.push(GameEvent::Started);
    state.events.push(GameEvent::CueStart);
    log::info!(
        "Match started: {:.1}s limit, {:.2}s green light",
        state.tuning.time_limit,
        timer
    );
}

/// Advance the active phase's timer, turning the doll and switching phase
/// when the timer runs out
pub fn advance(state: &mut GameState, dt: f32) {
    let turn = state.tuning.turn_duration;

    match state.phase {
        PhaseState::Moving { mut timer } => {
            if run_down(&mut timer, dt) {
                state.doll.turn_to(FACING_TOWARD);
                state.enter(PhaseState::TurningToWatch { timer: turn });
            } else {
                state.phase = PhaseState::Moving { timer };
            }
        }

        PhaseState::TurningToWatch { mut timer } => {
            rotate_doll(&mut state.doll, dt, turn);
            if run_down(&mut timer, dt) {
                state.doll.snap();
                state.events.push(GameEvent::CueStop);
                let snapshot = state.player.pos;
                state.enter(PhaseState::Watching {
                    timer: state.tuning.watch_duration,
                    snapshot,
                });
            } else {
                state.phase = PhaseState::TurningToWatch { timer };
            }
        }

        PhaseState::Watching {
            mut timer,
            snapshot,
        } => {
            if run_down(&mut timer, dt) {
                state.doll.turn_to(FACING_AWAY);
                state.events.push(GameEvent::CueStart);
                state.enter(PhaseState::TurningToMove { timer: turn });
            } else {
                state.phase = PhaseState::Watching { timer, snapshot };
            }
        }

        PhaseState::TurningToMove { mut timer } => {
            rotate_doll(&mut state.doll, dt, turn);
            if run_down(&mut timer, dt) {
                state.doll.snap();
                let timer = state.facing_away_duration();
                state.enter(PhaseState::Moving { timer });
            } else {
                state.phase = PhaseState::TurningToMove { timer };
            }
        }

        // Ready waits for input; terminal phases belong to the outcome resolver
        PhaseState::Ready | PhaseState::Lost { .. } | PhaseState::Won { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GamePhase;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn started() -> GameState {
        let mut state = GameState::new(Tuning::default(), 1);
        start(&mut state);
        state.drain_events();
        state
    }

    fn phase_changes(events: &[GameEvent], to: GamePhase) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::PhaseChanged { to: t, .. } if *t == to))
            .count()
    }

    #[test]
    fn test_start_arms_timers_and_cue() {
        let mut state = GameState::new(Tuning::default(), 1);
        start(&mut state);
        let expected = state.cue_duration - state.tuning.turn_duration;
        assert_eq!(state.phase, PhaseState::Moving { timer: expected });
        assert_eq!(state.doll.angle, FACING_AWAY);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Started));
        assert!(events.contains(&GameEvent::CueStart));
    }

    #[test]
    fn test_full_cycle_order() {
        let mut state = started();
        let dt = 1.0 / 60.0;
        let mut seen = vec![state.phase()];
        for _ in 0..(20.0 / dt) as usize {
            advance(&mut state, dt);
            if *seen.last().unwrap() != state.phase() {
                seen.push(state.phase());
            }
        }
        assert_eq!(
            &seen[..5],
            &[
                GamePhase::Moving,
                GamePhase::TurningToWatch,
                GamePhase::Watching,
                GamePhase::TurningToMove,
                GamePhase::Moving,
            ]
        );
    }

    #[test]
    fn test_cue_stops_exactly_on_watch_entry() {
        let mut state = started();
        let dt = 1.0 / 60.0;
        loop {
            advance(&mut state, dt);
            let events = state.drain_events();
            let stopped = events.contains(&GameEvent::CueStop);
            let entered = phase_changes(&events, GamePhase::Watching) == 1;
            assert_eq!(stopped, entered);
            if entered {
                break;
            }
        }
        assert_eq!(state.phase.snapshot(), Some(state.player.pos));
    }

    #[test]
    fn test_cue_restarts_when_turning_away() {
        let mut state = started();
        state.doll.face(FACING_TOWARD);
        state.phase = PhaseState::Watching {
            timer: 0.01,
            snapshot: state.player.pos,
        };
        advance(&mut state, 0.02);
        assert_eq!(state.phase(), GamePhase::TurningToMove);
        assert_eq!(state.doll.target, FACING_AWAY);
        assert!(state.drain_events().contains(&GameEvent::CueStart));
    }

    #[test]
    fn test_rotation_step_covers_half_turn_in_turn_duration() {
        let mut doll = Doll::default();
        doll.turn_to(FACING_TOWARD);
        let turn = 0.5;
        let steps = 50;
        for _ in 0..steps {
            rotate_doll(&mut doll, turn / steps as f32, turn);
        }
        assert!(shortest_angle_delta(doll.angle, doll.target).abs() < 1e-3);
    }

    #[test]
    fn test_terminal_phases_ignored() {
        let mut state = started();
        state.phase = PhaseState::Won {
            exit_timer: 1.0,
            reported: false,
        };
        advance(&mut state, 0.5);
        assert_eq!(
            state.phase,
            PhaseState::Won {
                exit_timer: 1.0,
                reported: false
            }
        );
    }

    /// Split `total` into frames proportional to `weights`
    fn frames_summing_to(total: f32, weights: &[f32]) -> Vec<f32> {
        let sum: f32 = weights.iter().sum();
        weights.iter().map(|w| w / sum * total).collect()
    }

    proptest! {
        #[test]
        fn facing_away_expires_exactly_once(
            weights in prop::collection::vec(1.0f32..2.0, 80..300),
        ) {
            let mut state = started();
            let duration = state.facing_away_duration();
            let frames = frames_summing_to(duration, &weights);
            prop_assume!(frames.iter().all(|dt| *dt <= state.tuning.max_frame_dt));

            let mut transitions = 0;
            for dt in frames {
                advance(&mut state, dt);
                transitions += phase_changes(&state.drain_events(), GamePhase::TurningToWatch);
            }
            prop_assert_eq!(transitions, 1);
            prop_assert_eq!(state.phase(), GamePhase::TurningToWatch);
        }

        #[test]
        fn turn_ends_exactly_on_target(
            weights in prop::collection::vec(1.0f32..10.0, 1..60),
            toward in any::<bool>(),
        ) {
            let mut state = started();
            let turn = state.tuning.turn_duration;
            if toward {
                state.doll.face(FACING_AWAY);
                state.doll.turn_to(FACING_TOWARD);
                state.phase = PhaseState::TurningToWatch { timer: turn };
            } else {
                state.doll.face(FACING_TOWARD);
                state.doll.turn_to(FACING_AWAY);
                state.phase = PhaseState::TurningToMove { timer: turn };
            }

            for dt in frames_summing_to(turn, &weights) {
                advance(&mut state, dt);
            }
            let expected = if toward { FACING_TOWARD } else { FACING_AWAY };
            prop_assert_ne!(state.phase(), GamePhase::TurningToWatch);
            prop_assert_ne!(state.phase(), GamePhase::TurningToMove);
            prop_assert_eq!(state.doll.angle, expected);
        }
    }
}
