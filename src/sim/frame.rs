//! Render snapshot handed to the scene each frame

use glam::Vec3;
use serde::Serialize;

use super::effects::Particle;
use super::state::{GamePhase, GameState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleView {
    pub pos: Vec3,
    pub alpha: f32,
    pub color: u32,
    pub size: f32,
}

impl From<&Particle> for ParticleView {
    fn from(p: &Particle) -> Self {
        Self {
            pos: p.pos,
            alpha: p.alpha(),
            color: p.color,
            size: p.size,
        }
    }
}

/// Everything the scene needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameView {
    pub phase: GamePhase,
    pub time_left: f32,
    pub player_pos: Vec3,
    pub player_visible: bool,
    pub doll_angle: f32,
    pub camera_eye: Vec3,
    pub camera_look_at: Vec3,
    pub debris: Vec<ParticleView>,
    pub confetti: Vec<ParticleView>,
}

impl FrameView {
    pub fn capture(state: &GameState) -> Self {
        Self {
            phase: state.phase(),
            time_left: state.match_timer.max(0.0),
            player_pos: state.player.pos,
            player_visible: state.player.visible,
            doll_angle: state.doll.angle,
            camera_eye: state.camera.eye,
            camera_look_at: state.camera.look_at,
            debris: state.effects.debris.iter().map(ParticleView::from).collect(),
            confetti: state.effects.confetti.iter().map(ParticleView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::outcome;
    use crate::sim::phase;
    use crate::sim::state::LossReason;
    use crate::tuning::Tuning;

    #[test]
    fn test_capture_after_loss() {
        let mut state = GameState::new(Tuning::default(), 4);
        phase::start(&mut state);
        outcome::lose(&mut state, LossReason::TimeUp);
        let view = FrameView::capture(&state);
        assert_eq!(view.phase, GamePhase::Lost);
        assert!(!view.player_visible);
        assert_eq!(view.debris.len(), state.tuning.debris_count);
        assert!(view.debris.iter().all(|p| p.alpha == 1.0));
    }

    #[test]
    fn test_serializes_to_json() {
        let state = GameState::new(Tuning::default(), 4);
        let json = serde_json::to_value(FrameView::capture(&state)).unwrap();
        assert_eq!(json["phase"], "Ready");
        assert_eq!(json["player_pos"].as_array().map(|a| a.len()), Some(3));
    }
}
