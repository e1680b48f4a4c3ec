//! Game state and core simulation types
//!
//! Everything the per-frame update reads or writes lives here. Side effects
//! the simulation cannot perform itself (audio, status text, reporting) are
//! queued as [`GameEvent`]s for the session to act on.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::camera::CameraRig;
use super::effects::Effects;
use crate::consts::FACING_AWAY;
use crate::tuning::Tuning;

/// Which phase is active, without its per-phase data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first forward press
    Ready,
    /// Doll faces away, cue playing, moving is allowed
    Moving,
    /// Doll turning toward the player
    TurningToWatch,
    /// Doll watching, any movement loses
    Watching,
    /// Doll turning away again
    TurningToMove,
    /// Caught or out of time, counting down to a reset
    Lost,
    /// Crossed the finish line, counting down to reporting
    Won,
}

impl GamePhase {
    /// Phases in which the match clock runs and the player can move
    pub fn is_active(self) -> bool {
        matches!(
            self,
            GamePhase::Moving
                | GamePhase::TurningToWatch
                | GamePhase::Watching
                | GamePhase::TurningToMove
        )
    }

    /// Phases during which the cue should be audible
    pub fn wants_cue(self) -> bool {
        matches!(
            self,
            GamePhase::Moving | GamePhase::TurningToWatch | GamePhase::TurningToMove
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Ready => "Ready",
            GamePhase::Moving => "Moving",
            GamePhase::TurningToWatch => "TurningToWatch",
            GamePhase::Watching => "Watching",
            GamePhase::TurningToMove => "TurningToMove",
            GamePhase::Lost => "Lost",
            GamePhase::Won => "Won",
        }
    }
}

/// Why a round was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    MovedDuringRedLight,
    TimeUp,
}

impl LossReason {
    pub fn message(self) -> &'static str {
        match self {
            LossReason::MovedDuringRedLight => "Moved during Red Light!",
            LossReason::TimeUp => "Time's up!",
        }
    }
}

/// Result handed to the menu shell when a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed,
    Exited,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::Exited => "exited",
        }
    }
}

/// The active phase together with the data only that phase owns
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseState {
    Ready,
    Moving {
        timer: f32,
    },
    TurningToWatch {
        timer: f32,
    },
    Watching {
        timer: f32,
        /// Player position when the doll finished turning
        snapshot: Vec3,
    },
    TurningToMove {
        timer: f32,
    },
    Lost {
        respawn_timer: f32,
        at: Vec3,
        reason: LossReason,
    },
    Won {
        exit_timer: f32,
        /// Set once the pass has been reported
        reported: bool,
    },
}

impl PhaseState {
    pub fn kind(&self) -> GamePhase {
        match self {
            PhaseState::Ready => GamePhase::Ready,
            PhaseState::Moving { .. } => GamePhase::Moving,
            PhaseState::TurningToWatch { .. } => GamePhase::TurningToWatch,
            PhaseState::Watching { .. } => GamePhase::Watching,
            PhaseState::TurningToMove { .. } => GamePhase::TurningToMove,
            PhaseState::Lost { .. } => GamePhase::Lost,
            PhaseState::Won { .. } => GamePhase::Won,
        }
    }

    /// Watch snapshot, only present while watching
    pub fn snapshot(&self) -> Option<Vec3> {
        match self {
            PhaseState::Watching { snapshot, .. } => Some(*snapshot),
            _ => None,
        }
    }
}

/// The runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub pos: Vec3,
    /// Speed along the forward (+z) axis
    pub velocity: f32,
    pub visible: bool,
}

impl PlayerState {
    pub fn at_start(tuning: &Tuning) -> Self {
        Self {
            pos: tuning.start_position(),
            velocity: 0.0,
            visible: true,
        }
    }
}

/// The doll's orientation about the vertical axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Doll {
    pub angle: f32,
    pub target: f32,
}

impl Default for Doll {
    fn default() -> Self {
        Self {
            angle: FACING_AWAY,
            target: FACING_AWAY,
        }
    }
}

impl Doll {
    /// Start a turn toward `target`
    pub fn turn_to(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump to the current target
    pub fn snap(&mut self) {
        self.angle = self.target;
    }

    /// Face `angle` immediately
    pub fn face(&mut self, angle: f32) {
        self.angle = angle;
        self.target = angle;
    }
}

/// Side effects requested by the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// The first forward press started the match
    Started,
    PhaseChanged { from: GamePhase, to: GamePhase },
    /// Start (or restart) the doll's cue from the beginning
    CueStart,
    CueStop,
    Lost { reason: LossReason, at: Vec3 },
    Won,
    /// Back in Ready after a loss
    Respawned,
    /// The session has a final result to report
    Finished(Outcome),
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Seed for the effect RNG
    pub seed: u64,
    pub phase: PhaseState,
    /// Seconds left in the match; frozen outside active phases
    pub match_timer: f32,
    /// Length of the doll's cue, which sets the facing-away duration
    pub cue_duration: f32,
    pub player: PlayerState,
    pub doll: Doll,
    pub effects: Effects,
    pub camera: CameraRig,
    /// Pending side effects, drained by the session each frame
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state in Ready
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let player = PlayerState::at_start(&tuning);
        let camera = CameraRig::snapped(player.pos, &tuning);
        Self {
            seed,
            phase: PhaseState::Ready,
            match_timer: tuning.time_limit,
            cue_duration: tuning.default_cue_duration,
            player,
            doll: Doll::default(),
            effects: Effects::new(seed),
            camera,
            events: Vec::new(),
            tuning,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase.kind()
    }

    /// Use the real cue length once audio has loaded
    pub fn set_cue_duration(&mut self, cue_duration: f32) {
        if self.tuning.cue_duration_fits(cue_duration) {
            self.cue_duration = cue_duration;
        } else {
            log::warn!(
                "Cue duration {:.2}s is not longer than a turn ({:.2}s); keeping {:.2}s",
                cue_duration,
                self.tuning.turn_duration,
                self.cue_duration
            );
        }
    }

    /// How long the doll faces away before turning
    pub fn facing_away_duration(&self) -> f32 {
        self.cue_duration - self.tuning.turn_duration
    }

    /// Re-initialize everything a respawn resets
    pub fn reset(&mut self) {
        self.enter(PhaseState::Ready);
        self.match_timer = self.tuning.time_limit;
        self.player = PlayerState::at_start(&self.tuning);
        self.doll = Doll::default();
        self.effects.clear();
        self.camera.snap(self.player.pos, &self.tuning);
    }

    /// Switch phase and announce it
    pub fn enter(&mut self, next: PhaseState) {
        let from = self.phase.kind();
        let to = next.kind();
        self.phase = next;
        if from != to {
            log::debug!("Phase {} -> {}", from.as_str(), to.as_str());
            self.events.push(GameEvent::PhaseChanged { from, to });
        }
    }

    /// Take the pending side effects
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
