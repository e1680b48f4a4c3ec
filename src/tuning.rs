//! Data-driven game balance
//!
//! Every gameplay number lives here so the shell can override any subset
//! from JSON without rebuilding.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Gameplay tuning. Missing JSON fields fall back to [`Tuning::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Timing (seconds) ===
    /// Match time limit once the first green light starts
    pub time_limit: f32,
    /// Duration of each doll turn
    pub turn_duration: f32,
    /// Duration of the watch (red light) phase
    pub watch_duration: f32,
    /// Cue length used when the cue buffer did not load
    pub default_cue_duration: f32,
    /// Delay between a loss and the reset to Ready
    pub respawn_delay: f32,
    /// Delay between a win and reporting the pass
    pub win_delay: f32,
    /// Largest frame step fed to the simulation
    pub max_frame_dt: f32,

    // === Player motion ===
    pub max_speed: f32,
    pub acceleration: f32,
    /// Braking rate, usually higher than `acceleration`
    pub deceleration: f32,
    /// Below this speed the player does not move
    pub motion_epsilon: f32,

    // === Track ===
    pub start_z: f32,
    /// How far behind the start line the player may back up
    pub start_margin: f32,
    pub finish_z: f32,
    pub track_half_width: f32,
    pub player_half_extent: f32,

    // === Violation thresholds ===
    /// Displacement from the watch snapshot that counts as moving
    pub violation_distance: f32,
    /// Speed that counts as moving
    pub violation_velocity: f32,

    // === Debris ===
    pub debris_count: usize,
    pub debris_speed_min: f32,
    pub debris_speed_max: f32,
    pub debris_lifetime: f32,
    /// Spawn height above the loss position
    pub burst_height: f32,
    pub gravity: f32,
    pub ground_y: f32,
    /// Vertical speed kept after a bounce
    pub bounce_restitution: f32,
    /// Horizontal speed kept after a bounce
    pub bounce_friction: f32,

    // === Confetti ===
    pub confetti_count: usize,
    pub confetti_lifetime: f32,
    pub confetti_drag: f32,

    // === Camera ===
    pub camera_offset: Vec3,
    pub camera_look_ahead: f32,
    pub camera_look_up: f32,
    /// Fraction of the remaining gap kept per 60 Hz frame
    pub camera_smoothing: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            time_limit: 60.0,
            turn_duration: 0.5,
            watch_duration: 3.0,
            default_cue_duration: 4.5,
            respawn_delay: 3.0,
            win_delay: 3.0,
            max_frame_dt: 0.1,

            max_speed: 4.0,
            acceleration: 6.0,
            deceleration: 18.0,
            motion_epsilon: 1e-3,

            start_z: 0.0,
            start_margin: 0.5,
            finish_z: 40.0,
            track_half_width: 8.0,
            player_half_extent: 0.4,

            violation_distance: 0.05,
            violation_velocity: 0.01,

            debris_count: 48,
            debris_speed_min: 3.0,
            debris_speed_max: 8.0,
            debris_lifetime: 2.0,
            burst_height: 1.0,
            gravity: 9.8,
            ground_y: 0.0,
            bounce_restitution: 0.45,
            bounce_friction: 0.7,

            confetti_count: 120,
            confetti_lifetime: 3.0,
            confetti_drag: 1.5,

            camera_offset: Vec3::new(0.0, 4.5, -8.0),
            camera_look_ahead: 6.0,
            camera_look_up: 1.2,
            camera_smoothing: 0.9,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check the relationships the phase machine relies on
    pub fn validate(&self) -> Result<(), SessionError> {
        let durations = [
            ("time_limit", self.time_limit),
            ("turn_duration", self.turn_duration),
            ("watch_duration", self.watch_duration),
            ("respawn_delay", self.respawn_delay),
            ("win_delay", self.win_delay),
            ("max_frame_dt", self.max_frame_dt),
        ];
        for (name, value) in durations {
            if !(value > 0.0) {
                return Err(SessionError::InvalidTuning(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let rates = [
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("deceleration", self.deceleration),
        ];
        for (name, value) in rates {
            if !(value > 0.0) {
                return Err(SessionError::InvalidTuning(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let thresholds = [
            ("motion_epsilon", self.motion_epsilon),
            ("violation_distance", self.violation_distance),
            ("violation_velocity", self.violation_velocity),
        ];
        for (name, value) in thresholds {
            if !(value >= 0.0) {
                return Err(SessionError::InvalidTuning(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        if !(0.0..1.0).contains(&self.camera_smoothing) {
            return Err(SessionError::InvalidTuning(format!(
                "camera_smoothing must lie in [0, 1), got {}",
                self.camera_smoothing
            )));
        }
        if !self.cue_duration_fits(self.default_cue_duration) {
            return Err(SessionError::InvalidTuning(format!(
                "default_cue_duration ({}) must exceed turn_duration ({})",
                self.default_cue_duration, self.turn_duration
            )));
        }
        if self.max_frame_dt > self.turn_duration {
            return Err(SessionError::InvalidTuning(format!(
                "max_frame_dt ({}) must not exceed turn_duration ({})",
                self.max_frame_dt, self.turn_duration
            )));
        }
        if self.finish_z <= self.start_z {
            return Err(SessionError::InvalidTuning(
                "finish_z must lie ahead of start_z".to_string(),
            ));
        }
        if self.debris_speed_min > self.debris_speed_max {
            return Err(SessionError::InvalidTuning(
                "debris_speed_min exceeds debris_speed_max".to_string(),
            ));
        }
        if self.player_half_extent >= self.track_half_width {
            return Err(SessionError::InvalidTuning(
                "player does not fit on the track".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a cue of this length leaves room for a facing-away phase
    pub fn cue_duration_fits(&self, cue_duration: f32) -> bool {
        cue_duration > self.turn_duration
    }

    /// Where the player stands in Ready
    pub fn start_position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.start_z)
    }

    /// Lateral clamp for the player's center
    pub fn lateral_limit(&self) -> f32 {
        self.track_half_width - self.player_half_extent
    }
}
