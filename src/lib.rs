//! Red Light, Green Light - a timed doll-watching minigame
//!
//! Core modules:
//! - `sim`: Deterministic simulation (phase machine, motion, effects, camera)
//! - `session`: Per-game session lifecycle driven by the menu shell
//! - `platform`: Browser/native platform abstraction
//! - `audio`: Cue playback and cosmetic sound effects
//! - `tuning`: Data-driven game balance
//! - `context`: Shell-owned session flags and outcome record

pub mod audio;
pub mod context;
pub mod error;
pub mod platform;
pub mod record;
pub mod session;
pub mod sim;
pub mod tuning;

pub use context::SessionContext;
pub use error::SessionError;
pub use record::OutcomeRecord;
pub use session::Session;
pub use tuning::Tuning;

/// Game configuration constants that are not tunable
pub mod consts {
    use std::f32::consts::PI;

    /// Frame time assumed before the clock has a previous timestamp
    pub const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;

    /// Doll facing the player (watching)
    pub const FACING_TOWARD: f32 = 0.0;
    /// Doll facing away from the player (singing)
    pub const FACING_AWAY: f32 = PI;

    /// Slack on timer expiry so that frame sequences summing to a duration
    /// expire on the last frame despite float accumulation error
    pub const TIMER_EPSILON: f32 = 1e-4;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed shortest rotation taking `from` onto `to`
#[inline]
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}
