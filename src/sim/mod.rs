//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Time only arrives as `dt`
//! - Seeded RNG only (effects)
//! - Side effects leave as `GameEvent`s
//! - No rendering or platform dependencies

pub mod camera;
pub mod effects;
pub mod frame;
pub mod motion;
pub mod outcome;
pub mod phase;
pub mod state;
pub mod tick;
pub mod violation;

pub use camera::CameraRig;
pub use effects::{Effects, Particle};
pub use frame::{FrameView, ParticleView};
pub use state::{
    Doll, GameEvent, GamePhase, GameState, LossReason, Outcome, PhaseState, PlayerState,
};
pub use tick::{TickInput, camera_anchor, tick};
