//! Audio for the minigame
//!
//! The doll's cue is a decoded sample; the explosion and win fanfare are
//! generated procedurally. The output device belongs to the menu shell and
//! is only borrowed here.

use crate::error::SessionError;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{WebAudio, load_cue_buffer};

/// Cosmetic one-shot sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    /// Player caught by the doll
    Explosion,
    /// Finish line crossed
    Fanfare,
}

/// Audio operations the session needs
pub trait CueAudio {
    /// Resume the output device after a user gesture
    fn unlock(&mut self);

    /// Play the cue from the beginning, replacing any cue in flight.
    ///
    /// Returns [`SessionError::AudioPlaybackBlocked`] while the device is
    /// still locked; the caller retries later.
    fn start_cue(&mut self) -> Result<(), SessionError>;

    fn stop_cue(&mut self);

    fn is_cue_playing(&self) -> bool;

    /// Length of the cue sample, if one loaded
    fn cue_duration(&self) -> Option<f32>;

    fn play_sfx(&mut self, sfx: Sfx);

    /// Output volume for everything this session plays (0.0 - 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Stop and disconnect everything this session owns. Must not close the
    /// shared device and must tolerate repeated calls.
    fn release(&mut self);
}

/// Volume after applying the mute flag
#[inline]
pub fn effective_volume(muted: bool, master_volume: f32) -> f32 {
    if muted {
        0.0
    } else {
        master_volume.clamp(0.0, 1.0)
    }
}

/// Audio backend for headless runs and for sessions whose device failed
#[derive(Debug, Default)]
pub struct SilentAudio {
    cue_playing: bool,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CueAudio for SilentAudio {
    fn unlock(&mut self) {}

    fn start_cue(&mut self) -> Result<(), SessionError> {
        self.cue_playing = true;
        Ok(())
    }

    fn stop_cue(&mut self) {
        self.cue_playing = false;
    }

    fn is_cue_playing(&self) -> bool {
        self.cue_playing
    }

    fn cue_duration(&self) -> Option<f32> {
        None
    }

    fn play_sfx(&mut self, sfx: Sfx) {
        log::trace!("(silent) {:?}", sfx);
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn release(&mut self) {
        self.cue_playing = false;
    }
}
