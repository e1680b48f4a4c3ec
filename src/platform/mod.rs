//! Platform abstraction layer
//!
//! Everything the session talks to outside the simulation:
//! - Frame timing (`time`)
//! - Keyboard mapping (`input`)
//! - Status text, scene hand-off and input listener ownership (traits below)
//! - Browser implementations (`web`, wasm32 only)

pub mod input;
pub mod time;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{Key, map_key};
pub use time::FrameClock;

use crate::audio::CueAudio;
use crate::sim::{FrameView, Outcome};

/// Where player-facing status lines go
pub trait StatusSink {
    fn show(&mut self, text: &str);
}

/// The render surface. Receives one view per frame and owns the geometry.
pub trait SceneSink {
    fn present(&mut self, frame: &FrameView);

    /// Free geometry and materials. Called once on dispose.
    fn release(&mut self);
}

/// Input listeners registered on behalf of the session
pub trait InputListeners {
    /// Remove every listener. Called once on dispose.
    fn detach(&mut self);
}

/// Callback fired exactly once with the session's final outcome
pub type ExitCallback = Box<dyn FnMut(Outcome)>;

/// Collaborators handed over by the menu shell at construction
pub struct SessionHost {
    pub audio: Box<dyn CueAudio>,
    pub status: Box<dyn StatusSink>,
    pub scene: Box<dyn SceneSink>,
    pub listeners: Box<dyn InputListeners>,
    pub on_exit: ExitCallback,
}

impl SessionHost {
    /// Host with logging stand-ins for everything but the exit callback
    pub fn headless(on_exit: ExitCallback) -> Self {
        Self {
            audio: Box::new(crate::audio::SilentAudio::new()),
            status: Box::new(LogStatus),
            scene: Box::new(NullScene),
            listeners: Box::new(NoListeners),
            on_exit,
        }
    }
}

/// Status lines to the log
#[derive(Debug, Default)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn show(&mut self, text: &str) {
        log::info!("[status] {}", text);
    }
}

/// Scene that draws nothing
#[derive(Debug, Default)]
pub struct NullScene;

impl SceneSink for NullScene {
    fn present(&mut self, _frame: &FrameView) {}

    fn release(&mut self) {}
}

/// For hosts that feed input directly rather than through listeners
#[derive(Debug, Default)]
pub struct NoListeners;

impl InputListeners for NoListeners {
    fn detach(&mut self) {}
}
