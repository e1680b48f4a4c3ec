//! Shell-owned session context
//!
//! The flags the menu shell keeps across minigame sessions. Passed by
//! reference into each session instead of living in globals.

use crate::audio::effective_volume;
use crate::record::{GameStatus, OutcomeRecord};
use crate::sim::Outcome;

#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Global mute toggle from the menu
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// A minigame session is currently open
    pub in_session: bool,
    /// Outcomes reported so far
    pub record: OutcomeRecord,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            muted: false,
            master_volume: 0.8,
            in_session: false,
            record: OutcomeRecord::new(),
        }
    }
}

impl SessionContext {
    pub fn new(muted: bool) -> Self {
        Self {
            muted,
            ..Default::default()
        }
    }

    /// Volume a session should start with
    pub fn volume(&self) -> f32 {
        effective_volume(self.muted, self.master_volume)
    }

    /// Mark a session as open. Returns false if one already is.
    pub fn begin(&mut self) -> bool {
        if self.in_session {
            log::warn!("Session already open");
            return false;
        }
        self.in_session = true;
        true
    }

    /// Record the final outcome and close the session
    pub fn finish(&mut self, outcome: Outcome, completion_time: Option<f32>, timestamp: f64) {
        self.record.add(outcome, completion_time, timestamp);
        self.in_session = false;
        log::info!(
            "Session finished: {} (status {})",
            outcome.as_str(),
            self.status().as_str()
        );
    }

    pub fn status(&self) -> GameStatus {
        self.record.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_is_exclusive() {
        let mut ctx = SessionContext::default();
        assert!(ctx.begin());
        assert!(!ctx.begin());
        ctx.finish(Outcome::Exited, None, 0.0);
        assert!(ctx.begin());
    }

    #[test]
    fn test_muted_volume() {
        let ctx = SessionContext::new(true);
        assert_eq!(ctx.volume(), 0.0);
        assert_eq!(SessionContext::new(false).volume(), 0.8);
    }

    #[test]
    fn test_finish_updates_status() {
        let mut ctx = SessionContext::default();
        ctx.begin();
        ctx.finish(Outcome::Failed, None, 1.0);
        assert_eq!(ctx.status(), GameStatus::Failed);
        assert!(!ctx.in_session);
    }
}
