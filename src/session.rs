//! One minigame session, from asset loading to the reported outcome
//!
//! Owns the simulation and the host collaborators. The shell feeds it key
//! events and frame times; it turns simulation events into audio, status
//! lines and the final exit callback.

use crate::audio::{Sfx, effective_volume};
use crate::context::SessionContext;
use crate::error::SessionError;
use crate::platform::{Key, SessionHost};
use crate::sim::{
    FrameView, GameEvent, GamePhase, GameState, Outcome, PhaseState, TickInput, tick,
};
use crate::tuning::Tuning;

/// Player-facing status lines
pub mod status {
    pub const READY: &str = "Press ↑ to start";
    pub const GREEN: &str = "Green light!";
    pub const RED: &str = "Red light!";
    pub const WON: &str = "You made it!";
}

/// Base for effect seeds; mixed with the attempt count so bursts differ
const SEED_BASE: u64 = 0x5eed_0f_d011;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Assets still loading, frames are ignored
    Loading,
    Running,
    /// Torn down; nothing runs any more
    Disposed,
}

/// Result of the async asset loads
#[derive(Debug, Default)]
pub struct AssetReport {
    /// Length of the decoded cue, when it loaded
    pub cue_duration: Option<f32>,
    /// Loads that failed; the session runs without them
    pub failures: Vec<SessionError>,
}

pub struct Session {
    state: GameState,
    lifecycle: Lifecycle,
    host: SessionHost,
    input: TickInput,
    muted: bool,
    master_volume: f32,
    /// Audio device resumed on the first key press; never repeated
    audio_unlocked: bool,
    /// A cue start was refused by the browser and should be retried
    cue_pending: bool,
    /// A round has been lost since the session opened
    failed: bool,
    /// Seconds from start to the finish line
    completion_time: Option<f32>,
    reported: Option<Outcome>,
    /// The reported outcome has been written to a context
    recorded: bool,
}

impl Session {
    pub fn new(
        ctx: &SessionContext,
        tuning: Tuning,
        host: SessionHost,
    ) -> Result<Self, SessionError> {
        let seed = SEED_BASE.wrapping_add(ctx.record.attempts() as u64);
        Self::with_seed(ctx, tuning, host, seed)
    }

    /// Like [`Session::new`] with an explicit effect seed
    pub fn with_seed(
        ctx: &SessionContext,
        tuning: Tuning,
        mut host: SessionHost,
        seed: u64,
    ) -> Result<Self, SessionError> {
        if let Err(e) = tuning.validate() {
            // Nothing else will release what the shell already registered
            host.listeners.detach();
            host.audio.release();
            host.scene.release();
            return Err(e);
        }

        host.audio.set_volume(ctx.volume());
        log::info!(
            "Session created (seed {:#x}, muted: {}, finish at z={:.1})",
            seed,
            ctx.muted,
            tuning.finish_z
        );

        Ok(Self {
            state: GameState::new(tuning, seed),
            lifecycle: Lifecycle::Loading,
            host,
            input: TickInput::default(),
            muted: ctx.muted,
            master_volume: ctx.master_volume,
            audio_unlocked: false,
            cue_pending: false,
            failed: false,
            completion_time: None,
            reported: None,
            recorded: false,
        })
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The outcome handed to the exit callback, once reported
    pub fn outcome(&self) -> Option<Outcome> {
        self.reported
    }

    pub fn completion_time(&self) -> Option<f32> {
        self.completion_time
    }

    /// Write the reported outcome into the shell's record, once
    pub fn record_into(&mut self, ctx: &mut SessionContext, timestamp: f64) {
        let Some(outcome) = self.reported else {
            return;
        };
        if self.recorded {
            return;
        }
        self.recorded = true;
        let completion_time = match outcome {
            Outcome::Passed => self.completion_time,
            _ => None,
        };
        ctx.finish(outcome, completion_time, timestamp);
    }

    /// Assets have settled; start accepting frames
    pub fn finish_loading(&mut self, report: AssetReport) {
        if self.lifecycle != Lifecycle::Loading {
            log::warn!("finish_loading called while {:?}", self.lifecycle);
            return;
        }

        for failure in &report.failures {
            log::warn!("{} (continuing without it)", failure);
        }

        match report.cue_duration.or_else(|| self.host.audio.cue_duration()) {
            Some(duration) => self.state.set_cue_duration(duration),
            None => log::warn!(
                "No cue length available, using {:.2}s",
                self.state.cue_duration
            ),
        }

        self.lifecycle = Lifecycle::Running;
        self.host.status.show(status::READY);
        self.present();
        log::info!("Session running");
    }

    pub fn key_down(&mut self, key: Key) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }

        if !self.audio_unlocked {
            self.audio_unlocked = true;
            self.host.audio.unlock();
        }

        match key {
            Key::Forward => {
                self.input.moving_forward = true;
                if self.lifecycle == Lifecycle::Running && self.state.phase() == GamePhase::Ready
                {
                    self.input.start = true;
                }
                self.retry_cue();
            }
            Key::Exit => self.exit(),
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if key == Key::Forward {
            self.input.moving_forward = false;
        }
    }

    /// Run one full update and hand the result to the scene
    pub fn advance_frame(&mut self, dt: f32) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }

        tick(&mut self.state, &self.input, dt);
        self.input.start = false;

        for event in self.state.drain_events() {
            self.handle_event(event);
            if self.lifecycle != Lifecycle::Running {
                return;
            }
        }

        self.retry_cue();
        self.present();
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }

        let newly_muted = muted && !self.muted;
        self.muted = muted;
        self.host
            .audio
            .set_volume(effective_volume(muted, self.master_volume));
        if newly_muted {
            self.cue_pending = false;
            if self.host.audio.is_cue_playing() {
                self.host.audio.stop_cue();
            }
        }
        log::info!("Muted: {}", muted);
    }

    /// Leave the minigame now.
    ///
    /// Reports `Failed` if a round was lost and the player is not standing
    /// on a win, otherwise `Exited`; then tears the session down.
    pub fn exit(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }

        let outcome = if self.failed && !matches!(self.state.phase, PhaseState::Won { .. }) {
            Outcome::Failed
        } else {
            Outcome::Exited
        };
        log::info!("Exit requested during {}", self.state.phase().as_str());
        self.report(outcome);
    }

    /// Release everything this session owns. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        self.lifecycle = Lifecycle::Disposed;

        self.host.listeners.detach();
        self.host.audio.stop_cue();
        self.host.audio.release();
        self.host.scene.release();
        self.state.effects.clear();
        self.input = TickInput::default();
        self.cue_pending = false;
        log::info!("Session disposed");
    }

    fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Started => log::debug!("First forward press"),

            GameEvent::PhaseChanged { to, .. } => match to {
                GamePhase::Moving => self.host.status.show(status::GREEN),
                GamePhase::TurningToWatch => self.host.status.show(status::RED),
                _ => {}
            },

            GameEvent::CueStart => self.start_cue(),

            GameEvent::CueStop => {
                self.cue_pending = false;
                self.host.audio.stop_cue();
            }

            GameEvent::Lost { reason, .. } => {
                self.failed = true;
                self.host.status.show(reason.message());
                self.host.audio.play_sfx(Sfx::Explosion);
            }

            GameEvent::Won => {
                let elapsed = self.state.tuning.time_limit - self.state.match_timer;
                self.completion_time = Some(elapsed);
                self.host.status.show(status::WON);
                self.host.audio.play_sfx(Sfx::Fanfare);
            }

            GameEvent::Respawned => self.host.status.show(status::READY),

            GameEvent::Finished(outcome) => self.report(outcome),
        }
    }

    fn start_cue(&mut self) {
        if self.muted {
            return;
        }
        match self.host.audio.start_cue() {
            Ok(()) => self.cue_pending = false,
            Err(SessionError::AudioPlaybackBlocked(reason)) => {
                log::debug!("Cue blocked ({}), will retry", reason);
                self.cue_pending = true;
            }
            Err(e) => {
                log::warn!("Cue playback failed: {}", e);
                self.cue_pending = false;
            }
        }
    }

    /// Try a blocked cue again while the doll is still singing
    fn retry_cue(&mut self) {
        if !self.cue_pending {
            return;
        }
        if self.state.phase().wants_cue() {
            self.start_cue();
        } else {
            self.cue_pending = false;
        }
    }

    fn present(&mut self) {
        let frame = FrameView::capture(&self.state);
        self.host.scene.present(&frame);
    }

    /// Hand the outcome to the shell exactly once and tear down
    fn report(&mut self, outcome: Outcome) {
        if self.reported.is_some() {
            return;
        }
        self.reported = Some(outcome);
        log::info!("Reporting outcome: {}", outcome.as_str());
        self.dispose();
        (self.host.on_exit)(outcome);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CueAudio;
    use crate::platform::{InputListeners, SceneSink, StatusSink};
    use crate::sim::LossReason;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    /// Everything the fakes observed
    #[derive(Debug, Default)]
    struct Log {
        unlocks: usize,
        cue_starts: usize,
        cue_stops: usize,
        cue_playing: bool,
        /// Refuse this many cue starts before allowing one
        block_cue: usize,
        volume: Option<f32>,
        sfx: Vec<Sfx>,
        audio_releases: usize,
        statuses: Vec<String>,
        frames: usize,
        scene_releases: usize,
        detaches: usize,
        outcomes: Vec<Outcome>,
    }

    type Shared = Rc<RefCell<Log>>;

    struct FakeAudio(Shared);

    impl CueAudio for FakeAudio {
        fn unlock(&mut self) {
            self.0.borrow_mut().unlocks += 1;
        }

        fn start_cue(&mut self) -> Result<(), SessionError> {
            let mut log = self.0.borrow_mut();
            if log.block_cue > 0 {
                log.block_cue -= 1;
                return Err(SessionError::AudioPlaybackBlocked("locked".into()));
            }
            log.cue_starts += 1;
            log.cue_playing = true;
            Ok(())
        }

        fn stop_cue(&mut self) {
            let mut log = self.0.borrow_mut();
            log.cue_stops += 1;
            log.cue_playing = false;
        }

        fn is_cue_playing(&self) -> bool {
            self.0.borrow().cue_playing
        }

        fn cue_duration(&self) -> Option<f32> {
            None
        }

        fn play_sfx(&mut self, sfx: Sfx) {
            self.0.borrow_mut().sfx.push(sfx);
        }

        fn set_volume(&mut self, volume: f32) {
            self.0.borrow_mut().volume = Some(volume);
        }

        fn release(&mut self) {
            self.0.borrow_mut().audio_releases += 1;
        }
    }

    struct FakeStatus(Shared);

    impl StatusSink for FakeStatus {
        fn show(&mut self, text: &str) {
            self.0.borrow_mut().statuses.push(text.to_string());
        }
    }

    struct FakeScene(Shared);

    impl SceneSink for FakeScene {
        fn present(&mut self, _frame: &FrameView) {
            self.0.borrow_mut().frames += 1;
        }

        fn release(&mut self) {
            self.0.borrow_mut().scene_releases += 1;
        }
    }

    struct FakeListeners(Shared);

    impl InputListeners for FakeListeners {
        fn detach(&mut self) {
            self.0.borrow_mut().detaches += 1;
        }
    }

    fn host(log: &Shared) -> SessionHost {
        let on_exit = {
            let log = log.clone();
            Box::new(move |outcome: Outcome| log.borrow_mut().outcomes.push(outcome))
        };
        SessionHost {
            audio: Box::new(FakeAudio(log.clone())),
            status: Box::new(FakeStatus(log.clone())),
            scene: Box::new(FakeScene(log.clone())),
            listeners: Box::new(FakeListeners(log.clone())),
            on_exit,
        }
    }

    fn running(tuning: Tuning) -> (Session, Shared) {
        let log = Shared::default();
        let ctx = SessionContext::default();
        let mut session = Session::with_seed(&ctx, tuning, host(&log), 3).unwrap();
        session.finish_loading(AssetReport::default());
        (session, log)
    }

    fn run_until(session: &mut Session, phase: GamePhase, max: usize) {
        for _ in 0..max {
            if session.phase() == phase {
                return;
            }
            session.advance_frame(DT);
        }
        panic!("never reached {:?}, stuck in {:?}", phase, session.phase());
    }

    #[test]
    fn test_loading_ignores_frames() {
        let log = Shared::default();
        let ctx = SessionContext::default();
        let mut session = Session::with_seed(&ctx, Tuning::default(), host(&log), 1).unwrap();
        session.key_down(Key::Forward);
        session.advance_frame(DT);
        assert_eq!(log.borrow().frames, 0);
        assert_eq!(session.lifecycle(), Lifecycle::Loading);

        session.finish_loading(AssetReport {
            cue_duration: Some(6.0),
            failures: vec![SessionError::asset("labels.json", "404")],
        });
        assert_eq!(session.lifecycle(), Lifecycle::Running);
        assert_eq!(session.state().cue_duration, 6.0);
        assert_eq!(log.borrow().statuses, vec![status::READY]);

        // The press during loading must not have armed the start trigger
        session.advance_frame(DT);
        assert_eq!(session.phase(), GamePhase::Ready);
    }

    #[test]
    fn test_invalid_tuning_releases_host() {
        let log = Shared::default();
        let tuning = Tuning {
            turn_duration: 0.0,
            ..Default::default()
        };
        let result = Session::new(&SessionContext::default(), tuning, host(&log));
        assert!(matches!(result, Err(SessionError::InvalidTuning(_))));
        let log = log.borrow();
        assert_eq!(log.detaches, 1);
        assert!(log.outcomes.is_empty());
    }

    #[test]
    fn test_holding_forward_loses_and_reports_failed() {
        let (mut session, log) = running(Tuning::default());
        session.key_down(Key::Forward);
        run_until(&mut session, GamePhase::Lost, 2000);

        {
            let log = log.borrow();
            assert!(log.statuses.iter().any(|s| s == status::RED));
            assert!(
                log.statuses
                    .iter()
                    .any(|s| s == LossReason::MovedDuringRedLight.message())
            );
            assert_eq!(log.sfx, vec![Sfx::Explosion]);
            assert!(!log.cue_playing);
        }

        // Respawn keeps the failure sticky
        session.key_up(Key::Forward);
        run_until(&mut session, GamePhase::Ready, 2000);
        session.exit();
        assert_eq!(log.borrow().outcomes, vec![Outcome::Failed]);
    }

    #[test]
    fn test_halting_then_crossing_passes() {
        let tuning = Tuning {
            finish_z: 6.0,
            ..Default::default()
        };
        let (mut session, log) = running(tuning);

        // One second of running during the first green light
        session.key_down(Key::Forward);
        for _ in 0..60 {
            session.advance_frame(DT);
        }
        session.key_up(Key::Forward);
        run_until(&mut session, GamePhase::Watching, 2000);
        run_until(&mut session, GamePhase::Moving, 2000);
        assert!(session.state().player.pos.z < 6.0);

        session.key_down(Key::Forward);
        run_until(&mut session, GamePhase::Won, 2000);
        session.key_up(Key::Forward);
        assert!(session.completion_time().is_some());

        for _ in 0..600 {
            session.advance_frame(DT);
        }
        assert_eq!(session.outcome(), Some(Outcome::Passed));
        let log = log.borrow();
        assert_eq!(log.outcomes, vec![Outcome::Passed]);
        assert!(log.statuses.iter().any(|s| s == status::WON));
        assert_eq!(log.sfx, vec![Sfx::Fanfare]);
        assert_eq!(log.detaches, 1);
    }

    #[test]
    fn test_exit_during_watching_reports_exited_immediately() {
        let (mut session, log) = running(Tuning::default());
        session.key_down(Key::Forward);
        session.key_up(Key::Forward);
        run_until(&mut session, GamePhase::Watching, 2000);

        session.exit();
        let frames = log.borrow().frames;
        {
            let log = log.borrow();
            assert_eq!(log.outcomes, vec![Outcome::Exited]);
            assert_eq!(log.detaches, 1);
            assert!(!log.cue_playing);
        }
        assert_eq!(session.lifecycle(), Lifecycle::Disposed);

        for _ in 0..10 {
            session.advance_frame(DT);
        }
        session.key_down(Key::Forward);
        session.exit();
        let log = log.borrow();
        assert_eq!(log.frames, frames);
        assert_eq!(log.outcomes.len(), 1);
    }

    #[test]
    fn test_record_into_once() {
        let tuning = Tuning {
            finish_z: 2.0,
            ..Default::default()
        };
        let (mut session, _log) = running(tuning);
        let mut ctx = SessionContext::default();
        ctx.begin();

        session.record_into(&mut ctx, 1.0);
        assert!(ctx.record.is_empty());

        session.key_down(Key::Forward);
        run_until(&mut session, GamePhase::Won, 2000);
        session.exit();
        session.record_into(&mut ctx, 2.0);
        session.record_into(&mut ctx, 3.0);

        assert_eq!(ctx.record.attempts(), 1);
        assert_eq!(ctx.record.last(), Some(Outcome::Exited));
        assert_eq!(ctx.record.best_time(), None);
        assert!(!ctx.in_session);
    }

    #[test]
    fn test_exit_key_exits() {
        let (mut session, log) = running(Tuning::default());
        session.key_down(Key::Exit);
        assert_eq!(log.borrow().outcomes, vec![Outcome::Exited]);
    }

    #[test]
    fn test_dispose_twice_releases_once() {
        let (mut session, log) = running(Tuning::default());
        session.dispose();
        session.dispose();
        drop(session);
        let log = log.borrow();
        assert_eq!(log.detaches, 1);
        assert_eq!(log.audio_releases, 1);
        assert_eq!(log.scene_releases, 1);
        assert!(log.outcomes.is_empty());
    }

    #[test]
    fn test_dispose_while_loading() {
        let log = Shared::default();
        let ctx = SessionContext::default();
        let mut session = Session::with_seed(&ctx, Tuning::default(), host(&log), 1).unwrap();
        session.dispose();
        session.finish_loading(AssetReport::default());
        session.advance_frame(DT);
        assert_eq!(session.lifecycle(), Lifecycle::Disposed);
        assert_eq!(log.borrow().frames, 0);
    }

    #[test]
    fn test_mute_stops_cue() {
        let (mut session, log) = running(Tuning::default());
        session.key_down(Key::Forward);
        session.advance_frame(DT);
        assert!(log.borrow().cue_playing);

        session.set_muted(true);
        {
            let log = log.borrow();
            assert!(!log.cue_playing);
            assert_eq!(log.volume, Some(0.0));
        }

        session.set_muted(false);
        assert_eq!(log.borrow().volume, Some(0.8));
    }

    #[test]
    fn test_mute_without_cue_leaves_audio_alone() {
        let (mut session, log) = running(Tuning::default());
        session.set_muted(true);
        let log = log.borrow();
        assert_eq!(log.cue_stops, 0);
        assert_eq!(log.volume, Some(0.0));
    }

    #[test]
    fn test_muted_session_never_starts_cue() {
        let log = Shared::default();
        let ctx = SessionContext::new(true);
        let mut session = Session::with_seed(&ctx, Tuning::default(), host(&log), 1).unwrap();
        session.finish_loading(AssetReport::default());
        assert_eq!(log.borrow().volume, Some(0.0));

        session.key_down(Key::Forward);
        session.advance_frame(DT);
        assert_eq!(log.borrow().cue_starts, 0);
        assert_eq!(session.phase(), GamePhase::Moving);
    }

    #[test]
    fn test_blocked_cue_is_retried() {
        let (mut session, log) = running(Tuning::default());
        log.borrow_mut().block_cue = 1;

        session.key_down(Key::Forward);
        session.advance_frame(DT);
        // Refused when the start event fired, retried at the end of the frame
        let log = log.borrow();
        assert_eq!(log.cue_starts, 1);
        assert!(log.cue_playing);
        assert_eq!(log.unlocks, 1);
    }

    #[test]
    fn test_blocked_cue_dropped_when_watching() {
        let (mut session, log) = running(Tuning::default());
        log.borrow_mut().block_cue = usize::MAX;
        session.key_down(Key::Forward);
        session.key_up(Key::Forward);
        run_until(&mut session, GamePhase::Watching, 2000);
        assert!(!session.cue_pending);
    }

    #[test]
    fn test_unlock_happens_once() {
        let (mut session, log) = running(Tuning::default());
        session.key_down(Key::Forward);
        session.key_up(Key::Forward);
        session.key_down(Key::Forward);
        assert_eq!(log.borrow().unlocks, 1);
    }

    #[test]
    fn test_status_cycle() {
        let (mut session, log) = running(Tuning::default());
        session.key_down(Key::Forward);
        session.key_up(Key::Forward);
        run_until(&mut session, GamePhase::TurningToMove, 2000);
        run_until(&mut session, GamePhase::Moving, 2000);
        let log = log.borrow();
        assert_eq!(
            log.statuses,
            vec![status::READY, status::GREEN, status::RED, status::GREEN]
        );
    }
}
