//! Red Light, Green Light entry point
//!
//! The browser build is a library driven by the menu shell through
//! `platform::web`. Natively this plays one scripted session headless and
//! logs how it went.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::time::{SystemTime, UNIX_EPOCH};

    use red_light::consts::DEFAULT_FRAME_DT;
    use red_light::platform::{Key, SessionHost};
    use red_light::session::{AssetReport, Session};
    use red_light::sim::{GamePhase, Outcome, PhaseState};
    use red_light::{SessionContext, SessionError, Tuning};

    /// Release forward this long before the doll starts turning
    const STOP_MARGIN: f32 = 0.35;

    /// Autopilot: run while the doll sings, stand still otherwise
    fn wants_forward(session: &Session) -> bool {
        match session.state().phase {
            PhaseState::Ready => true,
            PhaseState::Moving { timer } => timer > STOP_MARGIN,
            _ => false,
        }
    }

    fn now_ms() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or_default()
    }

    fn load_tuning() -> Result<Tuning, SessionError> {
        match std::env::args().nth(1) {
            Some(path) => {
                let json = std::fs::read_to_string(&path)
                    .map_err(|e| SessionError::asset(path.as_str(), e))?;
                log::info!("Tuning overrides from {}", path);
                Tuning::from_json(&json)
            }
            None => Ok(Tuning::default()),
        }
    }

    pub fn run() -> Result<(), SessionError> {
        let tuning = load_tuning()?;
        let budget = tuning.time_limit
            + tuning.respawn_delay
            + tuning.win_delay
            + tuning.default_cue_duration;
        let max_frames = (budget / DEFAULT_FRAME_DT).ceil() as usize;

        let mut ctx = SessionContext::new(true);
        ctx.begin();

        let host = SessionHost::headless(Box::new(|outcome: Outcome| {
            log::info!("Exit callback: {}", outcome.as_str());
        }));
        let mut session = Session::new(&ctx, tuning, host)?;
        session.finish_loading(AssetReport::default());

        let mut held = false;
        let mut last_phase = session.phase();
        for frame in 0..max_frames {
            if session.outcome().is_some() {
                break;
            }

            let forward = wants_forward(&session);
            if forward && !held {
                session.key_down(Key::Forward);
            } else if !forward && held {
                session.key_up(Key::Forward);
            }
            held = forward;

            session.advance_frame(DEFAULT_FRAME_DT);

            let phase = session.phase();
            if phase != last_phase {
                log::debug!(
                    "frame {:5}: {} at z={:.2}",
                    frame,
                    phase.as_str(),
                    session.state().player.pos.z
                );
                last_phase = phase;
            }
            if phase == GamePhase::Lost {
                // One round is enough to show the loss flow
                session.exit();
            }
        }

        if session.outcome().is_none() {
            log::warn!("Frame budget ran out, exiting");
            session.exit();
        }
        session.record_into(&mut ctx, now_ms());
        session.dispose();

        let record = &ctx.record;
        log::info!(
            "Status: {} after {} attempt(s){}",
            ctx.status().as_str(),
            record.attempts(),
            record
                .best_time()
                .map(|t| format!(", best time {:.2}s", t))
                .unwrap_or_default()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Red Light, Green Light (headless) starting...");

    if let Err(e) = demo::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The shell drives the library through platform::web; nothing to do here
}
