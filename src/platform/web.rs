//! Browser host
//!
//! JS callbacks for status and scene, keyboard listeners on the window, and
//! the handles exported to the menu shell.

use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AudioContext, KeyboardEvent, Window};

use super::{FrameClock, InputListeners, SceneSink, SessionHost, StatusSink, map_key};
use crate::audio::{WebAudio, load_cue_buffer};
use crate::context::SessionContext;
use crate::error::SessionError;
use crate::session::{AssetReport, Session};
use crate::sim::{FrameView, Outcome};
use crate::tuning::Tuning;

type SharedSession = Rc<RefCell<Session>>;
type SharedContext = Rc<RefCell<SessionContext>>;

/// Set once the session exists; listeners registered before that see nothing
type SessionSlot = Rc<OnceCell<Weak<RefCell<Session>>>>;

fn js_error(e: SessionError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Status lines through a JS function `(text: string) => void`
pub struct JsStatus {
    show: js_sys::Function,
}

impl StatusSink for JsStatus {
    fn show(&mut self, text: &str) {
        if let Err(e) = self.show.call1(&JsValue::NULL, &JsValue::from_str(text)) {
            log::warn!("Status callback failed: {:?}", e);
        }
    }
}

/// Scene driven by a JS function `(frameJson: string) => void`
pub struct JsScene {
    present: js_sys::Function,
    release: Option<js_sys::Function>,
}

impl SceneSink for JsScene {
    fn present(&mut self, frame: &FrameView) {
        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Frame serialization failed: {}", e);
                return;
            }
        };
        if let Err(e) = self.present.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            log::warn!("Scene callback failed: {:?}", e);
        }
    }

    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            if let Err(e) = release.call0(&JsValue::NULL) {
                log::warn!("Scene release failed: {:?}", e);
            }
        }
    }
}

/// Window keydown/keyup listeners forwarding to the session.
///
/// Detaching removes them from the window; the closures themselves live as
/// long as the session because a key handler may be the caller.
pub struct KeyboardListeners {
    window: Window,
    keydown: Closure<dyn FnMut(KeyboardEvent)>,
    keyup: Closure<dyn FnMut(KeyboardEvent)>,
    attached: bool,
}

impl KeyboardListeners {
    fn attach(window: Window, slot: SessionSlot, ctx: SharedContext) -> Result<Self, JsValue> {
        let keydown = {
            let slot = slot.clone();
            Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let Some(key) = map_key(&event.key()) else {
                    return;
                };
                let Some(session) = slot.get().and_then(Weak::upgrade) else {
                    return;
                };
                event.prevent_default();
                match session.try_borrow_mut() {
                    Ok(mut session) => {
                        session.key_down(key);
                        record_outcome(&mut session, &ctx);
                    }
                    Err(_) => log::debug!("Key down while session busy"),
                }
            })
        };

        let keyup = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let Some(key) = map_key(&event.key()) else {
                return;
            };
            let Some(session) = slot.get().and_then(Weak::upgrade) else {
                return;
            };
            if let Ok(mut session) = session.try_borrow_mut() {
                session.key_up(key);
            }
        });

        window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;

        Ok(Self {
            window,
            keydown,
            keyup,
            attached: true,
        })
    }
}

impl InputListeners for KeyboardListeners {
    fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        let _ = self
            .window
            .remove_event_listener_with_callback("keydown", self.keydown.as_ref().unchecked_ref());
        let _ = self
            .window
            .remove_event_listener_with_callback("keyup", self.keyup.as_ref().unchecked_ref());
        log::debug!("Keyboard listeners removed");
    }
}

/// Move a reported outcome into the shell's record
fn record_outcome(session: &mut Session, ctx: &SharedContext) {
    if let Ok(mut ctx) = ctx.try_borrow_mut() {
        session.record_into(&mut ctx, js_sys::Date::now());
    }
}

/// Flags the menu shell keeps across minigame sessions
#[wasm_bindgen]
pub struct MenuContext {
    inner: SharedContext,
}

#[wasm_bindgen]
impl MenuContext {
    #[wasm_bindgen(constructor)]
    pub fn new(muted: bool) -> MenuContext {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("Logger already initialized");
        }
        MenuContext {
            inner: Rc::new(RefCell::new(SessionContext::new(muted))),
        }
    }

    pub fn set_muted(&self, muted: bool) {
        self.inner.borrow_mut().muted = muted;
    }

    /// "Not played", "Attempted", "Failed" or "Passed"
    pub fn status(&self) -> String {
        self.inner.borrow().status().as_str().to_string()
    }

    pub fn attempts(&self) -> usize {
        self.inner.borrow().record.attempts()
    }

    pub fn best_time(&self) -> Option<f32> {
        self.inner.borrow().record.best_time()
    }

    /// Start a session. Resolves to a [`RedLightHandle`] once the cue has
    /// loaded (or failed to).
    ///
    /// `present(frameJson)` draws, `show_status(text)` updates the status
    /// line, `on_exit(outcome)` receives "passed", "failed" or "exited".
    #[allow(clippy::too_many_arguments)]
    pub fn create_session(
        &self,
        audio_ctx: AudioContext,
        cue_url: String,
        tuning_json: Option<String>,
        present: js_sys::Function,
        release_scene: Option<js_sys::Function>,
        show_status: js_sys::Function,
        on_exit: js_sys::Function,
    ) -> js_sys::Promise {
        let ctx = self.inner.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let handle = create_session(
                ctx,
                audio_ctx,
                cue_url,
                tuning_json,
                JsScene {
                    present,
                    release: release_scene,
                },
                JsStatus { show: show_status },
                on_exit,
            )
            .await?;
            Ok(JsValue::from(handle))
        })
    }
}

async fn create_session(
    ctx: SharedContext,
    audio_ctx: AudioContext,
    cue_url: String,
    tuning_json: Option<String>,
    scene: JsScene,
    status: JsStatus,
    on_exit: js_sys::Function,
) -> Result<RedLightHandle, JsValue> {
    let tuning = match tuning_json {
        Some(json) => Tuning::from_json(&json).map_err(js_error)?,
        None => Tuning::default(),
    };
    if !ctx.borrow_mut().begin() {
        return Err(JsValue::from_str("a minigame session is already open"));
    }

    let mut report = AssetReport::default();
    let cue_buffer = match load_cue_buffer(&audio_ctx, &cue_url).await {
        Ok(buffer) => {
            report.cue_duration = Some(buffer.duration() as f32);
            Some(buffer)
        }
        Err(e) => {
            report.failures.push(e);
            None
        }
    };

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let performance = window.performance();
    let slot = SessionSlot::default();
    let listeners = KeyboardListeners::attach(window, slot.clone(), ctx.clone())?;

    let volume = ctx.borrow().volume();
    let host = SessionHost {
        audio: Box::new(WebAudio::new(audio_ctx, cue_buffer, volume)),
        status: Box::new(status),
        scene: Box::new(scene),
        listeners: Box::new(listeners),
        on_exit: Box::new(move |outcome: Outcome| {
            if let Err(e) = on_exit.call1(&JsValue::NULL, &JsValue::from_str(outcome.as_str())) {
                log::warn!("Exit callback failed: {:?}", e);
            }
        }),
    };

    let seed = js_sys::Date::now() as u64;
    let session = {
        let ctx_ref = ctx.borrow();
        Session::with_seed(&ctx_ref, tuning, host, seed)
    };
    let session = match session {
        Ok(session) => Rc::new(RefCell::new(session)),
        Err(e) => {
            ctx.borrow_mut().in_session = false;
            return Err(js_error(e));
        }
    };
    let _ = slot.set(Rc::downgrade(&session));

    session.borrow_mut().finish_loading(report);
    log::info!("Red Light, Green Light ready (seed {})", seed);

    Ok(RedLightHandle {
        session,
        ctx,
        clock: FrameClock::new(),
        performance,
    })
}

/// A running session as seen from JS
#[wasm_bindgen]
pub struct RedLightHandle {
    session: SharedSession,
    ctx: SharedContext,
    clock: FrameClock,
    performance: Option<web_sys::Performance>,
}

impl RedLightHandle {
    fn with_session(&self, f: impl FnOnce(&mut Session)) {
        match self.session.try_borrow_mut() {
            Ok(mut session) => {
                f(&mut session);
                record_outcome(&mut session, &self.ctx);
            }
            Err(_) => log::debug!("Session busy, call skipped"),
        }
    }
}

#[wasm_bindgen]
impl RedLightHandle {
    /// Advance by the time elapsed since the previous call
    pub fn advance_frame(&mut self) {
        let now = match &self.performance {
            Some(performance) => performance.now(),
            None => js_sys::Date::now(),
        };
        let dt = self.clock.tick(now);
        self.with_session(|session| session.advance_frame(dt));
    }

    /// Forget the last frame time, e.g. after the tab was hidden
    pub fn reset_clock(&mut self) {
        self.clock.reset();
    }

    pub fn set_muted(&self, muted: bool) {
        if let Ok(mut ctx) = self.ctx.try_borrow_mut() {
            ctx.muted = muted;
        }
        self.with_session(|session| session.set_muted(muted));
    }

    pub fn exit(&self) {
        self.with_session(Session::exit);
    }

    pub fn dispose(&self) {
        self.with_session(Session::dispose);
        if let Ok(mut ctx) = self.ctx.try_borrow_mut() {
            ctx.in_session = false;
        }
    }

    pub fn phase(&self) -> String {
        self.session
            .try_borrow()
            .map(|session| session.phase().as_str().to_string())
            .unwrap_or_default()
    }
}
