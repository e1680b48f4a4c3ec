//! Web Audio backend
//!
//! The cue plays from a decoded `AudioBuffer`; sound effects are built from
//! oscillators with gain envelopes. Everything routes through one session
//! gain node so muting and teardown are a single switch.

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AudioBuffer, AudioBufferSourceNode, AudioContext, AudioContextState, GainNode, OscillatorNode,
    OscillatorType, Response,
};

use super::{CueAudio, Sfx};
use crate::error::SessionError;

/// Fetch and decode the cue sample
pub async fn load_cue_buffer(ctx: &AudioContext, url: &str) -> Result<AudioBuffer, SessionError> {
    let fail = |e: wasm_bindgen::JsValue| SessionError::asset(url, format!("{:?}", e));

    let window = web_sys::window().ok_or_else(|| SessionError::asset(url, "no window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(fail)?
        .dyn_into()
        .map_err(fail)?;
    if !response.ok() {
        return Err(SessionError::asset(url, format!("HTTP {}", response.status())));
    }

    let bytes: js_sys::ArrayBuffer = JsFuture::from(response.array_buffer().map_err(fail)?)
        .await
        .map_err(fail)?
        .dyn_into()
        .map_err(fail)?;
    let buffer: AudioBuffer = JsFuture::from(ctx.decode_audio_data(&bytes).map_err(fail)?)
        .await
        .map_err(fail)?
        .dyn_into()
        .map_err(fail)?;

    log::info!("Loaded cue {} ({:.2}s)", url, buffer.duration());
    Ok(buffer)
}

/// Session audio on top of the shell's `AudioContext`
pub struct WebAudio {
    /// Borrowed from the shell, never closed here
    ctx: AudioContext,
    gain: Option<GainNode>,
    cue_buffer: Option<AudioBuffer>,
    cue_source: Option<AudioBufferSourceNode>,
    volume: f32,
}

impl WebAudio {
    pub fn new(ctx: AudioContext, cue_buffer: Option<AudioBuffer>, volume: f32) -> Self {
        let gain = ctx.create_gain().ok().and_then(|gain| {
            gain.gain().set_value(volume);
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some(gain)
        });
        if gain.is_none() {
            log::warn!("Failed to create session gain node - audio disabled");
        }
        Self {
            ctx,
            gain,
            cue_buffer,
            cue_source: None,
            volume,
        }
    }

    fn is_suspended(&self) -> bool {
        self.ctx.state() == AudioContextState::Suspended
    }

    /// Create an oscillator with gain envelope feeding the session gain
    fn create_osc(&self, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
        let out = self.gain.as_ref()?;
        let osc = self.ctx.create_oscillator().ok()?;
        let env = self.ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&env).ok()?;
        env.connect_with_audio_node(out).ok()?;

        Some((osc, env))
    }

    /// Explosion - low sawtooth drop with a crack on top
    fn play_explosion(&self) {
        let t = self.ctx.current_time();

        if let Some((osc, env)) = self.create_osc(110.0, OscillatorType::Sawtooth) {
            env.gain().set_value_at_time(0.6, t).ok();
            env.gain().exponential_ramp_to_value_at_time(0.01, t + 0.5).ok();
            osc.frequency().set_value_at_time(110.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(28.0, t + 0.5)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.6).ok();
        }

        if let Some((osc, env)) = self.create_osc(1400.0, OscillatorType::Square) {
            env.gain().set_value_at_time(0.2, t).ok();
            env.gain().exponential_ramp_to_value_at_time(0.01, t + 0.1).ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }
    }

    /// Fanfare - rising triangle arpeggio
    fn play_fanfare(&self) {
        for (i, freq) in [523.0, 659.0, 784.0, 1047.0].iter().enumerate() {
            let delay = i as f64 * 0.12;
            if let Some((osc, env)) = self.create_osc(*freq, OscillatorType::Triangle) {
                let t = self.ctx.current_time() + delay;
                env.gain().set_value_at_time(0.3, t).ok();
                env.gain().exponential_ramp_to_value_at_time(0.01, t + 0.45).ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.5).ok();
            }
        }
    }
}

impl CueAudio for WebAudio {
    fn unlock(&mut self) {
        if self.is_suspended() {
            if let Err(e) = self.ctx.resume() {
                log::warn!("AudioContext resume failed: {:?}", e);
            }
        }
    }

    fn start_cue(&mut self) -> Result<(), SessionError> {
        self.stop_cue();
        if self.is_suspended() {
            // resume() is async; the next attempt usually succeeds
            if let Err(e) = self.ctx.resume() {
                log::warn!("AudioContext resume failed: {:?}", e);
            }
            return Err(SessionError::AudioPlaybackBlocked(
                "audio context suspended".to_string(),
            ));
        }
        let (Some(buffer), Some(gain)) = (&self.cue_buffer, &self.gain) else {
            return Ok(());
        };

        let source = self
            .ctx
            .create_buffer_source()
            .map_err(|e| SessionError::AudioPlaybackBlocked(format!("{:?}", e)))?;
        source.set_buffer(Some(buffer));
        source
            .connect_with_audio_node(gain)
            .map_err(|e| SessionError::AudioPlaybackBlocked(format!("{:?}", e)))?;
        source
            .start()
            .map_err(|e| SessionError::AudioPlaybackBlocked(format!("{:?}", e)))?;
        self.cue_source = Some(source);
        Ok(())
    }

    fn stop_cue(&mut self) {
        if let Some(source) = self.cue_source.take() {
            source.stop().ok();
            source.disconnect().ok();
        }
    }

    fn is_cue_playing(&self) -> bool {
        self.cue_source.is_some()
    }

    fn cue_duration(&self) -> Option<f32> {
        self.cue_buffer.as_ref().map(|b| b.duration() as f32)
    }

    fn play_sfx(&mut self, sfx: Sfx) {
        if self.volume <= 0.0 || self.is_suspended() {
            return;
        }
        match sfx {
            Sfx::Explosion => self.play_explosion(),
            Sfx::Fanfare => self.play_fanfare(),
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(gain) = &self.gain {
            gain.gain().set_value(self.volume);
        }
    }

    fn release(&mut self) {
        self.stop_cue();
        if let Some(gain) = self.gain.take() {
            gain.disconnect().ok();
        }
        self.cue_buffer = None;
    }
}
