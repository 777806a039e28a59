//! Audio sinks
//!
//! The simulation fires named cues and music play/pause requests; a sink
//! turns them into sound. The browser sink synthesizes every cue with the
//! Web Audio API, no sound files needed.

pub use crate::sim::Cue;
use crate::settings::Settings;

/// Fire-and-forget audio collaborator
pub trait AudioSink {
    fn play(&mut self, cue: Cue);
    fn set_music(&mut self, playing: bool);
    fn apply_settings(&mut self, settings: &Settings);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: Cue) {}
    fn set_music(&mut self, _playing: bool) {}
    fn apply_settings(&mut self, _settings: &Settings) {}
}

/// Records what would have been heard (headless runs and tests)
#[derive(Debug, Default, Clone)]
pub struct CueLog {
    pub cues: Vec<Cue>,
    pub music_playing: bool,
    pub muted: bool,
}

impl CueLog {
    pub fn count(&self, cue: Cue) -> usize {
        self.cues.iter().filter(|c| **c == cue).count()
    }
}

impl AudioSink for CueLog {
    fn play(&mut self, cue: Cue) {
        if !self.muted {
            self.cues.push(cue);
        }
    }

    fn set_music(&mut self, playing: bool) {
        self.music_playing = playing;
    }

    fn apply_settings(&mut self, settings: &Settings) {
        self.muted = settings.muted;
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, Cue};
    use crate::settings::Settings;

    /// Procedural Web Audio sink
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        sfx_gain: f32,
        music_gain: f32,
        /// Background drone while the run is playing
        music: Option<(OscillatorNode, GainNode)>,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            let defaults = Settings::default();
            Self {
                ctx,
                sfx_gain: defaults.sfx_gain(),
                music_gain: defaults.music_gain(),
                music: None,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Short arpeggio of decaying notes
        fn arpeggio(
            &self,
            ctx: &AudioContext,
            notes: &[f32],
            step: f64,
            decay: f64,
            level: f32,
            wave: OscillatorType,
        ) {
            for (i, freq) in notes.iter().enumerate() {
                let Some((osc, gain)) = self.create_osc(ctx, *freq, wave) else {
                    continue;
                };
                let t = ctx.current_time() + i as f64 * step;
                gain.gain().set_value_at_time(self.sfx_gain * level, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + decay)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + decay + 0.05).ok();
            }
        }

        /// Single pitch sweep
        fn sweep(
            &self,
            ctx: &AudioContext,
            from: f32,
            to: f32,
            length: f64,
            level: f32,
            wave: OscillatorType,
        ) {
            let Some((osc, gain)) = self.create_osc(ctx, from, wave) else {
                return;
            };
            let t = ctx.current_time();
            gain.gain().set_value_at_time(self.sfx_gain * level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + length)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + length)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + length + 0.1).ok();
        }

        fn stop_music(&mut self) {
            if let Some((osc, _gain)) = self.music.take() {
                osc.stop().ok();
            }
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, cue: Cue) {
            if self.sfx_gain <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Browsers start the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                Cue::Coin => {
                    let notes: [f32; 3] = [600.0, 800.0, 1000.0];
                    self.arpeggio(ctx, &notes, 0.08, 0.15, 0.25, OscillatorType::Sine)
                }
                Cue::Token => {
                    let notes: [f32; 2] = [500.0, 750.0];
                    self.arpeggio(ctx, &notes, 0.06, 0.2, 0.25, OscillatorType::Triangle)
                }
                Cue::Crash => {
                    let notes: [f32; 4] = [400.0, 350.0, 300.0, 200.0];
                    self.arpeggio(ctx, &notes, 0.2, 0.3, 0.3, OscillatorType::Sine)
                }
                Cue::Ability => self.sweep(ctx, 200.0, 600.0, 0.25, 0.3, OscillatorType::Triangle),
                Cue::Smash => self.sweep(ctx, 100.0, 30.0, 0.4, 0.5, OscillatorType::Sawtooth),
                Cue::HighScore => {
                    let notes: [f32; 5] = [500.0, 600.0, 700.0, 800.0, 1000.0];
                    self.arpeggio(ctx, &notes, 0.08, 0.25, 0.25, OscillatorType::Triangle)
                }
            }
        }

        fn set_music(&mut self, playing: bool) {
            if !playing {
                self.stop_music();
                return;
            }
            if self.music.is_some() || self.music_gain <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            if let Some((osc, gain)) = self.create_osc(ctx, 110.0, OscillatorType::Triangle) {
                gain.gain().set_value(self.music_gain * 0.15);
                osc.start().ok();
                self.music = Some((osc, gain));
            }
        }

        fn apply_settings(&mut self, settings: &Settings) {
            self.sfx_gain = settings.sfx_gain();
            self.music_gain = settings.music_gain();
            if let Some((_, gain)) = &self.music {
                gain.gain().set_value(self.music_gain * 0.15);
            }
        }
    }
}
