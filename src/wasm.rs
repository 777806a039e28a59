//! Browser bindings
//!
//! `WebGame` is the handle a JS host drives: it forwards DOM input, calls
//! `frame` from `requestAnimationFrame`, reports finished asset loads and
//! reads HUD/scene snapshots back as JSON for its three.js renderer.

use wasm_bindgen::prelude::*;

use crate::audio::WebAudio;
use crate::assets::AssetError;
use crate::persistence::{KeyValueStore, LocalStorageStore, MemoryStore};
use crate::platform::{KeyboardInput, SceneMirror};
use crate::session::Session;
use crate::sim::CharacterKind;
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Sprint Squad (wasm) starting...");
}

#[wasm_bindgen]
pub struct WebGame {
    session: Session<WebAudio, SceneMirror>,
    input: KeyboardInput,
    last_time: f64,
}

#[wasm_bindgen]
impl WebGame {
    /// `tuning_json` may be empty for the shipped balance
    #[wasm_bindgen(constructor)]
    pub fn new(character: &str, tuning_json: &str) -> WebGame {
        let character = CharacterKind::from_name(character).unwrap_or(CharacterKind::Dax);
        let tuning = if tuning_json.trim().is_empty() {
            Tuning::default()
        } else {
            Tuning::from_json(tuning_json).unwrap_or_else(|e| {
                log::warn!("{}; using default tuning", e);
                Tuning::default()
            })
        };
        let store: Box<dyn KeyValueStore> = match LocalStorageStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{}; scores will not persist", e);
                Box::new(MemoryStore::new())
            }
        };
        let seed = js_sys::Date::now() as u64;
        WebGame {
            session: Session::new(
                character,
                tuning,
                seed,
                store,
                WebAudio::new(),
                SceneMirror::new(),
            ),
            input: KeyboardInput::new(),
            last_time: 0.0,
        }
    }

    /// Model path the host should load for the current character
    pub fn pending_model(&self) -> Option<String> {
        self.session.pending_model().map(str::to_string)
    }

    /// Report an asset load; `error` empty means success
    pub fn asset_loaded(&mut self, path: &str, error: &str) {
        let result = if error.is_empty() {
            Ok(())
        } else {
            Err(AssetError::Decode {
                path: path.to_string(),
                reason: error.to_string(),
            })
        };
        self.session.asset_loaded(path, result);
    }

    /// Animation-frame callback (`time` in ms)
    pub fn frame(&mut self, time: f64) -> u32 {
        let dt = if self.last_time > 0.0 {
            ((time - self.last_time) / 1000.0) as f32
        } else {
            crate::consts::SIM_DT
        };
        self.last_time = time;
        if self.input.take_hitbox_toggle() {
            self.session.toggle_hitboxes();
        }
        self.session.frame(dt, &mut self.input)
    }

    pub fn key_down(&mut self, key: &str) {
        self.input.key_down(key);
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.key_up(key);
    }

    pub fn touch_start(&mut self, x: f32, width: f32) {
        self.input.touch_start(x, width);
    }

    pub fn touch_end(&mut self, x: f32) {
        self.input.touch_end(x);
    }

    /// Window lost focus: drop held keys and pause
    pub fn blur(&mut self) {
        self.input.release_all();
        self.input.request_pause();
    }

    pub fn start_run(&mut self) {
        self.session.start();
    }

    pub fn restart(&mut self) {
        self.session.restart();
    }

    pub fn toggle_pause(&mut self) {
        self.session.toggle_pause();
    }

    pub fn select_character(&mut self, name: &str) -> bool {
        match CharacterKind::from_name(name) {
            Some(kind) => {
                self.session.select_character(kind);
                true
            }
            None => {
                log::warn!("Unknown character `{}`", name);
                false
            }
        }
    }

    /// String-named lifecycle request ("menu", "playing", "paused", "gameOver")
    pub fn request_state(&mut self, name: &str) -> bool {
        self.session.request_state(name).is_ok()
    }

    pub fn set_volume(&mut self, master: f32, sfx: f32, music: f32, muted: bool) {
        let mut settings = self.session.settings().clone();
        settings.master_volume = master;
        settings.sfx_volume = sfx;
        settings.music_volume = music;
        settings.muted = muted;
        self.session.set_settings(settings);
    }

    pub fn hud_json(&self) -> String {
        serde_json::to_string(&self.session.hud()).unwrap_or_default()
    }

    /// Every live scene node with its transform
    pub fn scene_json(&self) -> String {
        let nodes: Vec<_> = self.session.scene().nodes().collect();
        serde_json::to_string(&nodes).unwrap_or_default()
    }
}
