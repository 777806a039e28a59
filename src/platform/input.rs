//! Input sources
//!
//! Hosts push raw key and touch events; the simulation pulls one
//! `TickInput` per tick. Movement flags are level-triggered (held keys stay
//! on), while pause is a one-shot cleared once it has been sampled.

use crate::sim::{ActionFlags, TickInput};

/// Anything that can produce per-tick input
pub trait InputSource {
    /// Sample the current actions; `dt` advances any timed pulses
    fn sample(&mut self, dt: f32) -> TickInput;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SteerLeft,
    SteerRight,
    Jump,
    Slide,
    UseAbility,
}

/// Key binding table (DOM `KeyboardEvent.key` values)
pub fn action_for_key(key: &str) -> Option<Action> {
    match key {
        "ArrowLeft" | "a" | "A" => Some(Action::SteerLeft),
        "ArrowRight" | "d" | "D" => Some(Action::SteerRight),
        "ArrowUp" | "w" | "W" => Some(Action::Jump),
        "ArrowDown" | "s" | "S" => Some(Action::Slide),
        " " => Some(Action::UseAbility),
        _ => None,
    }
}

/// Touch region across the screen width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TouchRegion {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Touch {
    region: TouchRegion,
    start_x: f32,
    held_for: f32,
}

/// Held longer than this (seconds) with little travel, a touch fires the ability
const LONG_PRESS: f32 = 0.5;
/// Allowed finger travel for a long press (pixels)
const LONG_PRESS_SLOP: f32 = 10.0;
/// How long a touch-triggered ability request stays on
const ABILITY_PULSE: f32 = 0.1;

/// Keyboard + touch state for browser hosts
#[derive(Debug, Clone, Default)]
pub struct KeyboardInput {
    held: ActionFlags,
    pause_pending: bool,
    hitbox_toggle_pending: bool,
    pub autopilot: bool,
    touch: Option<Touch>,
    ability_pulse: f32,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, action: Action, on: bool) {
        match action {
            Action::SteerLeft => self.held.steer_left = on,
            Action::SteerRight => self.held.steer_right = on,
            Action::Jump => self.held.jump = on,
            Action::Slide => self.held.slide = on,
            Action::UseAbility => self.held.use_ability = on,
        }
    }

    pub fn key_down(&mut self, key: &str) {
        match key {
            "Escape" | "p" | "P" => self.pause_pending = true,
            "b" | "B" => self.hitbox_toggle_pending = true,
            "i" | "I" => {
                self.autopilot = !self.autopilot;
                log::info!("Autopilot: {}", self.autopilot);
            }
            _ => {
                if let Some(action) = action_for_key(key) {
                    self.set(action, true);
                }
            }
        }
    }

    pub fn key_up(&mut self, key: &str) {
        if let Some(action) = action_for_key(key) {
            self.set(action, false);
        }
    }

    /// Touch begins at `x` pixels on a screen `width` pixels wide
    pub fn touch_start(&mut self, x: f32, width: f32) {
        let region = if x < width / 3.0 {
            TouchRegion::Left
        } else if x > width * 2.0 / 3.0 {
            TouchRegion::Right
        } else {
            TouchRegion::Middle
        };
        match region {
            TouchRegion::Left => self.held.steer_left = true,
            TouchRegion::Right => self.held.steer_right = true,
            TouchRegion::Middle => self.held.jump = true,
        }
        self.touch = Some(Touch {
            region,
            start_x: x,
            held_for: 0.0,
        });
    }

    /// Touch lifted at `x`; a long still press fires a brief ability request
    pub fn touch_end(&mut self, x: f32) {
        let Some(touch) = self.touch.take() else {
            return;
        };
        match touch.region {
            TouchRegion::Left => self.held.steer_left = false,
            TouchRegion::Right => self.held.steer_right = false,
            TouchRegion::Middle => self.held.jump = false,
        }
        if touch.held_for > LONG_PRESS && (x - touch.start_x).abs() < LONG_PRESS_SLOP {
            log::debug!("Long press, ability requested");
            self.ability_pulse = ABILITY_PULSE;
        }
    }

    /// Drop every held action (focus lost)
    pub fn release_all(&mut self) {
        self.held = ActionFlags::default();
        self.touch = None;
        self.ability_pulse = 0.0;
    }

    pub fn request_pause(&mut self) {
        self.pause_pending = true;
    }

    /// One-shot hitbox overlay toggle
    pub fn take_hitbox_toggle(&mut self) -> bool {
        std::mem::take(&mut self.hitbox_toggle_pending)
    }
}

impl InputSource for KeyboardInput {
    fn sample(&mut self, dt: f32) -> TickInput {
        if let Some(touch) = &mut self.touch {
            touch.held_for += dt;
        }
        let mut actions = self.held;
        if self.ability_pulse > 0.0 {
            actions.use_ability = true;
            self.ability_pulse -= dt;
        }
        TickInput {
            actions,
            pause: std::mem::take(&mut self.pause_pending),
            autopilot: self.autopilot,
        }
    }
}

/// Replays a fixed list of inputs, then idles (tests and demos)
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    script: std::collections::VecDeque<TickInput>,
    pub autopilot: bool,
}

impl ScriptedInput {
    pub fn new(script: impl IntoIterator<Item = TickInput>) -> Self {
        Self {
            script: script.into_iter().collect(),
            autopilot: false,
        }
    }

    pub fn autopilot() -> Self {
        Self {
            script: Default::default(),
            autopilot: true,
        }
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self, _dt: f32) -> TickInput {
        let mut input = self.script.pop_front().unwrap_or_default();
        input.autopilot |= self.autopilot;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_level_triggered() {
        let mut input = KeyboardInput::new();
        input.key_down("ArrowLeft");
        assert!(input.sample(0.016).actions.steer_left);
        assert!(input.sample(0.016).actions.steer_left);
        input.key_up("ArrowLeft");
        assert!(!input.sample(0.016).actions.steer_left);
    }

    #[test]
    fn test_pause_is_one_shot() {
        let mut input = KeyboardInput::new();
        input.key_down("Escape");
        assert!(input.sample(0.016).pause);
        assert!(!input.sample(0.016).pause);
    }

    #[test]
    fn test_touch_regions() {
        let mut input = KeyboardInput::new();
        input.touch_start(50.0, 900.0);
        assert!(input.sample(0.016).actions.steer_left);
        input.touch_end(50.0);
        input.touch_start(850.0, 900.0);
        assert!(input.sample(0.016).actions.steer_right);
        input.touch_end(850.0);
        input.touch_start(450.0, 900.0);
        assert!(input.sample(0.016).actions.jump);
    }

    #[test]
    fn test_long_press_pulses_ability() {
        let mut input = KeyboardInput::new();
        input.touch_start(450.0, 900.0);
        for _ in 0..40 {
            input.sample(0.016);
        }
        input.touch_end(452.0);
        let first = input.sample(0.016).actions;
        assert!(first.use_ability);
        assert!(!first.jump);
        for _ in 0..10 {
            input.sample(0.016);
        }
        assert!(!input.sample(0.016).actions.use_ability);
    }

    #[test]
    fn test_short_press_no_ability() {
        let mut input = KeyboardInput::new();
        input.touch_start(450.0, 900.0);
        input.sample(0.016);
        input.touch_end(450.0);
        assert!(!input.sample(0.016).actions.use_ability);
    }

    #[test]
    fn test_script_then_idle() {
        let step = TickInput {
            actions: ActionFlags {
                jump: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut input = ScriptedInput::new([step]);
        assert!(input.sample(0.016).actions.jump);
        assert!(!input.sample(0.016).actions.any());
    }
}
