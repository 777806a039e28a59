//! Fixed timestep simulation tick
//!
//! Core game loop that advances a run deterministically.

use super::run::Run;

/// Discrete actions sampled once per tick (level-triggered)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionFlags {
    pub steer_left: bool,
    pub steer_right: bool,
    pub jump: bool,
    pub slide: bool,
    pub use_ability: bool,
}

impl ActionFlags {
    pub fn any(&self) -> bool {
        self.steer_left || self.steer_right || self.jump || self.slide || self.use_ability
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub actions: ActionFlags,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - the autopilot steers instead of `actions`
    pub autopilot: bool,
}

/// Advance the run by one fixed timestep
pub fn tick(run: &mut Run, input: &TickInput, dt: f32) {
    if input.pause {
        run.toggle_pause();
    }

    // Only a running game with a loaded model moves
    if !run.game.is_playing() || !run.player.model.is_ready() {
        run.flush_director_events();
        return;
    }

    let actions = if input.autopilot {
        autopilot(run)
    } else {
        input.actions
    };

    run.player.update(
        dt,
        &actions,
        &mut run.director,
        &mut run.game,
        &mut run.events,
    );

    // A crash freezes the track where it is
    if !run.game.is_game_over() {
        run.director.update(dt, run.player.view());
    }

    run.time_ticks += 1;
    run.flush_director_events();
}

/// Lookahead for the autopilot (units ahead of the feet)
const AUTOPILOT_LOOKAHEAD: f32 = 12.0;
/// Extra clearance the autopilot keeps around hazards
const AUTOPILOT_CLEARANCE: f32 = 0.6;
/// Dead zone before the autopilot bothers steering
const AUTOPILOT_DEAD_ZONE: f32 = 0.2;

/// Simple demo driver: dodge into the nearest clear lane, otherwise drift
/// toward the nearest pickup ahead, and fire the ability when it is ready.
fn autopilot(run: &Run) -> ActionFlags {
    let feet = run.player.position;
    let half_width = run.player.hitbox().size().x * 0.5 + AUTOPILOT_CLEARANCE;
    let director = &run.director;

    let hazard_at = |x: f32| {
        director
            .obstacles()
            .iter()
            .chain(director.barriers())
            .any(|h| {
                let ahead = feet.z - h.position.z;
                ahead > -1.0
                    && ahead < AUTOPILOT_LOOKAHEAD
                    && (h.position.x - x).abs() < h.size.x * 0.5 + half_width
            })
    };

    let target_x = if hazard_at(feet.x) {
        let mut lanes: Vec<f32> = (0..director.tuning().lane_count)
            .map(|lane| director.lane_center(lane))
            .collect();
        lanes.sort_by(|a, b| {
            (a - feet.x)
                .abs()
                .partial_cmp(&(b - feet.x).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        lanes.into_iter().find(|x| !hazard_at(*x)).unwrap_or(feet.x)
    } else {
        director
            .collectibles()
            .iter()
            .filter(|c| {
                let ahead = feet.z - c.position.z;
                ahead > 0.0 && ahead < AUTOPILOT_LOOKAHEAD && !hazard_at(c.position.x)
            })
            .min_by(|a, b| {
                b.position
                    .z
                    .partial_cmp(&a.position.z)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|c| c.position.x)
            .unwrap_or(feet.x)
    };

    ActionFlags {
        steer_left: target_x < feet.x - AUTOPILOT_DEAD_ZONE,
        steer_right: target_x > feet.x + AUTOPILOT_DEAD_ZONE,
        jump: false,
        slide: false,
        use_ability: run.player.ability_enabled && !run.player.is_ability_active(),
    }
}
