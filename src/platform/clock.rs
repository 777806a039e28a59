//! Fixed-step clock
//!
//! Frame deltas arrive at whatever rate the host renders; the simulation
//! always advances in `SIM_DT` steps. Leftover time carries to the next frame.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

#[derive(Debug, Clone)]
pub struct FixedStep {
    step: f32,
    max_substeps: u32,
    max_frame_dt: f32,
    accumulator: f32,
    /// Total simulated seconds handed out
    elapsed: f64,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(SIM_DT)
    }
}

impl FixedStep {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            max_substeps: MAX_SUBSTEPS,
            max_frame_dt: MAX_FRAME_DT,
            accumulator: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Feed one frame delta; returns how many steps to simulate now.
    ///
    /// Long frames (tab switches) are clamped, and at most `MAX_SUBSTEPS`
    /// steps run per frame to avoid a spiral of death.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, self.max_frame_dt)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_substeps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_substeps && self.accumulator >= self.step {
            log::debug!("Dropping {:.3}s of backlog", self.accumulator);
            self.accumulator = 0.0;
        }
        self.elapsed += f64::from(steps) * f64::from(self.step);
        steps
    }

    /// Forget carried-over time (after pause or restart)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Fraction of a step waiting in the accumulator (render interpolation)
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carries_remainder() {
        let mut clock = FixedStep::new(0.01);
        assert_eq!(clock.advance(0.025), 2);
        assert!((clock.alpha() - 0.5).abs() < 1e-3);
        assert_eq!(clock.advance(0.006), 1);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FixedStep::new(SIM_DT);
        // 5 s stall counts as MAX_FRAME_DT, capped at MAX_SUBSTEPS
        let steps = clock.advance(5.0);
        assert!(steps <= MAX_SUBSTEPS);
        assert!(steps >= 1);
    }

    #[test]
    fn test_bad_delta_is_ignored() {
        let mut clock = FixedStep::default();
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.advance(-1.0), 0);
    }
}
