use std::time::Instant;

use super::pid::{OutputBounds, PidController, PidGains};

// ============================================================================
// STIMULUS CONTROLLER - Firing-rate feedback with experiment defaults
// ============================================================================

pub const DEFAULT_TARGET_RATE: f64 = 0.5;

/// Drives stimulation intensity in `[0, 1]` toward a target neural firing rate.
#[derive(Debug, Clone)]
pub struct StimulusController {
    pid: PidController,
}

impl StimulusController {
    pub fn new(target_rate: f64) -> Self {
        Self {
            pid: PidController::new(target_rate, PidGains::default(), OutputBounds::default()),
        }
    }

    pub fn from_pid(pid: PidController) -> Self {
        Self { pid }
    }

    pub fn compute(&mut self, neural_rate: f64, now: Instant) -> f64 {
        self.pid.compute(neural_rate, now)
    }

    /// Sample the clock and compute.
    pub fn update(&mut self, measured_rate: f64) -> f64 {
        self.pid.compute_now(measured_rate)
    }

    /// Compute and hand the control signal to a downstream parameter mapping.
    pub fn compute_mapped<M: LatentMapping>(
        &mut self,
        neural_rate: f64,
        now: Instant,
        mapping: &M,
    ) -> M::Params {
        let control = self.compute(neural_rate, now);
        mapping.map(control, self.pid.bounds())
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn pid_mut(&mut self) -> &mut PidController {
        &mut self.pid
    }
}

impl Default for StimulusController {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_RATE)
    }
}

// ============================================================================
// LATENT MAPPING - Control signal to generative-model parameters
// ============================================================================

/// Converts a bounded control signal into parameters for a downstream
/// stimulus generator. The controller does not interpret the result.
pub trait LatentMapping {
    type Params;

    fn map(&self, control: f64, bounds: OutputBounds) -> Self::Params;
}

/// Linear rescale of `[bounds.min, bounds.max]` onto `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearLatentScale {
    pub lo: f64,
    pub hi: f64,
}

impl LatentMapping for LinearLatentScale {
    type Params = f64;

    fn map(&self, control: f64, bounds: OutputBounds) -> f64 {
        let span = bounds.max() - bounds.min();
        if span <= 0.0 || !span.is_finite() {
            return self.lo;
        }
        let frac = (control - bounds.min()) / span;
        self.lo + frac * (self.hi - self.lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_scale_maps_endpoints() {
        let scale = LinearLatentScale { lo: -3.0, hi: 3.0 };
        let bounds = OutputBounds::default();
        assert_eq!(scale.map(0.0, bounds), -3.0);
        assert_eq!(scale.map(1.0, bounds), 3.0);
        assert_eq!(scale.map(0.5, bounds), 0.0);
    }

    #[test]
    fn degenerate_bounds_map_to_lo() {
        let scale = LinearLatentScale { lo: 2.0, hi: 4.0 };
        let bounds = OutputBounds::new(0.3, 0.3).unwrap();
        assert_eq!(scale.map(0.3, bounds), 2.0);
    }
}
