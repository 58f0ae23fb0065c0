use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ControllerError;

// ============================================================================
// GAINS AND BOUNDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self::new(2.0, 0.1, 0.05)
    }
}

/// Closed output interval `[min, max]`. Always non-empty once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputBounds {
    min: f64,
    max: f64,
}

impl OutputBounds {
    pub fn new(min: f64, max: f64) -> Result<Self, ControllerError> {
        // `!(min <= max)` also rejects NaN on either side
        if !(min <= max) {
            return Err(ControllerError::InvalidConfiguration { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamp into the interval. NaN maps to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for OutputBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

// ============================================================================
// POLICIES
// ============================================================================

/// What happens to the integral accumulator when the output saturates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiWindup {
    /// Undo this sample's accumulation if it pushed the output further past the bound.
    #[default]
    Rollback,
    /// Limit the accumulator to the value that puts the raw output exactly on the bound.
    Clamp,
    /// Accumulate unconditionally.
    Disabled,
}

/// Contributions of each term to the most recent output, before clamping.
/// `derivative` is already scaled by `kd`.
/// The integral term reflects the accumulator after anti-windup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidTerms {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

impl PidTerms {
    pub fn sum(&self) -> f64 {
        self.proportional + self.integral + self.derivative
    }
}

// ============================================================================
// PID CONTROLLER
// ============================================================================

/// Single-input single-output PID loop with a fixed setpoint and bounded output.
///
/// Timestamps are supplied by the caller so the loop can run on a synthetic
/// clock. The integral uses rectangular (backward Euler) accumulation:
/// `integral += error * dt` with the error of the current sample.
///
/// The first sample only seeds state and yields a proportional-only response.
/// A later sample whose `now` does not advance past the previous timestamp is
/// treated as a repeated sample: neither the integral nor the derivative is
/// updated for it, and it reuses the integral contribution of the previous
/// output (before any rollback) so the same reading yields the same output.
#[derive(Debug, Clone)]
pub struct PidController {
    setpoint: f64,
    gains: PidGains,
    bounds: OutputBounds,
    anti_windup: AntiWindup,

    // State
    integral: f64,
    prev_error: Option<f64>,
    prev_time: Option<Instant>,
    last_terms: PidTerms,
    // ki * integral as it entered the last raw output, before anti-windup
    held_integral_term: f64,
    saturated: bool,
}

impl PidController {
    pub fn new(setpoint: f64, gains: PidGains, bounds: OutputBounds) -> Self {
        Self {
            setpoint,
            gains,
            bounds,
            anti_windup: AntiWindup::default(),
            integral: 0.0,
            prev_error: None,
            prev_time: None,
            last_terms: PidTerms::default(),
            held_integral_term: 0.0,
            saturated: false,
        }
    }

    /// Build from raw bound values, validating `min <= max`.
    pub fn with_limits(
        setpoint: f64,
        gains: PidGains,
        min: f64,
        max: f64,
    ) -> Result<Self, ControllerError> {
        Ok(Self::new(setpoint, gains, OutputBounds::new(min, max)?))
    }

    pub fn with_anti_windup(mut self, anti_windup: AntiWindup) -> Self {
        self.anti_windup = anti_windup;
        self
    }

    /// Compute the next control signal for `measured_value` sampled at `now`.
    /// The result always lies within the configured bounds.
    pub fn compute(&mut self, measured_value: f64, now: Instant) -> f64 {
        let error = self.setpoint - measured_value;
        let p = self.gains.kp * error;

        // A non-finite reading never reaches the state
        if !measured_value.is_finite() {
            let raw = p + self.gains.ki * self.integral;
            let output = self.bounds.clamp(raw);
            self.saturated = output != raw;
            tracing::warn!(measured_value, output, "non-finite measurement ignored by PID state");
            return output;
        }

        let dt = self.prev_time.and_then(|prev| {
            let elapsed = now.checked_duration_since(prev)?;
            (!elapsed.is_zero()).then(|| elapsed.as_secs_f64())
        });

        let (integral, applied, derivative, raw) = match dt {
            Some(dt) => self.integrate(error, p, dt),
            None if self.prev_time.is_none() => {
                // First sample: no integral or derivative yet
                let i = self.gains.ki * self.integral;
                (self.integral, i, 0.0, p + i)
            }
            None => {
                // Repeated sample: both contributions held from the previous output
                let i = self.held_integral_term;
                let d = self.last_terms.derivative;
                (self.integral, i, d, p + i + d)
            }
        };

        let output = self.bounds.clamp(raw);
        self.saturated = output != raw;
        self.integral = integral;
        self.held_integral_term = applied;
        self.last_terms = PidTerms {
            proportional: p,
            integral: self.gains.ki * integral,
            derivative,
        };

        self.prev_error = Some(error);
        // Stored time only moves forward
        if self.prev_time.map_or(true, |prev| now > prev) {
            self.prev_time = Some(now);
        }

        output
    }

    /// Compute using the current monotonic clock.
    pub fn compute_now(&mut self, measured_value: f64) -> f64 {
        self.compute(measured_value, Instant::now())
    }

    /// Accumulate and differentiate over a positive `dt`. Returns the
    /// post-anti-windup integral, the integral contribution that went into the
    /// raw output, the derivative contribution and the raw output.
    fn integrate(&self, error: f64, p: f64, dt: f64) -> (f64, f64, f64, f64) {
        let ki = self.gains.ki;
        let derivative = self.prev_error.map_or(0.0, |prev| (error - prev) / dt);
        let d = self.gains.kd * derivative;

        let previous = self.integral;
        let candidate = previous + error * dt;
        let raw = p + ki * candidate + d;

        let above = raw > self.bounds.max;
        let below = raw < self.bounds.min;
        if !(above || below || raw.is_nan()) {
            return (candidate, ki * candidate, d, raw);
        }

        let integral = match self.anti_windup {
            AntiWindup::Disabled => candidate,
            AntiWindup::Rollback => {
                let step = ki * (candidate - previous);
                let deepens = raw.is_nan() || (above && step > 0.0) || (below && step < 0.0);
                if deepens {
                    tracing::trace!(raw, integral = previous, "output saturated, integration rolled back");
                    previous
                } else {
                    candidate
                }
            }
            AntiWindup::Clamp if raw.is_nan() => previous,
            AntiWindup::Clamp => self.clamp_integral(previous, candidate, p + d, above),
        };

        (integral, ki * candidate, d, raw)
    }

    /// Limit the integral so that `others + ki * integral` sits on the violated
    /// bound, without pulling it past its previous value.
    fn clamp_integral(&self, previous: f64, candidate: f64, others: f64, above: bool) -> f64 {
        let ki = self.gains.ki;
        if ki == 0.0 || !candidate.is_finite() {
            return previous;
        }

        let term = ki * candidate;
        let prev_term = ki * previous;
        let limited = if above {
            let ceiling = self.bounds.max - others;
            term.min(ceiling).max(prev_term.min(term))
        } else {
            let floor = self.bounds.min - others;
            term.max(floor).min(prev_term.max(term))
        };

        tracing::trace!(candidate, integral = limited / ki, "output saturated, integral clamped");
        limited / ki
    }

    /// Clear accumulated state. Gains, setpoint and bounds are kept.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.prev_time = None;
        self.last_terms = PidTerms::default();
        self.held_integral_term = 0.0;
        self.saturated = false;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn bounds(&self) -> OutputBounds {
        self.bounds
    }

    pub fn anti_windup(&self) -> AntiWindup {
        self.anti_windup
    }

    /// Raw accumulator value (error * seconds), not scaled by `ki`.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn last_terms(&self) -> PidTerms {
        self.last_terms
    }

    /// Whether the most recent output was clamped to a bound.
    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    /// Error from the most recent finite sample, if any.
    pub fn last_error(&self) -> Option<f64> {
        self.prev_error
    }
}
