//! Integration tests for the PID stimulus controller

use neurostim_feedback::{
    AntiWindup, ControllerError, LinearLatentScale, OutputBounds, PidController, PidGains,
    StimulusController,
};
use std::time::{Duration, Instant};

fn at(base: Instant, secs: f64) -> Instant {
    base + Duration::from_secs_f64(secs)
}

fn default_pid() -> PidController {
    PidController::new(0.5, PidGains::default(), OutputBounds::default())
}

/// kp low enough that the integral has to do most of the work.
fn slow_pid(anti_windup: AntiWindup) -> PidController {
    PidController::new(0.5, PidGains::new(0.5, 0.1, 0.05), OutputBounds::default())
        .with_anti_windup(anti_windup)
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_inverted_bounds_rejected() {
    let result = PidController::with_limits(0.5, PidGains::default(), 1.0, 0.0);
    assert_eq!(
        result.unwrap_err(),
        ControllerError::InvalidConfiguration { min: 1.0, max: 0.0 }
    );
}

#[test]
fn test_negative_gains_are_accepted() {
    let pid = PidController::with_limits(0.5, PidGains::new(-2.0, -0.1, -0.05), -1.0, 1.0)
        .expect("gains are not validated");
    assert_eq!(pid.gains().kp, -2.0);
}

#[test]
fn test_stimulus_controller_defaults() {
    let controller = StimulusController::default();
    let pid = controller.pid();
    assert_eq!(pid.setpoint(), 0.5);
    assert_eq!(pid.gains(), PidGains::new(2.0, 0.1, 0.05));
    assert_eq!(pid.bounds(), OutputBounds::default());
    assert_eq!(pid.anti_windup(), AntiWindup::Rollback);
}

// ============================================================================
// OUTPUT BOUNDS
// ============================================================================

#[test]
fn test_output_always_within_bounds() {
    let inputs = [
        -1e9, -1.0, 0.0, 0.25, 0.5, 0.75, 1.0, 3.0, 1e9,
        f64::MAX, f64::MIN, f64::INFINITY, f64::NEG_INFINITY, f64::NAN,
    ];
    // Includes repeated and backward timestamps
    let times = [0.0, 0.1, 0.1, 0.05, 1.0, 1.0, 2.5, 10.0];

    for mode in [AntiWindup::Rollback, AntiWindup::Clamp, AntiWindup::Disabled] {
        let bounds = OutputBounds::new(-0.2, 0.7).unwrap();
        let mut pid = PidController::new(0.5, PidGains::default(), bounds).with_anti_windup(mode);
        let base = Instant::now();

        for round in 0..4 {
            for (i, &value) in inputs.iter().enumerate() {
                let t = times[i % times.len()] + round as f64 * 10.0;
                let out = pid.compute(value, at(base, t));
                assert!(
                    bounds.contains(out),
                    "{:?}: output {} out of bounds for input {}",
                    mode, out, value
                );
            }
        }
    }
}

#[test]
fn test_degenerate_bounds_pin_output() {
    let mut pid = PidController::with_limits(0.5, PidGains::default(), 0.3, 0.3).unwrap();
    let base = Instant::now();
    for i in 0..10 {
        assert_eq!(pid.compute(i as f64 * 0.1, at(base, i as f64)), 0.3);
    }
}

// ============================================================================
// FIRST SAMPLE AND REPEATED SAMPLES
// ============================================================================

#[test]
fn test_at_setpoint_returns_zero() {
    let mut pid = default_pid();
    let base = Instant::now();

    assert_eq!(pid.compute(0.5, base), 0.0, "First call at setpoint should be 0");
    for i in 1..20 {
        assert_eq!(pid.compute(0.5, at(base, i as f64 * 0.1)), 0.0, "Should stay at 0");
    }
    assert_eq!(pid.integral(), 0.0);
}

#[test]
fn test_first_call_is_proportional_only() {
    let mut pid = PidController::new(
        0.5,
        PidGains::new(2.0, 100.0, 100.0),
        OutputBounds::new(-10.0, 10.0).unwrap(),
    );
    let out = pid.compute(0.3, Instant::now());
    assert!((out - 0.4).abs() < 1e-12, "Expected kp * error, got {}", out);

    let terms = pid.last_terms();
    assert_eq!(terms.integral, 0.0);
    assert_eq!(terms.derivative, 0.0);
}

#[test]
fn test_repeated_timestamp_gives_identical_output() {
    let mut pid = default_pid();
    let base = Instant::now();

    // Same instant on the very first samples
    let a = pid.compute(0.3, base);
    let b = pid.compute(0.3, base);
    assert_eq!(a, b);

    // And again after the derivative and integral have kicked in
    pid.compute(0.4, at(base, 0.5));
    let t = at(base, 0.6);
    let first = pid.compute(0.35, t);
    let integral = pid.integral();
    let second = pid.compute(0.35, t);

    assert!(first.is_finite());
    assert_eq!(first, second, "Zero elapsed time must not change the output");
    assert_eq!(pid.integral(), integral, "Zero elapsed time must not accumulate");
}

#[test]
fn test_repeated_timestamp_after_saturation_gives_identical_output() {
    for mode in [AntiWindup::Rollback, AntiWindup::Clamp] {
        let mut pid = PidController::new(1.0, PidGains::new(0.0, 1.0, 0.0), OutputBounds::default())
            .with_anti_windup(mode);
        let base = Instant::now();
        pid.compute(0.0, base);
        assert_eq!(pid.compute(0.0, at(base, 0.5)), 0.5);

        // Raw output 1.5 clamps, and anti-windup touches the accumulator
        let t = at(base, 1.5);
        let first = pid.compute(0.0, t);
        let integral = pid.integral();
        let second = pid.compute(0.0, t);

        assert_eq!(first, 1.0, "{:?}", mode);
        assert_eq!(first, second, "{:?}: repeated sample changed the output", mode);
        assert!(pid.is_saturated());
        assert_eq!(pid.integral(), integral);
    }
}

#[test]
fn test_backward_time_skips_accumulation() {
    let mut pid = PidController::new(
        1.0,
        PidGains::new(0.0, 1.0, 0.0),
        OutputBounds::new(-100.0, 100.0).unwrap(),
    );
    let base = Instant::now();
    pid.compute(0.0, at(base, 5.0));
    pid.compute(0.0, at(base, 6.0));
    let integral = pid.integral();

    let out = pid.compute(0.0, at(base, 3.0));
    assert_eq!(pid.integral(), integral);
    assert!((out - integral).abs() < 1e-12);
}

// ============================================================================
// SATURATION AND ANTI-WINDUP
// ============================================================================

#[test]
fn test_sustained_error_saturates_without_overshoot() {
    let mut pid = slow_pid(AntiWindup::Rollback);
    let base = Instant::now();

    let mut outputs = Vec::new();
    let mut integrals = Vec::new();
    for i in 0..40 {
        outputs.push(pid.compute(0.0, at(base, i as f64)));
        integrals.push(pid.integral());
    }

    for w in outputs.windows(2) {
        assert!(w[1] >= w[0], "Output should rise monotonically: {:?}", w);
    }
    for w in integrals.windows(2) {
        assert!(w[1] >= w[0], "Integral should not decrease under constant error");
    }
    assert!(outputs[0] < 1.0, "Starts below saturation");
    assert!(outputs[25..].iter().all(|&o| o == 1.0), "Should hold at the upper bound");

    // kp * e = 0.25, so ki * I is capped at 0.75
    assert!(pid.integral() <= 7.5 + 1e-9, "Integral wound up to {}", pid.integral());
}

#[test]
fn test_default_gains_saturate_immediately() {
    let mut pid = default_pid();
    let base = Instant::now();
    for i in 0..30 {
        let out = pid.compute(0.0, at(base, i as f64 * 0.1));
        assert_eq!(out, 1.0);
    }
    assert!(pid.integral().abs() < 1e-12, "Integral should not grow while saturated");
}

fn saturate_then_reverse(mode: AntiWindup) -> Vec<f64> {
    let mut pid = slow_pid(mode);
    let base = Instant::now();
    for i in 0..40 {
        pid.compute(0.0, at(base, i as f64));
    }
    assert!(pid.is_saturated());

    (41..46).map(|i| pid.compute(1.0, at(base, i as f64))).collect()
}

#[test]
fn test_rollback_leaves_saturation_quickly() {
    let after = saturate_then_reverse(AntiWindup::Rollback);
    assert!(
        after[..3].iter().any(|&o| o < 1.0),
        "Output should leave saturation within 3 calls: {:?}",
        after
    );
}

#[test]
fn test_clamp_leaves_saturation_quickly() {
    let after = saturate_then_reverse(AntiWindup::Clamp);
    assert!(after[0] < 1.0, "Clamped integral should desaturate at once: {:?}", after);
}

#[test]
fn test_disabled_anti_windup_stays_pinned() {
    let after = saturate_then_reverse(AntiWindup::Disabled);
    assert!(
        after[..3].iter().all(|&o| o == 1.0),
        "Wound-up integral should keep output pinned: {:?}",
        after
    );
}

#[test]
fn test_rollback_lets_integral_unwind_while_saturated() {
    let mut pid = PidController::new(
        0.0,
        PidGains::new(0.0, 1.0, 1.0),
        OutputBounds::new(-1.0, 1.0).unwrap(),
    );
    let base = Instant::now();
    pid.compute(-0.5, base);
    pid.compute(-0.5, at(base, 1.0));
    pid.compute(-0.5, at(base, 2.0));
    assert!((pid.integral() - 1.0).abs() < 1e-12);

    // Pushes further below the floor: rolled back
    pid.compute(1.0, at(base, 3.0));
    assert!((pid.integral() - 1.0).abs() < 1e-12);

    // Derivative kick holds the output above the ceiling, but the negative
    // error still reduces the accumulator
    let out = pid.compute(0.1, at(base, 3.1));
    assert_eq!(out, 1.0);
    assert!(pid.is_saturated());
    assert!(pid.integral() < 1.0, "Integral should unwind, got {}", pid.integral());
}

#[test]
fn test_saturation_flag_tracks_clamping() {
    let mut pid = default_pid();
    let base = Instant::now();
    pid.compute(0.5, base);
    assert!(!pid.is_saturated());
    pid.compute(-3.0, at(base, 1.0));
    assert!(pid.is_saturated());
    pid.compute(0.3, at(base, 2.0));
    assert!(!pid.is_saturated());
}

// ============================================================================
// DETERMINISM AND RESET
// ============================================================================

#[test]
fn test_identical_controllers_produce_identical_sequences() {
    let mut a = default_pid();
    let mut b = default_pid();
    let base = Instant::now();

    let inputs: Vec<f64> = (0..200).map(|i| ((i * 37) % 100) as f64 / 100.0).collect();
    for (i, &value) in inputs.iter().enumerate() {
        let t = at(base, i as f64 * 0.05);
        assert_eq!(a.compute(value, t), b.compute(value, t));
    }
    assert_eq!(a.integral(), b.integral());
}

#[test]
fn test_reset_restores_first_call_behaviour() {
    let mut pid = slow_pid(AntiWindup::Rollback);
    let base = Instant::now();
    let fresh = pid.clone().compute(0.2, base);

    for i in 0..10 {
        pid.compute(0.0, at(base, i as f64));
    }
    assert!(pid.integral() > 0.0);

    pid.reset();
    assert_eq!(pid.integral(), 0.0);
    assert_eq!(pid.last_error(), None);
    assert_eq!(pid.compute(0.2, at(base, 20.0)), fresh);
}

// ============================================================================
// STIMULUS CONTROLLER
// ============================================================================

#[test]
fn test_stimulus_controller_drives_low_rate_up() {
    let mut controller = StimulusController::new(0.5);
    let base = Instant::now();
    let low = controller.compute(0.1, base);
    assert!(low > 0.5, "Low firing rate should raise stimulation, got {}", low);

    let mut controller = StimulusController::new(0.5);
    let high = controller.compute(0.9, base);
    assert_eq!(high, 0.0, "High firing rate should cut stimulation");
}

#[test]
fn test_update_reads_the_clock() {
    let mut controller = StimulusController::new(0.5);
    let out = controller.update(0.5);
    assert_eq!(out, 0.0);
    assert_eq!(controller.pid().last_error(), Some(0.0));
}

#[test]
fn test_compute_mapped_rescales_control() {
    let mut controller = StimulusController::new(0.5);
    let scale = LinearLatentScale { lo: -2.0, hi: 2.0 };
    let param = controller.compute_mapped(0.0, Instant::now(), &scale);
    // control saturates at 1.0 -> hi
    assert!((param - 2.0).abs() < 1e-12);
}
