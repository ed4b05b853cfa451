// Host-side tests for the activation envelope.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vis_core::*;

const DT: f32 = 1.0 / 64.0;

#[test]
fn attack_reaches_full_activation_exactly_at_attack_time() {
    let mut env = ActivationEnvelope::new();
    // 250 ms attack at 64 fps: 16 frames
    for frame in 1..16 {
        let v = env.update(0.5, 0.1, 250.0, 250.0, DT);
        assert!(v < 1.0, "activation reached 1 early at frame {frame}");
    }
    let v = env.update(0.5, 0.1, 250.0, 250.0, DT);
    assert_eq!(v, 1.0);
}

#[test]
fn release_falls_back_to_zero() {
    let mut env = ActivationEnvelope::new();
    env.update(1.0, 0.1, 0.0, 500.0, DT);
    assert_eq!(env.value(), 1.0);

    let mut prev = env.value();
    for _ in 0..31 {
        let v = env.update(0.0, 0.1, 0.0, 500.0, DT);
        assert!(v < prev, "release not strictly decreasing");
        assert!(v > 0.0);
        prev = v;
    }
    assert_eq!(env.update(0.0, 0.1, 0.0, 500.0, DT), 0.0);
}

#[test]
fn zero_attack_jumps_to_full() {
    let mut env = ActivationEnvelope::new();
    assert_eq!(env.update(0.9, 0.5, 0.0, 250.0, DT), 1.0);
    // zero dt does not produce NaN either
    let mut env = ActivationEnvelope::new();
    assert_eq!(env.update(0.9, 0.5, 0.0, 250.0, 0.0), 1.0);
}

#[test]
fn minimum_threshold_is_always_active() {
    let mut env = ActivationEnvelope::new();
    let threshold = decibels_to_gain(-99.0);
    for _ in 0..64 {
        env.update(0.0, threshold, 250.0, 250.0, DT);
    }
    assert_eq!(env.value(), 1.0);
    assert!(is_gate_open(0.0, 0.0));
}

#[test]
fn non_finite_level_counts_as_silence() {
    assert!(!is_gate_open(f32::NAN, 0.1));
    assert!(!is_gate_open(f32::INFINITY, 0.1));
    let mut env = ActivationEnvelope::new();
    env.update(f32::NAN, 0.1, 100.0, 100.0, DT);
    assert_eq!(env.value(), 0.0);
}

#[test]
fn activation_stays_bounded_for_arbitrary_inputs() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut env = ActivationEnvelope::new();
    for _ in 0..5_000 {
        let level: f32 = rng.gen_range(0.0..=1.0);
        let threshold: f32 = rng.gen_range(0.0..=1.0);
        let attack: f32 = rng.gen_range(0.0..=2000.0);
        let release: f32 = rng.gen_range(0.0..=2000.0);
        let dt: f32 = rng.gen_range(0.0..=1.0);
        let v = env.update(level, threshold, attack, release, dt);
        assert!((0.0..=1.0).contains(&v), "activation {v} out of range");
    }
}

#[test]
fn ramp_is_monotonic_while_gate_state_holds() {
    let mut env = ActivationEnvelope::new();
    let mut prev = env.value();
    for _ in 0..100 {
        let v = env.update(0.8, 0.2, 700.0, 300.0, 0.013);
        assert!(v >= prev);
        prev = v;
    }
    for _ in 0..100 {
        let v = env.update(0.1, 0.2, 700.0, 300.0, 0.013);
        assert!(v <= prev);
        prev = v;
    }
}
