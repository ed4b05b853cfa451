//! Linear attack/release envelope turning the input level into an activation amount.

use crate::constants::always_active_threshold;

/// Activation in \[0, 1\]; 0 is the rest sphere, 1 is fully driven by the regions.
///
/// The envelope ramps linearly: a full rise takes `attack_ms` and a full fall
/// takes `release_ms`, independent of the frame rate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActivationEnvelope {
    value: f32,
}

impl ActivationEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    /// Advance by `dt` seconds and return the new activation.
    pub fn update(
        &mut self,
        audio_level: f32,
        threshold: f32,
        attack_ms: f32,
        release_ms: f32,
        dt: f32,
    ) -> f32 {
        if is_gate_open(audio_level, threshold) {
            if self.value < 1.0 {
                self.value = ramp(self.value, 1.0, attack_ms, dt);
            }
        } else if self.value > 0.0 {
            self.value = ramp(self.value, -1.0, release_ms, dt);
        }
        self.value
    }
}

/// True when `audio_level` should drive the envelope upwards.
///
/// Thresholds at or below -99 dB keep the gate permanently open. A non-finite
/// level counts as silence.
pub fn is_gate_open(audio_level: f32, threshold: f32) -> bool {
    if threshold <= always_active_threshold() {
        return true;
    }
    audio_level.is_finite() && audio_level >= threshold
}

fn ramp(value: f32, direction: f32, time_ms: f32, dt: f32) -> f32 {
    if time_ms.is_nan() || time_ms <= 0.0 {
        // zero-length ramp: jump to the end
        return if direction > 0.0 { 1.0 } else { 0.0 };
    }
    let step = 1000.0 / time_ms * dt.max(0.0);
    (value + direction * step).clamp(0.0, 1.0)
}
