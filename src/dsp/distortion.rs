//! Soft-clip waveshaping for the voice "drive" setting.
//!
//! `f(x) = x / (1 + |x|)` applied to `x * gain`, where
//! `gain = 1 + 9 * amount` so `amount` 0.0..=1.0 maps to drive 1..10. Output
//! is divided by `f(gain)` so a full-scale input still peaks at full scale and
//! turning the knob changes color, not loudness.

/// Soft clipping using x / (1 + |x|) transfer function.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Drive gain for a normalized `amount` (0 = clean).
#[inline]
pub fn drive_gain(amount: f32) -> f32 {
    1.0 + 9.0 * amount.clamp(0.0, 1.0)
}

/// Level-compensated soft clip of a whole buffer. `amount` of 0 is a no-op.
pub fn drive_buffer(buffer: &mut [f32], amount: f32) {
    if amount <= 0.0 {
        return;
    }
    let gain = drive_gain(amount);
    let makeup = 1.0 / soft_clip(1.0, gain);
    for sample in buffer.iter_mut() {
        *sample = soft_clip(*sample, gain) * makeup;
    }
}
