#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
Phase-Accumulator Oscillator
============================

Every pitched waveform here is a function of a normalized phase in [0, 1).
Each sample the phase advances by `frequency / sample_rate` and wraps:

    phase += frequency / sample_rate
    if phase >= 1.0 { phase -= 1.0 }

so a 480 Hz tone at 48 kHz walks 0.01 of a cycle per sample and repeats every
100 samples.

Shapes:

    sine      sin(2π·phase)
    saw       2·phase - 1                 (rising ramp)
    square    +1 for phase < 0.5, else -1
    triangle  1 - 4·|phase - 0.5|
    noise     xorshift32, scaled to [-1, 1], ignores phase

The saw and square have hard discontinuities, which alias badly at high
pitches. PolyBLEP smooths the sample on each side of a jump with a small
polynomial residual, which removes most of the audible fold-over for the price
of a couple of multiplies.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscillatorWaveform {
    #[default]
    Sine,
    Saw,
    Square,
    Triangle,
    Noise,
}

impl OscillatorWaveform {
    pub const ALL: [OscillatorWaveform; 5] = [
        OscillatorWaveform::Sine,
        OscillatorWaveform::Saw,
        OscillatorWaveform::Square,
        OscillatorWaveform::Triangle,
        OscillatorWaveform::Noise,
    ];

    /// Waveform value at `phase` (0..1). Noise has no phase and returns 0.
    #[inline]
    pub fn value_at(self, phase: f32) -> f32 {
        match self {
            OscillatorWaveform::Sine => (std::f32::consts::TAU * phase).sin(),
            OscillatorWaveform::Saw => 2.0 * phase - 1.0,
            OscillatorWaveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscillatorWaveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            OscillatorWaveform::Noise => 0.0,
        }
    }
}

#[inline]
fn poly_blep(phase: f32, increment: f32) -> f32 {
    if increment <= 0.0 {
        return 0.0;
    }
    if phase < increment {
        let t = phase / increment;
        2.0 * t - t * t - 1.0
    } else if phase > 1.0 - increment {
        let t = (phase - 1.0) / increment;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
    rng: u32,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
            rng: 0x9E37_79B9,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn noise() -> Self {
        Self::new(OscillatorWaveform::Noise)
    }

    /// Seed the noise generator (grains use this to decorrelate).
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.rng = seed.max(1);
        self
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    fn xorshift(&mut self) -> f32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    /// Produce one sample at `frequency` and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let increment = (frequency / sample_rate).clamp(0.0, 0.5);
        let phase = self.phase;

        let sample = match self.waveform {
            OscillatorWaveform::Noise => self.xorshift(),
            OscillatorWaveform::Saw => {
                OscillatorWaveform::Saw.value_at(phase) - poly_blep(phase, increment)
            }
            OscillatorWaveform::Square => {
                let half = (phase + 0.5) % 1.0;
                OscillatorWaveform::Square.value_at(phase) + poly_blep(phase, increment)
                    - poly_blep(half, increment)
            }
            other => other.value_at(phase),
        };

        self.phase += increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    /// Fill `buffer` with the waveform at `ctx.frequency`.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(ctx.frequency, ctx.sample_rate);
        }
    }
}
