use crate::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};
use crate::graph::node::{GraphNode, Modulatable, RenderCtx};

/*
Audio Oscillator
================

The pitched sound source of the subtractive voice. It follows the voice's
frequency from `RenderCtx` and applies a fixed detune plus whatever the pitch
modulation (vibrato) adds on top:

    frequency = ctx.frequency * 2^((detune_cents + vibrato_cents) / 1200)

100 cents = 1 semitone, so a vibrato depth of 20 cents is a fifth of a
semitone either way, which is already clearly audible.

Waveform character, briefly:

  Sine      pure, no harmonics
  Saw       all harmonics, bright and buzzy
  Square    odd harmonics, hollow
  Triangle  odd harmonics falling fast, soft
  Noise     unpitched hiss

Example usage:
  let voice = OscNode::new(OscillatorWaveform::Saw)
      .with_detune(7.0)
      .through(FilterNode::new(FilterType::LowPass, 1800.0, 0.3));
*/

pub struct OscNode {
    osc: OscillatorBlock,
    /// Static detune in cents.
    detune_cents: f32,
    /// Detune currently applied, static plus modulation.
    current_cents: f32,
}

/// Parameters that can be modulated on an oscillator
#[derive(Clone, Copy, Debug)]
pub enum OscParam {
    /// Detune in cents (100 cents = 1 semitone)
    Detune,
}

impl OscNode {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            detune_cents: 0.0,
            current_cents: 0.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Saw)
    }

    /// Set detune in cents (100 cents = 1 semitone).
    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_cents = cents;
        self.current_cents = cents;
        self
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let frequency = if self.current_cents != 0.0 {
            ctx.frequency * 2.0_f32.powf(self.current_cents / 1200.0)
        } else {
            ctx.frequency
        };

        let detuned = RenderCtx { frequency, ..*ctx };
        self.osc.render(out, &detuned);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.osc.reset();
        self.current_cents = self.detune_cents;
    }
}

impl Modulatable for OscNode {
    type Param = OscParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            OscParam::Detune => self.detune_cents,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        match param {
            OscParam::Detune => {
                // ±2 semitones is plenty for vibrato
                self.current_cents = (base + modulation).clamp(-200.0, 200.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let ctx = RenderCtx::from_note(sample_rate, 69, 1.0);
        let mut osc = OscNode::sine();

        let mut buffer = vec![0.0f32; 128];
        osc.render_block(&mut buffer, &ctx);

        let sample_index = 12;
        let expected = (TAU * ctx.frequency * sample_index as f32 / sample_rate).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn detune_an_octave_doubles_the_period_rate() {
        let ctx = RenderCtx::from_freq(48_000.0, 480.0, 1.0);
        let mut plain = OscNode::sine();
        let mut up = OscNode::sine().with_detune(1200.0);
        // modulation clamp does not apply to the static detune
        let mut a = vec![0.0f32; 200];
        let mut b = vec![0.0f32; 200];
        plain.render_block(&mut a, &ctx);
        up.render_block(&mut b, &ctx);

        // one octave up: sample n of `up` equals sample 2n of `plain`
        for n in 0..100 {
            assert!((b[n] - a[2 * n]).abs() < 1e-3, "sample {n}");
        }
    }

    #[test]
    fn modulation_is_clamped() {
        let mut osc = OscNode::sawtooth();
        osc.apply_modulation(OscParam::Detune, 0.0, 1_000.0);
        assert_eq!(osc.current_cents, 200.0);
    }
}
