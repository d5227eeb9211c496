use crate::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running below the audio band (0.1 - 20 Hz) whose
output moves a parameter instead of reaching the speakers. It ignores the
voice's note frequency and runs at its own rate.

Output is bipolar (-1..+1) by default, which is what vibrato and filter
sweeps want: the parameter swings above and below its base value. Tremolo
wants a gain that dips and comes back to unity instead, so `tremolo` maps the
wave to

    gain = 1 - depth * (lfo + 1) / 2

which stays in [1 - depth, 1] and never boosts the signal.
*/

pub struct LfoNode {
    osc: OscillatorBlock,
    frequency: f32,
    tremolo_depth: Option<f32>,
}

impl LfoNode {
    pub fn new(waveform: OscillatorWaveform, frequency: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency,
            tremolo_depth: None,
        }
    }

    pub fn sine(frequency: f32) -> Self {
        Self::new(OscillatorWaveform::Sine, frequency)
    }

    /// Unipolar gain LFO for amplitude modulation.
    pub fn tremolo(frequency: f32, depth: f32) -> Self {
        Self {
            tremolo_depth: Some(depth.clamp(0.0, 1.0)),
            ..Self::sine(frequency)
        }
    }
}

impl GraphNode for LfoNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let lfo_ctx = RenderCtx::from_freq(ctx.sample_rate, self.frequency, 1.0);
        self.osc.render(out, &lfo_ctx);

        if let Some(depth) = self.tremolo_depth {
            for sample in out.iter_mut() {
                *sample = 1.0 - depth * (*sample + 1.0) * 0.5;
            }
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.osc.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lfo_ignores_note_frequency() {
        let mut a = LfoNode::sine(5.0);
        let mut b = LfoNode::sine(5.0);
        let mut buffer_a = vec![0.0; 512];
        let mut buffer_b = vec![0.0; 512];

        a.render_block(&mut buffer_a, &RenderCtx::from_freq(48_000.0, 440.0, 1.0));
        b.render_block(&mut buffer_b, &RenderCtx::from_freq(48_000.0, 880.0, 1.0));

        assert_eq!(buffer_a, buffer_b);
    }

    #[test]
    fn tremolo_never_boosts() {
        let mut lfo = LfoNode::tremolo(8.0, 0.6);
        let mut buffer = vec![0.0; 48_000 / 4];
        lfo.render_block(&mut buffer, &RenderCtx::from_freq(48_000.0, 440.0, 1.0));

        assert!(buffer.iter().all(|&g| (0.4 - 1e-4..=1.0 + 1e-4).contains(&g)));
        assert!(buffer.iter().any(|&g| g < 0.5), "tremolo should reach its dip");
    }
}
