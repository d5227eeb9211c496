use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
| type              | passes          | rejects      |
| ----------------- | --------------- | ------------ |
| low-pass          | below cutoff    | above cutoff |
| high-pass         | above cutoff    | below cutoff |
| band-pass         | around cutoff   | both sides   |
| notch / band-stop | both sides      | at cutoff    |

Topology-preserving (trapezoidal) state-variable filter. One pass of the two
integrators yields all four responses; the voice picks one.

    g = tan(π · fc / fs)        prewarped integrator gain
    k = 2 - 2 · resonance       damping (k → 0 approaches self-oscillation)

Resonance is clamped to [0, 0.98] so k never reaches zero.
*/

pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_CUTOFF_HZ: f32 = 20_000.0;
const MAX_RESONANCE: f32 = 0.98;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

pub struct SVFilter {
    ic1eq: f32,
    ic2eq: f32,
    cutoff_hz: f32,
    resonance: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, resonance: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz: cutoff_hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ),
            resonance: resonance.clamp(0.0, MAX_RESONANCE),
            filter_type,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz, 0.0)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz, 0.0)
    }

    pub fn bandpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::BandPass, cutoff_hz, 0.0)
    }

    pub fn notch(cutoff_hz: f32) -> Self {
        Self::new(FilterType::Notch, cutoff_hz, 0.0)
    }

    #[inline]
    fn coefficients(&self, sample_rate: f32) -> (f32, f32) {
        // keep the prewarp below Nyquist
        let cutoff = self.cutoff_hz.min(sample_rate * 0.49);
        let g = (PI * cutoff / sample_rate).tan();
        let k = 2.0 - 2.0 * self.resonance;
        (g, k)
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32, g: f32, k: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    /// Filter `buffer` in place. Coefficients are computed once per block.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let (g, k) = self.coefficients(ctx.sample_rate);
        for sample in buffer.iter_mut() {
            let outputs = self.next_sample(*sample, g, k);
            *sample = match self.filter_type {
                FilterType::LowPass => outputs.lowpass,
                FilterType::HighPass => outputs.highpass,
                FilterType::BandPass => outputs.bandpass,
                FilterType::Notch => outputs.notch,
            };
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, MAX_RESONANCE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::OscillatorBlock;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        buffer[buffer.len().min(64)..]
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    fn filtered_sine_peak(filter: &mut SVFilter, freq: f32) -> f32 {
        let ctx = RenderCtx::from_freq(SAMPLE_RATE, freq, 1.0);
        let mut osc = OscillatorBlock::sine();
        let mut buffer = vec![0.0f32; 2048];
        osc.render(&mut buffer, &ctx);
        filter.render(&mut buffer, &ctx);
        peak_after_transient(&buffer)
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut filter = SVFilter::lowpass(500.0);
        let mut buffer = vec![1.0; 512];
        filter.render(&mut buffer, &RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0));
        assert!(buffer[511] > 0.99, "got {}", buffer[511]);
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut filter = SVFilter::highpass(500.0);
        let mut buffer = vec![1.0; 512];
        filter.render(&mut buffer, &RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0));
        assert!(buffer[511].abs() < 0.01, "got {}", buffer[511]);
    }

    #[test]
    fn lowpass_attenuates_above_cutoff() {
        let mut filter = SVFilter::lowpass(500.0);
        let peak = filtered_sine_peak(&mut filter, 5_000.0);
        assert!(peak < 0.1, "expected attenuation, got peak {peak}");
    }

    #[test]
    fn notch_rejects_center_frequency() {
        let mut filter = SVFilter::new(FilterType::Notch, 1_000.0, 0.5);
        let center = filtered_sine_peak(&mut filter, 1_000.0);
        filter.reset();
        let off = filtered_sine_peak(&mut filter, 200.0);
        assert!(center * 2.0 < off, "center={center}, off={off}");
    }

    #[test]
    fn resonance_and_cutoff_are_clamped() {
        let mut filter = SVFilter::new(FilterType::BandPass, 1.0, 5.0);
        assert_eq!(filter.cutoff(), MIN_CUTOFF_HZ);
        filter.set_cutoff(1.0e9);
        assert_eq!(filter.cutoff(), MAX_CUTOFF_HZ);

        let peak = filtered_sine_peak(&mut filter, 440.0);
        assert!(peak.is_finite());
    }
}
