use std::f32::consts::TAU;

use crate::{
    dsp::oscillator::OscillatorWaveform,
    graph::{
        node::{GraphNode, Modulatable, RenderCtx},
        oscillator::{OscNode, OscParam},
    },
};

/*
Voice Sources
=============

Every voice starts with exactly one sound source. Besides the plain
oscillator there are four other ways to make a tone:

  Additive    sum of harmonic sine partials, amplitude 1/k
  Wavetable   crossfade through sine → triangle → saw → square
  FM          sine carrier, phase-modulated by a sine at ratio × f
  Granular    short Hann-windowed sine grains sprayed at a given density

All of them follow the voice frequency from `RenderCtx` and accept pitch
modulation in cents through `OscParam::Detune`, so a vibrato LFO can be wired
to any source the same way.

Nothing here allocates after construction: partial phases and the grain pool
are sized up front.
*/

pub const MAX_PARTIALS: usize = 16;
pub const MAX_GRAINS: usize = 32;

const WAVETABLE: [OscillatorWaveform; 4] = [
    OscillatorWaveform::Sine,
    OscillatorWaveform::Triangle,
    OscillatorWaveform::Saw,
    OscillatorWaveform::Square,
];

#[derive(Debug, Clone, Copy, Default)]
struct PitchOffset {
    base_cents: f32,
    current_cents: f32,
}

impl PitchOffset {
    #[inline]
    fn ratio(&self) -> f32 {
        if self.current_cents == 0.0 {
            1.0
        } else {
            2.0_f32.powf(self.current_cents / 1200.0)
        }
    }

    fn apply(&mut self, base: f32, modulation: f32) {
        self.base_cents = base;
        self.current_cents = (base + modulation).clamp(-200.0, 200.0);
    }

    fn reset(&mut self) {
        self.current_cents = self.base_cents;
    }
}

#[inline]
fn advance(phase: &mut f32, increment: f32) {
    *phase += increment;
    *phase -= phase.floor();
}

// ---------------------------------------------------------------------------

pub struct AdditiveNode {
    partials: usize,
    phases: [f32; MAX_PARTIALS],
    norm: f32,
    pitch: PitchOffset,
}

impl AdditiveNode {
    pub fn new(partials: usize) -> Self {
        let partials = partials.clamp(1, MAX_PARTIALS);
        let sum: f32 = (1..=partials).map(|k| 1.0 / k as f32).sum();
        Self {
            partials,
            phases: [0.0; MAX_PARTIALS],
            norm: 1.0 / sum,
            pitch: PitchOffset::default(),
        }
    }

    pub fn partials(&self) -> usize {
        self.partials
    }
}

impl GraphNode for AdditiveNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let fundamental = ctx.frequency * self.pitch.ratio();
        let nyquist = ctx.sample_rate * 0.5;

        for sample in out.iter_mut() {
            let mut acc = 0.0;
            for k in 0..self.partials {
                let harmonic = (k + 1) as f32;
                let freq = fundamental * harmonic;
                if freq >= nyquist {
                    break;
                }
                acc += (TAU * self.phases[k]).sin() / harmonic;
                advance(&mut self.phases[k], freq / ctx.sample_rate);
            }
            *sample = acc * self.norm;
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.phases = [0.0; MAX_PARTIALS];
        self.pitch.reset();
    }
}

// ---------------------------------------------------------------------------

/// Morphs between neighbouring shapes of a four-entry table. `position` 0.0
/// is a sine, 1.0 a square.
pub struct WavetableNode {
    position: f32,
    phase: f32,
    pitch: PitchOffset,
}

impl WavetableNode {
    pub fn new(position: f32) -> Self {
        Self {
            position: position.clamp(0.0, 1.0),
            phase: 0.0,
            pitch: PitchOffset::default(),
        }
    }

    #[inline]
    fn value_at(&self, phase: f32) -> f32 {
        let scaled = self.position * (WAVETABLE.len() - 1) as f32;
        let index = (scaled.floor() as usize).min(WAVETABLE.len() - 2);
        let blend = scaled - index as f32;
        let a = WAVETABLE[index].value_at(phase);
        let b = WAVETABLE[index + 1].value_at(phase);
        a + (b - a) * blend
    }
}

impl GraphNode for WavetableNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let increment = (ctx.frequency * self.pitch.ratio() / ctx.sample_rate).clamp(0.0, 0.5);
        for sample in out.iter_mut() {
            *sample = self.value_at(self.phase);
            advance(&mut self.phase, increment);
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.phase = 0.0;
        self.pitch.reset();
    }
}

// ---------------------------------------------------------------------------

/// Two-operator FM:
///
/// ```text
/// out = sin(2π·carrier + index · sin(2π·modulator))
/// ```
///
/// with the modulator running at `ratio × f`. Integer ratios give harmonic
/// spectra; `index` sets how many sidebands are audible.
pub struct FmNode {
    ratio: f32,
    index: f32,
    carrier_phase: f32,
    modulator_phase: f32,
    pitch: PitchOffset,
}

impl FmNode {
    pub fn new(ratio: f32, index: f32) -> Self {
        Self {
            ratio: ratio.max(0.0),
            index: index.max(0.0),
            carrier_phase: 0.0,
            modulator_phase: 0.0,
            pitch: PitchOffset::default(),
        }
    }
}

impl GraphNode for FmNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let carrier = ctx.frequency * self.pitch.ratio();
        let carrier_inc = carrier / ctx.sample_rate;
        let modulator_inc = carrier * self.ratio / ctx.sample_rate;

        for sample in out.iter_mut() {
            let modulation = self.index * (TAU * self.modulator_phase).sin();
            *sample = (TAU * self.carrier_phase + modulation).sin();
            advance(&mut self.carrier_phase, carrier_inc);
            advance(&mut self.modulator_phase, modulator_inc);
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.carrier_phase = 0.0;
        self.modulator_phase = 0.0;
        self.pitch.reset();
    }
}

// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct Grain {
    phase: f32,
    age: usize,
    length: usize,
}

/// Sine grains with a Hann window, started `density` times per second with
/// up to ±50% jitter on the spacing. Output is scaled by the expected overlap
/// so dense clouds do not clip.
pub struct GranularNode {
    grain_seconds: f32,
    density: f32,
    grains: [Grain; MAX_GRAINS],
    until_next: f32,
    rng: u32,
    pitch: PitchOffset,
}

impl GranularNode {
    pub fn new(grain_seconds: f32, density: f32) -> Self {
        Self {
            grain_seconds: grain_seconds.clamp(0.005, 0.5),
            density: density.clamp(1.0, 200.0),
            grains: [Grain::default(); MAX_GRAINS],
            until_next: 0.0,
            rng: 0x2545_F491,
            pitch: PitchOffset::default(),
        }
    }

    #[inline]
    fn random(&mut self) -> f32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        x as f32 / u32::MAX as f32
    }

    fn spawn(&mut self, length: usize) {
        let phase = self.random();
        if let Some(slot) = self.grains.iter_mut().find(|g| g.age >= g.length) {
            *slot = Grain {
                phase,
                age: 0,
                length,
            };
        }
    }

    pub fn active_grains(&self) -> usize {
        self.grains.iter().filter(|g| g.age < g.length).count()
    }
}

impl GraphNode for GranularNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let increment = (ctx.frequency * self.pitch.ratio() / ctx.sample_rate).clamp(0.0, 0.5);
        let length = (self.grain_seconds * ctx.sample_rate).max(2.0) as usize;
        let spacing = ctx.sample_rate / self.density;
        let gain = 1.0 / (self.density * self.grain_seconds).max(1.0).sqrt();

        for sample in out.iter_mut() {
            if self.until_next <= 0.0 {
                self.spawn(length);
                let jitter = 0.5 + self.random();
                self.until_next += spacing * jitter;
            }
            self.until_next -= 1.0;

            let mut acc = 0.0;
            for grain in self.grains.iter_mut().filter(|g| g.age < g.length) {
                let t = grain.age as f32 / (grain.length - 1) as f32;
                let window = 0.5 - 0.5 * (TAU * t).cos();
                acc += (TAU * grain.phase).sin() * window;
                advance(&mut grain.phase, increment);
                grain.age += 1;
            }
            *sample = acc * gain;
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.grains = [Grain::default(); MAX_GRAINS];
        self.until_next = 0.0;
        self.pitch.reset();
    }
}

// ---------------------------------------------------------------------------

/// The one source a voice chain starts from.
pub enum SourceNode {
    Oscillator(OscNode),
    Additive(AdditiveNode),
    Wavetable(WavetableNode),
    Fm(FmNode),
    Granular(GranularNode),
}

impl SourceNode {
    /// Static detune in cents, applied on top of the voice frequency.
    pub fn with_detune(self, cents: f32) -> Self {
        let offset = PitchOffset {
            base_cents: cents,
            current_cents: cents,
        };
        match self {
            SourceNode::Oscillator(node) => SourceNode::Oscillator(node.with_detune(cents)),
            SourceNode::Additive(node) => SourceNode::Additive(AdditiveNode { pitch: offset, ..node }),
            SourceNode::Wavetable(node) => SourceNode::Wavetable(WavetableNode { pitch: offset, ..node }),
            SourceNode::Fm(node) => SourceNode::Fm(FmNode { pitch: offset, ..node }),
            SourceNode::Granular(node) => SourceNode::Granular(GranularNode { pitch: offset, ..node }),
        }
    }
}

impl GraphNode for SourceNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        match self {
            SourceNode::Oscillator(node) => node.render_block(out, ctx),
            SourceNode::Additive(node) => node.render_block(out, ctx),
            SourceNode::Wavetable(node) => node.render_block(out, ctx),
            SourceNode::Fm(node) => node.render_block(out, ctx),
            SourceNode::Granular(node) => node.render_block(out, ctx),
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        match self {
            SourceNode::Oscillator(node) => node.note_on(ctx),
            SourceNode::Additive(node) => node.note_on(ctx),
            SourceNode::Wavetable(node) => node.note_on(ctx),
            SourceNode::Fm(node) => node.note_on(ctx),
            SourceNode::Granular(node) => node.note_on(ctx),
        }
    }
}

impl Modulatable for SourceNode {
    type Param = OscParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match self {
            SourceNode::Oscillator(node) => node.get_param(param),
            SourceNode::Additive(AdditiveNode { pitch, .. })
            | SourceNode::Wavetable(WavetableNode { pitch, .. })
            | SourceNode::Fm(FmNode { pitch, .. })
            | SourceNode::Granular(GranularNode { pitch, .. }) => pitch.base_cents,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        match self {
            SourceNode::Oscillator(node) => node.apply_modulation(param, base, modulation),
            SourceNode::Additive(AdditiveNode { pitch, .. })
            | SourceNode::Wavetable(WavetableNode { pitch, .. })
            | SourceNode::Fm(FmNode { pitch, .. })
            | SourceNode::Granular(GranularNode { pitch, .. }) => pitch.apply(base, modulation),
        }
    }
}
