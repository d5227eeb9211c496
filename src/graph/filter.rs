use crate::{
    dsp::filter::{FilterType, SVFilter},
    graph::node::{GraphNode, Modulatable, RenderCtx},
};

/*
State-Variable Filter Node
==========================

Wraps `SVFilter` for use in a voice chain. The node remembers the configured
("base") cutoff and resonance separately from what the filter is currently
running at, so modulation always swings around the configured value instead
of drifting.

Cutoff, roughly:
  200 Hz    muffled, through a wall
  1000 Hz   warm
  5000 Hz   present, clear
  20000 Hz  fully open

Resonance 0.0 is a gentle rolloff; towards 1.0 the cutoff region rings.
*/

#[derive(Clone, Copy, Debug)]
pub enum FilterParam {
    Cutoff,
    Resonance,
}

pub struct FilterNode {
    filter: SVFilter,
    base_cutoff: f32,
    base_resonance: f32,
}

impl FilterNode {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, resonance: f32) -> Self {
        Self {
            filter: SVFilter::new(filter_type, cutoff_hz, resonance),
            base_cutoff: cutoff_hz,
            base_resonance: resonance,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz, 0.0)
    }

    /// Cutoff the filter is running at right now (base plus modulation).
    pub fn current_cutoff(&self) -> f32 {
        self.filter.cutoff()
    }
}

impl Modulatable for FilterNode {
    type Param = FilterParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            FilterParam::Cutoff => self.base_cutoff,
            FilterParam::Resonance => self.base_resonance,
        }
    }

    fn apply_modulation(&mut self, param: Self::Param, base: f32, modulation: f32) {
        let final_value = base + modulation;
        match param {
            FilterParam::Cutoff => {
                self.base_cutoff = base;
                self.filter.set_cutoff(final_value);
            }
            FilterParam::Resonance => {
                self.base_resonance = base;
                self.filter.set_resonance(final_value);
            }
        }
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.filter.render(out, ctx);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.filter.reset();
    }
}
