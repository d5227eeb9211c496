use crate::{
    graph::node::{GraphNode, Modulatable, RenderCtx},
    MAX_BLOCK_SIZE,
};

/*
Modulate Node
=============

Connects an LFO to a parameter on another node:

    modulated_value = base_value + (lfo × depth)

With cutoff = 1000 Hz and depth = 500 Hz the filter sweeps 500..1500 Hz.

Modulation is applied at block rate: the LFO block is averaged and the
parameter set once before the source renders. At 48 kHz and 256-sample blocks
that is ~190 updates per second, far above any LFO rate a voice uses, and it
keeps coefficient recomputation (the filter's `tan`) out of the per-sample
loop.
*/

pub struct Modulate<S, L>
where
    S: GraphNode + Modulatable,
    L: GraphNode,
{
    source: S,
    lfo: L,
    param: S::Param,
    depth: f32,
    lfo_buffer: Vec<f32>,
}

impl<S, L> Modulate<S, L>
where
    S: GraphNode + Modulatable,
    L: GraphNode,
{
    pub fn new(source: S, lfo: L, param: S::Param, depth: f32) -> Self {
        Self {
            source,
            lfo,
            param,
            depth,
            lfo_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

#[inline]
fn block_average(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    block.iter().sum::<f32>() / block.len() as f32
}

impl<S, L> GraphNode for Modulate<S, L>
where
    S: GraphNode + Modulatable,
    L: GraphNode,
{
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let len = out.len().min(MAX_BLOCK_SIZE);
        self.lfo.render_block(&mut self.lfo_buffer[..len], ctx);

        let base_value = self.source.get_param(self.param);
        let modulation = block_average(&self.lfo_buffer[..len]) * self.depth;
        self.source.apply_modulation(self.param, base_value, modulation);

        self.source.render_block(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source.note_on(ctx);
        self.lfo.note_on(ctx);
    }

    fn is_active(&self) -> bool {
        self.source.is_active()
    }
}
