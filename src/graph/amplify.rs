use crate::{
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/// Multiply a signal by a modulator, sample by sample.
///
/// Used for gain automation and tremolo: the modulator renders a gain curve
/// that is applied to whatever the signal produced.
pub struct Amplify<N, M> {
    pub signal: N,
    pub modulator: M,
    temp_buffer: Vec<f32>,
}

impl<N, M> Amplify<N, M> {
    pub fn new(signal: N, modulator: M) -> Self {
        Self {
            signal,
            modulator,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<N: GraphNode, M: GraphNode> GraphNode for Amplify<N, M> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.signal.render_block(out, ctx);

        // no allocation on the audio thread; blocks never exceed MAX_BLOCK_SIZE
        let len = out.len().min(MAX_BLOCK_SIZE);
        let gains = &mut self.temp_buffer[..len];
        gains.fill(0.0);
        self.modulator.render_block(gains, ctx);

        for (o, g) in out.iter_mut().zip(gains.iter()) {
            *o *= *g;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.signal.note_on(ctx);
        self.modulator.note_on(ctx);
    }

    fn is_active(&self) -> bool {
        self.signal.is_active() && self.modulator.is_active()
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{
        extensions::NodeExt,
        lfo::LfoNode,
        node::{GraphNode, RenderCtx},
        oscillator::OscNode,
    };

    #[test]
    fn tremolo_scales_signal() {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut plain = OscNode::sine();
        let mut shaped = OscNode::sine().amplify(LfoNode::tremolo(4.0, 1.0));

        let mut a = vec![0.0f32; 2048];
        let mut b = vec![0.0f32; 2048];
        plain.render_block(&mut a, &ctx);
        shaped.render_block(&mut b, &ctx);

        for (dry, wet) in a.iter().zip(&b) {
            assert!(wet.abs() <= dry.abs() + 1e-6);
        }
    }
}
