use crate::{
    dsp::delay::DelayLine,
    graph::node::{GraphNode, RenderCtx},
};

/// Longest echo a voice may carry.
pub const MAX_DELAY_SECONDS: f32 = 2.0;

/// Feedback echo over the dry signal.
///
/// The delay line is sized for `sample_rate` when the node is built, so the
/// audio thread never allocates.
pub struct EchoNode {
    delay_line: DelayLine,
    delay_samples: usize,
    feedback: f32,
    mix: f32,
}

impl EchoNode {
    pub fn new(delay_seconds: f32, feedback: f32, mix: f32, sample_rate: f32) -> Self {
        let delay_seconds = delay_seconds.clamp(0.0, MAX_DELAY_SECONDS);
        let delay_samples = (delay_seconds * sample_rate).round().max(1.0) as usize;
        Self {
            delay_line: DelayLine::new(delay_samples),
            delay_samples,
            feedback,
            mix: mix.clamp(0.0, 1.0),
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }
}

impl GraphNode for EchoNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        self.delay_line
            .render_echo(out, self.delay_samples, self.feedback, self.mix);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        // clear the tail of a stolen voice
        self.delay_line.reset();
    }
}
