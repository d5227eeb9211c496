use crate::{
    dsp::envelope::GainAutomation,
    graph::node::{GraphNode, RenderCtx},
};

/// Renders a precomputed gain curve. Attach with `.amplify(..)` so the curve
/// multiplies whatever the voice chain produced.
///
/// The node reads `ctx.time` as seconds since the voice started, so the
/// mixer must advance it block by block.
pub struct AutomationNode {
    automation: GainAutomation,
    finished: bool,
}

impl AutomationNode {
    pub fn new(automation: GainAutomation) -> Self {
        Self {
            automation,
            finished: false,
        }
    }

    pub fn automation(&self) -> &GainAutomation {
        &self.automation
    }
}

impl GraphNode for AutomationNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.automation.render(out, ctx);

        let block_end = ctx.time + out.len() as f64 / ctx.sample_rate as f64;
        let last_level = out.last().copied().unwrap_or(0.0);
        self.finished = block_end >= self.automation.end_time() && last_level <= 0.0;
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.automation.reset();
        self.finished = false;
    }

    fn is_active(&self) -> bool {
        !self.finished
    }
}
