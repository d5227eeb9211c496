use crate::graph::node::{GraphNode, RenderCtx};

/*
Serial Chain (Through)
======================

Renders the source into the output buffer, then hands that buffer to the
second node which processes it in place:

  [Source] ──→ [Effect] ──→ output

Every stage of a voice after the sound source is attached this way, for
example:

    OscNode::sawtooth()
        .through(FilterNode::lowpass(1_200.0))
        .through(DriveNode::new(0.3))
        .amplify(AutomationNode::new(schedule.automation()))
*/

pub struct Through<S, F> {
    pub(crate) source: S,
    pub(crate) effect: F,
}

impl<S, F> Through<S, F> {
    pub fn new(source: S, effect: F) -> Self {
        Self { source, effect }
    }
}

impl<S: GraphNode, F: GraphNode> GraphNode for Through<S, F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.effect.render_block(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source.note_on(ctx);
        self.effect.note_on(ctx);
    }

    fn is_active(&self) -> bool {
        self.source.is_active() || self.effect.is_active()
    }
}
