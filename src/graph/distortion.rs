use crate::{
    dsp::distortion::drive_buffer,
    graph::node::{GraphNode, RenderCtx},
};

/*
Drive Node
==========

Soft saturation on the voice signal. `amount` runs 0.0..=1.0:

  0.0   clean (bypass)
  0.3   warm, rounded peaks
  1.0   thick, compressed, lots of odd harmonics

Example:

  let lead = OscNode::sawtooth()
      .through(FilterNode::lowpass(2_400.0))
      .through(DriveNode::new(0.4));
*/

pub struct DriveNode {
    amount: f32,
}

impl DriveNode {
    pub fn new(amount: f32) -> Self {
        Self {
            amount: amount.clamp(0.0, 1.0),
        }
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }
}

impl GraphNode for DriveNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        drive_buffer(out, self.amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_stays_full_scale() {
        let mut node = DriveNode::new(0.8);
        let mut block = vec![1.0f32, 0.25, -1.0];
        node.render_block(&mut block, &RenderCtx::from_freq(48_000.0, 440.0, 1.0));

        assert!((block[0] - 1.0).abs() < 1e-5);
        assert!(block[1] > 0.25, "quiet samples are pushed up");
        assert!((block[2] + 1.0).abs() < 1e-5);
    }
}
