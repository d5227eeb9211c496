use crate::graph::node::RenderCtx;

/*
Scheduled Gain Automation
=========================

The control side decides the whole amplitude envelope of a note up front and
hands the renderer a list of breakpoints: (time, level) pairs with times in
seconds from the voice's start. Between two breakpoints the level moves on a
straight line; before the first it holds the first level, after the last it
holds the last level.

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
         t0  t1  t2          t3 t4

This is the same contract as "linear ramp to value at time" in host audio
APIs: the renderer never decides when a phase ends, it only interpolates. That
keeps the audible envelope identical no matter how the control thread's frame
timing jitters, because every timestamp was fixed when the note was
triggered.

Breakpoint times must be non-decreasing. Two breakpoints at the same time are
a step. The planner on the control side emits them in order; `new` sorts
them again, so an unordered list renders as a different shape, never garbage.

Rendering keeps a cursor on the current segment, so a block costs one
comparison per sample rather than a search.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    /// Seconds from voice start.
    pub time: f64,
    /// Gain, 0.0..=1.0.
    pub level: f32,
}

impl Breakpoint {
    pub fn new(time: f64, level: f32) -> Self {
        Self { time, level }
    }
}

#[derive(Debug, Clone)]
pub struct GainAutomation {
    points: Vec<Breakpoint>,
    cursor: usize,
}

impl GainAutomation {
    pub fn new(mut points: Vec<Breakpoint>) -> Self {
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { points, cursor: 0 }
    }

    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }

    /// Time of the last breakpoint (0 for an empty automation).
    pub fn end_time(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.time)
    }

    /// Level at `time`, without touching the render cursor.
    pub fn level_at(&self, time: f64) -> f32 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        if time <= first.time {
            return first.level;
        }
        let segment = self.points.windows(2).find(|w| time < w[1].time);
        match segment {
            Some(w) => interpolate(w[0], w[1], time),
            None => self.points[self.points.len() - 1].level,
        }
    }

    #[inline]
    fn advance_to(&mut self, time: f64) -> f32 {
        let len = self.points.len();
        if len == 0 {
            return 0.0;
        }
        while self.cursor + 1 < len && time >= self.points[self.cursor + 1].time {
            self.cursor += 1;
        }

        let current = self.points[self.cursor];
        if time <= current.time || self.cursor + 1 == len {
            return current.level;
        }
        interpolate(current, self.points[self.cursor + 1], time)
    }

    /// Write levels for the samples starting at `ctx.time` (seconds from the
    /// voice start). Blocks must be rendered in increasing time order.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let step = 1.0 / ctx.sample_rate as f64;
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample = self.advance_to(ctx.time + i as f64 * step);
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

#[inline]
fn interpolate(a: Breakpoint, b: Breakpoint, time: f64) -> f32 {
    let span = b.time - a.time;
    if span <= 0.0 {
        return b.level;
    }
    let t = ((time - a.time) / span).clamp(0.0, 1.0) as f32;
    a.level + (b.level - a.level) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn adsr_shape() -> GainAutomation {
        GainAutomation::new(vec![
            Breakpoint::new(0.0, 0.0),
            Breakpoint::new(0.01, 1.0),
            Breakpoint::new(0.05, 0.5),
            Breakpoint::new(0.2, 0.5),
            Breakpoint::new(0.3, 0.0),
        ])
    }

    #[test]
    fn interpolates_between_breakpoints() {
        let env = adsr_shape();
        assert!((env.level_at(0.005) - 0.5).abs() < 1e-6);
        assert!((env.level_at(0.1) - 0.5).abs() < 1e-6);
        assert!((env.level_at(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn holds_outside_the_schedule() {
        let env = adsr_shape();
        assert_eq!(env.level_at(-1.0), 0.0);
        assert_eq!(env.level_at(10.0), 0.0);
    }

    #[test]
    fn block_render_matches_point_queries() {
        let mut env = adsr_shape();
        let mut block = vec![0.0f32; 100];
        let mut rendered = Vec::new();
        for start in (0..4).map(|b| b as f64 * 0.1) {
            let mut ctx = RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0);
            ctx.time = start;
            env.render(&mut block, &ctx);
            rendered.extend_from_slice(&block);
        }

        for (i, &level) in rendered.iter().enumerate() {
            let expected = env.level_at(i as f64 / SAMPLE_RATE as f64);
            assert!((level - expected).abs() < 1e-4, "sample {i}: {level} vs {expected}");
        }
    }

    #[test]
    fn equal_times_form_a_step() {
        let env = GainAutomation::new(vec![
            Breakpoint::new(0.0, 0.0),
            Breakpoint::new(0.1, 0.0),
            Breakpoint::new(0.1, 1.0),
        ]);
        assert_eq!(env.level_at(0.1), 1.0);
        assert_eq!(env.level_at(0.099), 0.0);
    }
}
