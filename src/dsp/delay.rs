/// Circular-buffer delay line. The buffer is sized once at construction (on
/// the control thread) and never reallocated while rendering.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(max_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_samples.max(1)],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Write `sample`, return the value written `delay_samples` ago.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let delay_samples = delay_samples.clamp(1, len);

        let read_pos = (self.write_pos + len - delay_samples) % len;
        let delayed = self.buffer[read_pos];

        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % len;

        delayed
    }

    /// Feedback echo mixed over the dry signal in place.
    pub fn render_echo(&mut self, buffer: &mut [f32], delay_samples: usize, feedback: f32, mix: f32) {
        let feedback = feedback.clamp(0.0, 0.95);
        for sample in buffer.iter_mut() {
            let len = self.buffer.len();
            let delay_samples = delay_samples.clamp(1, len);
            let read_pos = (self.write_pos + len - delay_samples) % len;
            let wet = self.buffer[read_pos];

            self.buffer[self.write_pos] = *sample + wet * feedback;
            self.write_pos = (self.write_pos + 1) % len;

            *sample += wet * mix;
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
