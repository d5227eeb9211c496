use tracing::debug;

use crate::{
    graph::{GraphNode, RenderCtx},
    synth::VoiceId,
    MAX_BLOCK_SIZE,
};

/*
Voice Mixer
===========

The mixer owns every sounding voice and lives wherever samples are produced:
inside the audio callback for the live backend, on the calling thread for
offline rendering. It keeps its own sample clock; a voice arrives already
timestamped in seconds on that clock and is converted to a frame window

    start_frame = round(start × sr)
    stop_frame  = ceil(stop × sr)

Within a block each voice renders only the frames that overlap its window,
with `ctx.time` set to seconds since the voice's own start, so the
breakpoint envelope lines up no matter which block the voice begins in. A
voice whose start is already in the past (late arrival) starts at once,
skipped forward to where it should be.

Slots are preallocated. When all are busy the voice that would stop first
is stolen; it has the least left to say.
*/

/// A note ready to render: timing on the mixer clock plus its node chain.
pub struct ScheduledVoice {
    pub start_time: f64,
    pub stop_time: f64,
    pub frequency: f32,
    pub velocity: f32,
    pub graph: Box<dyn GraphNode>,
}

impl std::fmt::Debug for ScheduledVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledVoice")
            .field("start_time", &self.start_time)
            .field("stop_time", &self.stop_time)
            .field("frequency", &self.frequency)
            .field("velocity", &self.velocity)
            .finish_non_exhaustive()
    }
}

struct MixerVoice {
    id: VoiceId,
    start_frame: u64,
    stop_frame: u64,
    ctx: RenderCtx,
    graph: Box<dyn GraphNode>,
    started: bool,
}

pub struct VoiceMixer {
    slots: Vec<Option<MixerVoice>>,
    sample_rate: f32,
    master_volume: f32,
    frame: u64,
    temp_buffer: Vec<f32>,
}

impl VoiceMixer {
    pub fn new(sample_rate: f32, max_voices: usize, master_volume: f32) -> Self {
        Self {
            slots: (0..max_voices.max(1)).map(|_| None).collect(),
            sample_rate,
            master_volume: master_volume.clamp(0.0, 1.0),
            frame: 0,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds rendered so far.
    pub fn time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn active_voices(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_playing(&self, id: VoiceId) -> bool {
        self.slots.iter().flatten().any(|voice| voice.id == id)
    }

    fn to_frame(&self, seconds: f64) -> f64 {
        seconds.max(0.0) * self.sample_rate as f64
    }

    /// Take ownership of `voice`. Returns the id of a voice that had to be
    /// stolen to make room.
    pub fn start(&mut self, id: VoiceId, voice: ScheduledVoice) -> Option<VoiceId> {
        let start_frame = self.to_frame(voice.start_time).round() as u64;
        let stop_frame = (self.to_frame(voice.stop_time).ceil() as u64).max(start_frame + 1);
        let entry = MixerVoice {
            id,
            start_frame,
            stop_frame,
            ctx: RenderCtx::from_freq(self.sample_rate, voice.frequency, voice.velocity),
            graph: voice.graph,
            started: false,
        };

        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(entry);
            return None;
        }

        // All busy: steal the voice that ends first.
        let victim = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|v| (index, v.stop_frame)))
            .min_by_key(|(_, stop)| *stop)
            .map(|(index, _)| index)?;
        let stolen = self.slots[victim].replace(entry).map(|v| v.id);
        if let Some(stolen) = stolen {
            debug!(voice = stolen.0, "voice stolen");
        }
        stolen
    }

    /// Silence `id` now. False when it is not playing.
    pub fn stop(&mut self, id: VoiceId) -> bool {
        match self.slots.iter_mut().find(|slot| matches!(slot, Some(v) if v.id == id)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) -> usize {
        let mut stopped = 0;
        for slot in &mut self.slots {
            if slot.take().is_some() {
                stopped += 1;
            }
        }
        stopped
    }

    /// Mix every voice into `out` (overwritten) and advance the clock.
    pub fn render(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let block_start = self.frame;
        let block_end = block_start + out.len() as u64;
        let sample_rate = self.sample_rate as f64;

        for slot in &mut self.slots {
            let Some(voice) = slot else { continue };
            if voice.start_frame >= block_end {
                continue;
            }

            let from = voice.start_frame.max(block_start);
            let to = voice.stop_frame.min(block_end);
            if from < to {
                let elapsed = (from - voice.start_frame) as f64 / sample_rate;
                let ctx = voice.ctx.at(elapsed);
                if !voice.started {
                    voice.graph.note_on(&ctx);
                    voice.started = true;
                }

                let offset = (from - block_start) as usize;
                let len = (to - from) as usize;
                let temp = &mut self.temp_buffer[..len];
                temp.fill(0.0);
                voice.graph.render_block(temp, &ctx);
                for (o, v) in out[offset..offset + len].iter_mut().zip(temp.iter()) {
                    *o += v;
                }
            }

            if voice.stop_frame <= block_end || (voice.started && !voice.graph.is_active()) {
                *slot = None;
            }
        }

        if self.master_volume != 1.0 {
            for sample in out.iter_mut() {
                *sample *= self.master_volume;
            }
        }
        self.frame = block_end;
    }
}
