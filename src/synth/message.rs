//! Control thread → audio thread plumbing.
//!
//! The control side ([`RingBackend`]) pushes [`VoiceCommand`]s into a
//! lock-free ring buffer; the audio callback owns a [`RingRenderer`] that
//! drains the queue at the top of every block and then renders. The only
//! state flowing back is the rendered frame count, published through an
//! atomic so the control side can timestamp voices against the clock the
//! audio is actually on.
//!
//! "Stop everything" must work even when the queue is full, so besides the
//! `StopAll` command there is a silence flag on the shared clock that the
//! renderer checks after draining the queue.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, PushError, RingBuffer};
#[cfg(feature = "rtrb")]
use tracing::warn;

#[cfg(feature = "rtrb")]
use crate::{
    error::{PolyError, PolyResult},
    synth::{
        backend::{AudioBackend, BackendState},
        mixer::VoiceMixer,
    },
};
use crate::synth::{mixer::ScheduledVoice, VoiceId};

#[derive(Debug)]
pub enum VoiceCommand {
    Start { id: VoiceId, voice: ScheduledVoice },
    Stop { id: VoiceId },
    StopAll,
}

/// Source of commands for the renderer.
pub trait CommandReceiver {
    fn pop(&mut self) -> Option<VoiceCommand>;
}

#[cfg(feature = "rtrb")]
impl CommandReceiver for Consumer<VoiceCommand> {
    fn pop(&mut self) -> Option<VoiceCommand> {
        Consumer::pop(self).ok()
    }
}

/// Rendered-frame counter shared between the two sides.
#[derive(Debug)]
pub struct AudioClock {
    frames: AtomicU64,
    ready: AtomicBool,
    silence: AtomicBool,
    sample_rate: f32,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frames: AtomicU64::new(0),
            ready: AtomicBool::new(false),
            silence: AtomicBool::new(false),
            sample_rate,
        }
    }

    pub fn seconds(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    /// True once the audio callback has run at least once.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Ask the renderer to drop every voice at its next block.
    pub fn request_silence(&self) {
        self.silence.store(true, Ordering::Release);
    }

    fn take_silence(&self) -> bool {
        self.silence.swap(false, Ordering::AcqRel)
    }

    fn publish(&self, frames: u64) {
        self.frames.store(frames, Ordering::Release);
        self.ready.store(true, Ordering::Release);
    }
}

/// Audio-thread half: owns the mixer.
pub struct RingRenderer<R: CommandReceiver> {
    rx: R,
    mixer: VoiceMixer,
    clock: Arc<AudioClock>,
}

impl<R: CommandReceiver> RingRenderer<R> {
    pub fn new(rx: R, mixer: VoiceMixer, clock: Arc<AudioClock>) -> Self {
        Self { rx, mixer, clock }
    }

    /// Apply queued commands, render `out`, publish the new clock.
    pub fn render(&mut self, out: &mut [f32]) {
        while let Some(command) = self.rx.pop() {
            match command {
                VoiceCommand::Start { id, voice } => {
                    self.mixer.start(id, voice);
                }
                VoiceCommand::Stop { id } => {
                    self.mixer.stop(id);
                }
                VoiceCommand::StopAll => {
                    self.mixer.stop_all();
                }
            }
        }
        if self.clock.take_silence() {
            self.mixer.stop_all();
        }
        self.mixer.render(out);
        self.clock.publish(self.mixer.frame());
    }

    pub fn mixer(&self) -> &VoiceMixer {
        &self.mixer
    }
}

/// Control-thread half.
#[cfg(feature = "rtrb")]
pub struct RingBackend {
    tx: Producer<VoiceCommand>,
    clock: Arc<AudioClock>,
    sample_rate: f32,
}

/// Connected backend and renderer. `capacity` is the number of commands that
/// may be in flight between two audio callbacks.
#[cfg(feature = "rtrb")]
pub fn ring_backend(
    sample_rate: f32,
    max_voices: usize,
    master_volume: f32,
    capacity: usize,
) -> (RingBackend, RingRenderer<Consumer<VoiceCommand>>) {
    let (tx, rx) = RingBuffer::new(capacity.max(1));
    let clock = Arc::new(AudioClock::new(sample_rate));
    let mixer = VoiceMixer::new(sample_rate, max_voices, master_volume);
    (
        RingBackend {
            tx,
            clock: Arc::clone(&clock),
            sample_rate,
        },
        RingRenderer::new(rx, mixer, clock),
    )
}

#[cfg(feature = "rtrb")]
impl RingBackend {
    pub fn clock(&self) -> &Arc<AudioClock> {
        &self.clock
    }
}

#[cfg(feature = "rtrb")]
impl AudioBackend for RingBackend {
    fn current_time(&self) -> f64 {
        self.clock.seconds()
    }

    fn state(&self) -> BackendState {
        if self.tx.is_abandoned() {
            BackendState::Closed
        } else if self.clock.is_ready() {
            BackendState::Running
        } else {
            BackendState::Suspended
        }
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn start_voice(&mut self, id: VoiceId, voice: ScheduledVoice) -> PolyResult<()> {
        match self.tx.push(VoiceCommand::Start { id, voice }) {
            Ok(()) => Ok(()),
            Err(PushError::Full(_)) => {
                warn!(voice = id.0, "voice queue full");
                Err(PolyError::VoiceLimit(id.0))
            }
        }
    }

    /// The renderer may already have retired the voice; the stop is then a
    /// no-op on its side, so this never reports `AlreadyStopped`.
    fn stop_voice(&mut self, id: VoiceId) -> PolyResult<()> {
        self.tx
            .push(VoiceCommand::Stop { id })
            .map_err(|_| PolyError::QueueFull(format!("stop for voice {}", id.0)))
    }

    /// One `StopAll` command instead of a stop per voice. With the queue
    /// full the silence flag is raised instead, so nothing keeps sounding.
    /// The renderer cannot report which voices had already ended, so every
    /// id counts as stopped.
    fn stop_all(&mut self, ids: &[VoiceId]) -> PolyResult<usize> {
        if self.tx.push(VoiceCommand::StopAll).is_err() {
            warn!(live = ids.len(), "voice queue full, silencing through the clock");
            self.clock.request_silence();
        }
        Ok(ids.len())
    }
}
