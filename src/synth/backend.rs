use tracing::{debug, warn};

use crate::{
    error::{PolyError, PolyResult},
    synth::{
        mixer::{ScheduledVoice, VoiceMixer},
        VoiceId,
    },
};

/// Whether a backend is producing audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Running,
    /// Device not started yet (or paused by the host); voices are refused.
    Suspended,
    Closed,
}

/// Where scheduled voices go. The engine only needs a clock and a way to
/// hand over or cancel voices; how samples reach a speaker (or a buffer) is
/// up to the implementation.
pub trait AudioBackend {
    /// Seconds on the clock voices are scheduled against.
    fn current_time(&self) -> f64;

    fn state(&self) -> BackendState;

    /// Ask a suspended backend to run again; returns the state afterwards.
    fn resume(&mut self) -> BackendState {
        self.state()
    }

    fn sample_rate(&self) -> f32;

    fn start_voice(&mut self, id: VoiceId, voice: ScheduledVoice) -> PolyResult<()>;

    /// Fails with [`PolyError::AlreadyStopped`] when the voice has already
    /// ended, if the backend can tell.
    fn stop_voice(&mut self, id: VoiceId) -> PolyResult<()>;

    /// Halt every voice in `ids` and return how many were still sounding.
    ///
    /// Stops them one at a time; voices that already ended are skipped, and
    /// a failure on one voice does not keep the rest playing. Backends that
    /// can silence everything in one step should override this.
    fn stop_all(&mut self, ids: &[VoiceId]) -> PolyResult<usize> {
        let mut stopped = 0;
        for &id in ids {
            match self.stop_voice(id) {
                Ok(()) => stopped += 1,
                Err(PolyError::AlreadyStopped(_)) => {
                    debug!(voice = id.0, "voice already finished");
                }
                Err(err) => warn!(voice = id.0, %err, "failed to stop voice"),
            }
        }
        Ok(stopped)
    }
}

/// Renders on the calling thread into plain buffers. Time only moves when
/// [`OfflineBackend::render`] is called.
pub struct OfflineBackend {
    mixer: VoiceMixer,
    state: BackendState,
}

impl OfflineBackend {
    pub fn new(sample_rate: f32, max_voices: usize, master_volume: f32) -> Self {
        Self {
            mixer: VoiceMixer::new(sample_rate, max_voices, master_volume),
            state: BackendState::Running,
        }
    }

    pub fn set_state(&mut self, state: BackendState) {
        self.state = state;
    }

    pub fn render(&mut self, out: &mut [f32]) {
        self.mixer.render(out);
    }

    /// Render `seconds` of audio into a fresh buffer.
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<f32> {
        let frames = (seconds.max(0.0) * self.mixer.sample_rate() as f64).round() as usize;
        let mut out = vec![0.0; frames];
        self.mixer.render(&mut out);
        out
    }

    pub fn mixer(&self) -> &VoiceMixer {
        &self.mixer
    }
}

impl AudioBackend for OfflineBackend {
    fn current_time(&self) -> f64 {
        self.mixer.time()
    }

    fn state(&self) -> BackendState {
        self.state
    }

    fn resume(&mut self) -> BackendState {
        if self.state == BackendState::Suspended {
            self.state = BackendState::Running;
        }
        self.state
    }

    fn sample_rate(&self) -> f32 {
        self.mixer.sample_rate()
    }

    fn start_voice(&mut self, id: VoiceId, voice: ScheduledVoice) -> PolyResult<()> {
        if self.state != BackendState::Running {
            return Err(PolyError::AudioUnavailable(format!("offline backend is {:?}", self.state)));
        }
        self.mixer.start(id, voice);
        Ok(())
    }

    fn stop_voice(&mut self, id: VoiceId) -> PolyResult<()> {
        if self.mixer.stop(id) {
            Ok(())
        } else {
            Err(PolyError::AlreadyStopped(id.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphNode, RenderCtx};

    struct Ones;

    impl GraphNode for Ones {
        fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
            out.fill(1.0);
        }
    }

    fn voice(start: f64, stop: f64) -> ScheduledVoice {
        ScheduledVoice {
            start_time: start,
            stop_time: stop,
            frequency: 220.0,
            velocity: 1.0,
            graph: Box::new(Ones),
        }
    }

    #[test]
    fn clock_follows_rendered_frames() {
        let mut backend = OfflineBackend::new(1_000.0, 4, 1.0);
        assert_eq!(backend.current_time(), 0.0);
        backend.render_seconds(0.25);
        assert_eq!(backend.current_time(), 0.25);
    }

    #[test]
    fn suspended_backend_refuses_voices() {
        let mut backend = OfflineBackend::new(1_000.0, 4, 1.0);
        backend.set_state(BackendState::Suspended);
        assert!(matches!(
            backend.start_voice(VoiceId(1), voice(0.0, 1.0)),
            Err(PolyError::AudioUnavailable(_))
        ));
    }

    #[test]
    fn resume_wakes_suspended_but_not_closed() {
        let mut backend = OfflineBackend::new(1_000.0, 4, 1.0);
        backend.set_state(BackendState::Suspended);
        assert_eq!(backend.resume(), BackendState::Running);
        backend.set_state(BackendState::Closed);
        assert_eq!(backend.resume(), BackendState::Closed);
    }

    #[test]
    fn stopping_finished_voice_is_reported() {
        let mut backend = OfflineBackend::new(1_000.0, 4, 1.0);
        backend.start_voice(VoiceId(1), voice(0.0, 0.01)).unwrap();
        backend.render_seconds(0.02);
        assert!(matches!(
            backend.stop_voice(VoiceId(1)),
            Err(PolyError::AlreadyStopped(1))
        ));
    }

    #[test]
    fn stop_all_skips_finished_voices() {
        let mut backend = OfflineBackend::new(1_000.0, 4, 1.0);
        backend.start_voice(VoiceId(1), voice(0.0, 0.01)).unwrap();
        backend.start_voice(VoiceId(2), voice(0.0, 1.0)).unwrap();
        backend.render_seconds(0.02);

        assert_eq!(backend.stop_all(&[VoiceId(1), VoiceId(2)]).unwrap(), 1);
        assert_eq!(backend.mixer().active_voices(), 0);
    }
}
