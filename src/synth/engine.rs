use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    error::{PolyError, PolyResult},
    scale::Pitch,
    scheduler::{Trigger, TriggerSink},
    synth::{
        backend::{AudioBackend, BackendState},
        config::SynthConfig,
        envelope::EnvelopeSchedule,
        mixer::ScheduledVoice,
        voice_graph::build_voice_graph,
        VoiceId,
    },
};

/// Registry entry for a voice handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveVoice {
    pub id: VoiceId,
    pub pitch: Pitch,
    pub frequency: f32,
    pub schedule: EnvelopeSchedule,
}

/// Plans notes, hands them to a backend and remembers what is sounding.
///
/// Lives on the control thread. Deregistration is deadline based: each voice
/// is dropped from the registry once the clock passes its `stop_at`, whether
/// or not the backend has already retired it.
pub struct VoiceEngine<B: AudioBackend> {
    backend: B,
    config: EngineConfig,
    registry: HashMap<VoiceId, LiveVoice>,
    cleanup: Vec<(f64, VoiceId)>,
    next_id: u64,
}

impl<B: AudioBackend> VoiceEngine<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            registry: HashMap::new(),
            cleanup: Vec::new(),
            next_id: 1,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn live_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_live(&self, id: VoiceId) -> bool {
        self.registry.contains_key(&id)
    }

    pub fn live_voice(&self, id: VoiceId) -> Option<&LiveVoice> {
        self.registry.get(&id)
    }

    pub fn live_voices(&self) -> impl Iterator<Item = &LiveVoice> {
        self.registry.values()
    }

    /// Schedule one note.
    ///
    /// Returns `Ok(None)` when the timbre is disabled. The note starts
    /// `schedule_lead` after the backend's current time; nothing is
    /// registered unless the backend accepted the voice.
    pub fn play_voice(
        &mut self,
        pitch: Pitch,
        duration: f64,
        volume: f32,
        timbre: &SynthConfig,
    ) -> PolyResult<Option<VoiceId>> {
        if !timbre.enabled {
            return Ok(None);
        }
        if self.backend.state() != BackendState::Running {
            let state = self.backend.resume();
            if state != BackendState::Running {
                return Err(PolyError::AudioUnavailable(format!("backend is {state:?}")));
            }
        }

        let timbre = timbre.sanitized();
        let Some(graph) = build_voice_graph(&timbre) else {
            return Ok(None);
        };

        let start = self.backend.current_time() + self.config.schedule_lead;
        let schedule = EnvelopeSchedule::plan(
            start,
            duration,
            &timbre.envelope,
            volume,
            self.config.release_tail,
        )?;
        let frequency = pitch.frequency();
        let node = graph.instantiate(self.backend.sample_rate(), schedule.automation());

        let id = VoiceId(self.next_id);
        self.next_id += 1;
        self.backend.start_voice(
            id,
            ScheduledVoice {
                start_time: schedule.start,
                stop_time: schedule.stop_at,
                frequency,
                velocity: 1.0,
                graph: node,
            },
        )?;

        self.registry.insert(
            id,
            LiveVoice {
                id,
                pitch,
                frequency,
                schedule,
            },
        );
        self.cleanup.push((schedule.stop_at, id));
        debug!(voice = id.0, %pitch, start, duration, method = timbre.method.name(), "voice scheduled");
        Ok(Some(id))
    }

    /// Parse `name` first; an unknown name never reaches the backend.
    pub fn play_named(
        &mut self,
        name: &str,
        duration: f64,
        volume: f32,
        timbre: &SynthConfig,
    ) -> PolyResult<Option<VoiceId>> {
        let pitch: Pitch = name.parse()?;
        self.play_voice(pitch, duration, volume, timbre)
    }

    /// Stop every registered voice and empty the registry. Voices the
    /// backend already retired are skipped quietly. Returns how many were
    /// actually stopped; an empty registry is a no-op.
    pub fn stop_all_voices(&mut self) -> usize {
        if self.registry.is_empty() {
            return 0;
        }
        let ids: Vec<VoiceId> = self.registry.keys().copied().collect();
        let stopped = match self.backend.stop_all(&ids) {
            Ok(stopped) => stopped,
            Err(err) => {
                warn!(live = ids.len(), kind = ?err.kind(), %err, "failed to stop voices");
                0
            }
        };
        self.registry.clear();
        self.cleanup.clear();
        debug!(stopped, "all voices stopped");
        stopped
    }

    /// Drop registry entries whose deadline is at or before `now`. Entries
    /// already gone (stopped early) are skipped.
    pub fn collect_finished(&mut self, now: f64) -> usize {
        let mut removed = 0;
        let registry = &mut self.registry;
        self.cleanup.retain(|&(deadline, id)| {
            if deadline > now {
                return true;
            }
            if registry.remove(&id).is_some() {
                removed += 1;
            }
            false
        });
        if removed > 0 {
            debug!(removed, live = self.registry.len(), "voices deregistered");
        }
        removed
    }

    /// `collect_finished` against the backend clock.
    pub fn collect(&mut self) -> usize {
        let now = self.backend.current_time();
        self.collect_finished(now)
    }
}

/// Scheduler triggers become voices. Failures are logged and the trigger is
/// dropped; the playhead keeps going.
impl<B: AudioBackend> TriggerSink for VoiceEngine<B> {
    fn on_trigger(&mut self, trigger: Trigger, synth: &SynthConfig) {
        self.collect();
        if let Err(err) = self.play_voice(trigger.pitch, synth.note_duration, synth.volume, synth) {
            warn!(
                polygon = %trigger.polygon,
                vertex = trigger.vertex,
                pitch = %trigger.pitch,
                kind = ?err.kind(),
                %err,
                "trigger dropped"
            );
        }
    }
}
