//! Per-voice signal chain description.
//!
//! A [`VoiceGraph`] is plain data built from a sanitized [`SynthConfig`]: an
//! ordered list of stages, always a source first and the gain envelope last.
//! [`VoiceGraph::instantiate`] turns it into live graph nodes for one note.
//! Each note gets its own nodes, so nothing is shared between voices.

use crate::{
    dsp::{envelope::GainAutomation, oscillator::OscillatorWaveform},
    graph::{
        delay::EchoNode,
        distortion::DriveNode,
        envelope::AutomationNode,
        filter::{FilterNode, FilterParam},
        lfo::LfoNode,
        oscillator::{OscNode, OscParam},
        sources::{AdditiveNode, FmNode, GranularNode, SourceNode, WavetableNode},
        GraphNode, NodeExt,
    },
    synth::config::{
        FilterSettings, ModulationSettings, ModulationTarget, SynthConfig, SynthesisMethod,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    Source {
        method: SynthesisMethod,
        waveform: OscillatorWaveform,
        detune_cents: f32,
    },
    Filter(FilterSettings),
    Modulation(ModulationSettings),
    Drive {
        amount: f32,
    },
    Delay {
        seconds: f32,
        feedback: f32,
        mix: f32,
    },
    /// Breakpoint envelope; peak comes from the note's planned schedule.
    Gain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceGraph {
    stages: Vec<Stage>,
}

/// Chain for `config`, or `None` when the polygon's voice is disabled.
///
/// Stage order: source, filter, modulation, drive, delay, gain. Optional
/// stages are left out entirely when their settings make them a no-op.
pub fn build_voice_graph(config: &SynthConfig) -> Option<VoiceGraph> {
    if !config.enabled {
        return None;
    }

    let mut stages = vec![Stage::Source {
        method: config.method,
        waveform: config.waveform,
        detune_cents: config.detune_cents,
    }];
    if let Some(filter) = config.filter {
        stages.push(Stage::Filter(filter));
    }
    if let Some(modulation) = config.modulation {
        if modulation.depth > 0.0 {
            stages.push(Stage::Modulation(modulation));
        }
    }
    if config.effects.drive > 0.0 {
        stages.push(Stage::Drive {
            amount: config.effects.drive,
        });
    }
    if config.effects.delay_mix > 0.0 && config.effects.delay_seconds > 0.0 {
        stages.push(Stage::Delay {
            seconds: config.effects.delay_seconds,
            feedback: config.effects.delay_feedback,
            mix: config.effects.delay_mix,
        });
    }
    stages.push(Stage::Gain);

    Some(VoiceGraph { stages })
}

fn source_node(method: SynthesisMethod, waveform: OscillatorWaveform) -> SourceNode {
    match method {
        SynthesisMethod::Subtractive => SourceNode::Oscillator(OscNode::new(waveform)),
        SynthesisMethod::Additive { partials } => SourceNode::Additive(AdditiveNode::new(partials)),
        SynthesisMethod::Wavetable { position } => {
            SourceNode::Wavetable(WavetableNode::new(position))
        }
        SynthesisMethod::Fm { ratio, index } => SourceNode::Fm(FmNode::new(ratio, index)),
        SynthesisMethod::Granular {
            grain_seconds,
            density,
        } => SourceNode::Granular(GranularNode::new(grain_seconds, density)),
    }
}

impl VoiceGraph {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn modulation(&self) -> Option<ModulationSettings> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Modulation(settings) => Some(*settings),
            _ => None,
        })
    }

    pub fn has_filter(&self) -> bool {
        self.stages.iter().any(|stage| matches!(stage, Stage::Filter(_)))
    }

    fn source(&self) -> (SynthesisMethod, OscillatorWaveform, f32) {
        self.stages
            .iter()
            .find_map(|stage| match *stage {
                Stage::Source {
                    method,
                    waveform,
                    detune_cents,
                } => Some((method, waveform, detune_cents)),
                _ => None,
            })
            .unwrap_or((SynthesisMethod::Subtractive, OscillatorWaveform::Sine, 0.0))
    }

    /// Build the live node chain for one note.
    ///
    /// Pitch modulation wraps the source, cutoff modulation wraps the filter
    /// and amplitude modulation sits at the modulation stage's position.
    /// Delay buffers are sized here for `sample_rate`, off the audio thread.
    pub fn instantiate(&self, sample_rate: f32, automation: GainAutomation) -> Box<dyn GraphNode> {
        let modulation = self.modulation();
        let target = |wanted: ModulationTarget| modulation.filter(|m| m.target == wanted);

        let (method, waveform, detune_cents) = self.source();
        let source = source_node(method, waveform).with_detune(detune_cents);
        let mut chain: Box<dyn GraphNode> = match target(ModulationTarget::Pitch) {
            Some(m) => source
                .modulate(LfoNode::sine(m.rate_hz), OscParam::Detune, m.depth)
                .boxed(),
            None => source.boxed(),
        };
        let mut automation = Some(automation);

        for stage in &self.stages {
            chain = match *stage {
                Stage::Source { .. } => chain,
                Stage::Filter(settings) => {
                    let filter = FilterNode::new(settings.kind, settings.cutoff_hz, settings.resonance);
                    match target(ModulationTarget::Cutoff) {
                        Some(m) => chain
                            .through(filter.modulate(LfoNode::sine(m.rate_hz), FilterParam::Cutoff, m.depth))
                            .boxed(),
                        None => chain.through(filter).boxed(),
                    }
                }
                Stage::Modulation(m) => match m.target {
                    ModulationTarget::Amplitude => {
                        chain.amplify(LfoNode::tremolo(m.rate_hz, m.depth)).boxed()
                    }
                    ModulationTarget::Pitch | ModulationTarget::Cutoff => chain,
                },
                Stage::Drive { amount } => chain.through(DriveNode::new(amount)).boxed(),
                Stage::Delay {
                    seconds,
                    feedback,
                    mix,
                } => chain
                    .through(EchoNode::new(seconds, feedback, mix, sample_rate))
                    .boxed(),
                Stage::Gain => match automation.take() {
                    Some(envelope) => chain.amplify(AutomationNode::new(envelope)).boxed(),
                    None => chain,
                },
            };
        }
        chain
    }
}
