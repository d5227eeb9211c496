//! Typed per-polygon synthesis settings.
//!
//! A `SynthConfig` is resolved once (defaults filled, values clamped by
//! [`SynthConfig::sanitized`]) and then snapshotted into every voice it
//! triggers, so editing a polygon never changes a note that is already
//! sounding.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dsp::{
    filter::{FilterType, MAX_CUTOFF_HZ, MIN_CUTOFF_HZ},
    oscillator::OscillatorWaveform,
};
use crate::graph::{delay::MAX_DELAY_SECONDS, sources::MAX_PARTIALS};

/// How the voice makes its tone.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SynthesisMethod {
    /// Single oscillator using `SynthConfig::waveform`.
    #[default]
    Subtractive,
    Additive { partials: usize },
    /// 0.0 sine → 1.0 square.
    Wavetable { position: f32 },
    Fm { ratio: f32, index: f32 },
    Granular { grain_seconds: f32, density: f32 },
}

impl SynthesisMethod {
    pub fn name(&self) -> &'static str {
        match self {
            SynthesisMethod::Subtractive => "subtractive",
            SynthesisMethod::Additive { .. } => "additive",
            SynthesisMethod::Wavetable { .. } => "wavetable",
            SynthesisMethod::Fm { .. } => "fm",
            SynthesisMethod::Granular { .. } => "granular",
        }
    }
}

/// Attack, decay and release in seconds; sustain as a fraction of peak.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSettings {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f32,
    pub release: f64,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub kind: FilterType,
    pub cutoff_hz: f32,
    pub resonance: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            kind: FilterType::LowPass,
            cutoff_hz: 2_000.0,
            resonance: 0.2,
        }
    }
}

/// Pass-through effects. All zero means a dry voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectSettings {
    /// 0.0..=1.0 soft-clip amount.
    pub drive: f32,
    pub delay_seconds: f32,
    pub delay_feedback: f32,
    /// 0.0 leaves the echo out of the chain.
    pub delay_mix: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModulationTarget {
    /// Vibrato; depth in cents.
    #[default]
    Pitch,
    /// Filter sweep; depth in Hz. Ignored without a filter.
    Cutoff,
    /// Tremolo; depth 0.0..=1.0.
    Amplitude,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationSettings {
    pub rate_hz: f32,
    pub depth: f32,
    pub target: ModulationTarget,
}

impl Default for ModulationSettings {
    fn default() -> Self {
        Self {
            rate_hz: 5.0,
            depth: 15.0,
            target: ModulationTarget::Pitch,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub enabled: bool,
    pub method: SynthesisMethod,
    pub waveform: OscillatorWaveform,
    pub envelope: EnvelopeSettings,
    pub filter: Option<FilterSettings>,
    pub effects: EffectSettings,
    pub modulation: Option<ModulationSettings>,
    /// Peak gain, 0.0..=1.0.
    pub volume: f32,
    /// Seconds each triggered note lasts.
    pub note_duration: f64,
    pub detune_cents: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method: SynthesisMethod::Subtractive,
            waveform: OscillatorWaveform::Triangle,
            envelope: EnvelopeSettings::default(),
            filter: Some(FilterSettings::default()),
            effects: EffectSettings::default(),
            modulation: None,
            volume: 0.5,
            note_duration: 0.5,
            detune_cents: 0.0,
        }
    }
}

const MAX_ENVELOPE_SECONDS: f64 = 10.0;
const MAX_NOTE_SECONDS: f64 = 30.0;

fn clamp_seconds(value: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        fallback
    }
}

fn clamp_unit(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

fn clamp_range(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

impl SynthConfig {
    pub fn with_method(mut self, method: SynthesisMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_waveform(mut self, waveform: OscillatorWaveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn with_envelope(mut self, attack: f64, decay: f64, sustain: f32, release: f64) -> Self {
        self.envelope = EnvelopeSettings {
            attack,
            decay,
            sustain,
            release,
        };
        self
    }

    pub fn with_filter(mut self, filter: Option<FilterSettings>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_modulation(mut self, modulation: Option<ModulationSettings>) -> Self {
        self.modulation = modulation;
        self
    }

    pub fn with_effects(mut self, effects: EffectSettings) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_note_duration(mut self, seconds: f64) -> Self {
        self.note_duration = seconds;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Copy with every field pulled into its legal range. Non-finite values
    /// are replaced by the default for that field. Anything that had to be
    /// changed is logged once at warn level.
    pub fn sanitized(&self) -> Self {
        let defaults = SynthConfig::default();
        let env_defaults = EnvelopeSettings::default();

        let envelope = EnvelopeSettings {
            attack: clamp_seconds(self.envelope.attack, MAX_ENVELOPE_SECONDS, env_defaults.attack),
            decay: clamp_seconds(self.envelope.decay, MAX_ENVELOPE_SECONDS, env_defaults.decay),
            sustain: clamp_unit(self.envelope.sustain, env_defaults.sustain),
            release: clamp_seconds(self.envelope.release, MAX_ENVELOPE_SECONDS, env_defaults.release),
        };

        let method = match self.method {
            SynthesisMethod::Subtractive => SynthesisMethod::Subtractive,
            SynthesisMethod::Additive { partials } => SynthesisMethod::Additive {
                partials: partials.clamp(1, MAX_PARTIALS),
            },
            SynthesisMethod::Wavetable { position } => SynthesisMethod::Wavetable {
                position: clamp_unit(position, 0.0),
            },
            SynthesisMethod::Fm { ratio, index } => SynthesisMethod::Fm {
                ratio: clamp_range(ratio, 0.0, 16.0, 1.0),
                index: clamp_range(index, 0.0, 20.0, 1.0),
            },
            SynthesisMethod::Granular {
                grain_seconds,
                density,
            } => SynthesisMethod::Granular {
                grain_seconds: clamp_range(grain_seconds, 0.005, 0.5, 0.05),
                density: clamp_range(density, 1.0, 200.0, 30.0),
            },
        };

        let filter = self.filter.map(|f| FilterSettings {
            kind: f.kind,
            cutoff_hz: clamp_range(f.cutoff_hz, MIN_CUTOFF_HZ, MAX_CUTOFF_HZ, 2_000.0),
            resonance: clamp_range(f.resonance, 0.0, 0.98, 0.0),
        });

        let effects = EffectSettings {
            drive: clamp_unit(self.effects.drive, 0.0),
            delay_seconds: clamp_range(self.effects.delay_seconds, 0.0, MAX_DELAY_SECONDS, 0.0),
            delay_feedback: clamp_range(self.effects.delay_feedback, 0.0, 0.95, 0.0),
            delay_mix: clamp_unit(self.effects.delay_mix, 0.0),
        };

        let modulation = self.modulation.map(|m| {
            let depth_max = match m.target {
                ModulationTarget::Pitch => 200.0,
                ModulationTarget::Cutoff => 10_000.0,
                ModulationTarget::Amplitude => 1.0,
            };
            ModulationSettings {
                rate_hz: clamp_range(m.rate_hz, 0.01, 40.0, 5.0),
                depth: clamp_range(m.depth, 0.0, depth_max, 0.0),
                target: m.target,
            }
        });

        let note_duration = if self.note_duration.is_finite() && self.note_duration > 0.0 {
            self.note_duration.min(MAX_NOTE_SECONDS)
        } else {
            defaults.note_duration
        };

        let sanitized = SynthConfig {
            enabled: self.enabled,
            method,
            waveform: self.waveform,
            envelope,
            filter,
            effects,
            modulation,
            volume: clamp_unit(self.volume, defaults.volume),
            note_duration,
            detune_cents: clamp_range(self.detune_cents, -1_200.0, 1_200.0, 0.0),
        };

        if sanitized != *self {
            warn!(method = sanitized.method.name(), "synth config values clamped into range");
        }
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_already_sane() {
        let config = SynthConfig::default();
        assert_eq!(config.sanitized(), config);
    }

    #[test]
    fn clamps_out_of_range_fields() {
        let config = SynthConfig::default()
            .with_envelope(-1.0, f64::NAN, 3.0, 50.0)
            .with_volume(2.0)
            .with_note_duration(0.0)
            .with_method(SynthesisMethod::Additive { partials: 400 });

        let clean = config.sanitized();
        assert_eq!(clean.envelope.attack, 0.0);
        assert_eq!(clean.envelope.decay, EnvelopeSettings::default().decay);
        assert_eq!(clean.envelope.sustain, 1.0);
        assert_eq!(clean.envelope.release, MAX_ENVELOPE_SECONDS);
        assert_eq!(clean.volume, 1.0);
        assert_eq!(clean.note_duration, SynthConfig::default().note_duration);
        assert_eq!(clean.method, SynthesisMethod::Additive { partials: MAX_PARTIALS });
    }

    #[test]
    fn modulation_depth_depends_on_target() {
        let config = SynthConfig::default().with_modulation(Some(ModulationSettings {
            rate_hz: 4.0,
            depth: 5.0,
            target: ModulationTarget::Amplitude,
        }));
        assert_eq!(config.sanitized().modulation.map(|m| m.depth), Some(1.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_defaults() {
        let config: SynthConfig =
            serde_json::from_str(r#"{ "volume": 0.25, "method": { "kind": "fm", "ratio": 2.0, "index": 3.0 } }"#)
                .unwrap();
        assert_eq!(config.volume, 0.25);
        assert_eq!(config.method, SynthesisMethod::Fm { ratio: 2.0, index: 3.0 });
        assert_eq!(config.envelope, EnvelopeSettings::default());
    }
}
