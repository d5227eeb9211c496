//! Runtime configuration.
//!
//! Every field has a constant default, so `Config::default()` is a complete,
//! working setup. With the `serde` feature a TOML file can override any
//! subset of fields:
//!
//! ```toml
//! [engine]
//! master_volume = 0.6
//!
//! [scheduler]
//! default_rpm = 45
//!
//! [session]
//! scale = "dorian"
//! root = "D"
//! polygons = [3, 5, 7]
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use std::path::Path;

use crate::{
    error::{PolyError, PolyResult},
    model::polygon::{MAX_SIDES, MIN_SIDES},
    scale::PitchClass,
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Voices the mixer renders at once before stealing.
    pub max_voices: usize,
    /// Seconds the oscillator keeps running after the envelope reaches zero.
    pub release_tail: f64,
    /// How far ahead of the audio clock a voice is timestamped.
    pub schedule_lead: f64,
    pub master_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 32,
            release_tail: 0.05,
            schedule_lead: 0.02,
            master_volume: 0.8,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Seconds the playhead holds still after a manual jump.
    pub manual_jump_cooldown: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
    pub default_rpm: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            manual_jump_cooldown: 0.5,
            min_rpm: 1.0,
            max_rpm: 240.0,
            default_rpm: 30.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDefaults {
    /// Scale name; unknown names fall back to Major.
    pub scale: String,
    pub root: PitchClass,
    pub base_radius: f32,
    pub spacing: f32,
    /// Side counts of the polygons a new session starts with.
    pub polygons: Vec<usize>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            scale: "Major".to_string(),
            root: PitchClass::C,
            base_radius: 1.0,
            spacing: 0.6,
            polygons: vec![3, 4],
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub engine: EngineConfig,
    pub scheduler: SchedulerConfig,
    pub session: SessionDefaults,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.engine.sample_rate = sample_rate;
        self
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.engine.max_voices = max_voices;
        self
    }

    pub fn with_release_tail(mut self, seconds: f64) -> Self {
        self.engine.release_tail = seconds;
        self
    }

    pub fn with_schedule_lead(mut self, seconds: f64) -> Self {
        self.engine.schedule_lead = seconds;
        self
    }

    pub fn with_master_volume(mut self, volume: f32) -> Self {
        self.engine.master_volume = volume;
        self
    }

    pub fn with_rpm(mut self, rpm: f64) -> Self {
        self.scheduler.default_rpm = rpm;
        self
    }

    pub fn with_cooldown(mut self, seconds: f64) -> Self {
        self.scheduler.manual_jump_cooldown = seconds;
        self
    }

    pub fn with_scale(mut self, scale: impl Into<String>, root: PitchClass) -> Self {
        self.session.scale = scale.into();
        self.session.root = root;
        self
    }

    pub fn with_polygons(mut self, sides: impl IntoIterator<Item = usize>) -> Self {
        self.session.polygons = sides.into_iter().collect();
        self
    }

    /// Reject values the engine and scheduler cannot run with.
    pub fn validate(&self) -> PolyResult<()> {
        let engine = &self.engine;
        if !(engine.sample_rate.is_finite() && engine.sample_rate >= 8_000.0) {
            return Err(PolyError::config("engine.sample_rate", "must be at least 8000"));
        }
        if engine.max_voices == 0 {
            return Err(PolyError::config("engine.max_voices", "must be at least 1"));
        }
        if !(engine.release_tail.is_finite() && engine.release_tail > 0.0) {
            return Err(PolyError::config("engine.release_tail", "must be positive"));
        }
        if !(engine.schedule_lead.is_finite() && engine.schedule_lead >= 0.0) {
            return Err(PolyError::config("engine.schedule_lead", "must not be negative"));
        }
        if !(0.0..=1.0).contains(&engine.master_volume) {
            return Err(PolyError::config("engine.master_volume", "must be in 0..=1"));
        }

        let scheduler = &self.scheduler;
        if !(scheduler.manual_jump_cooldown.is_finite() && scheduler.manual_jump_cooldown >= 0.0) {
            return Err(PolyError::config(
                "scheduler.manual_jump_cooldown",
                "must not be negative",
            ));
        }
        if !(scheduler.min_rpm > 0.0 && scheduler.min_rpm <= scheduler.max_rpm) {
            return Err(PolyError::config("scheduler.min_rpm", "must be positive and <= max_rpm"));
        }
        if !(scheduler.min_rpm..=scheduler.max_rpm).contains(&scheduler.default_rpm) {
            return Err(PolyError::InvalidRpm {
                rpm: scheduler.default_rpm,
                min: scheduler.min_rpm,
                max: scheduler.max_rpm,
            });
        }

        if let Some(&sides) = self
            .session
            .polygons
            .iter()
            .find(|s| !(MIN_SIDES..=MAX_SIDES).contains(*s))
        {
            return Err(PolyError::InvalidSides {
                sides,
                min: MIN_SIDES,
                max: MAX_SIDES,
            });
        }
        Ok(())
    }

    /// Parse TOML; missing fields keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(source: &str) -> PolyResult<Self> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> PolyResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml_string(&self) -> PolyResult<String> {
        toml::to_string_pretty(self).map_err(|err| PolyError::config("config", err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn builders_set_fields() {
        let config = Config::new()
            .with_rpm(90.0)
            .with_scale("dorian", PitchClass::D)
            .with_polygons([5, 7]);
        assert_eq!(config.scheduler.default_rpm, 90.0);
        assert_eq!(config.session.root, PitchClass::D);
        assert_eq!(config.session.polygons, vec![5, 7]);
    }

    #[test]
    fn rejects_out_of_range_default_rpm() {
        let config = Config::new().with_rpm(1_000.0);
        assert!(matches!(config.validate(), Err(PolyError::InvalidRpm { .. })));
    }

    #[test]
    fn rejects_bad_polygon_sides() {
        let config = Config::new().with_polygons([3, 2]);
        assert!(matches!(
            config.validate(),
            Err(PolyError::InvalidSides { sides: 2, .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [scheduler]
            default_rpm = 45.0

            [session]
            scale = "dorian"
            root = "D"
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.default_rpm, 45.0);
        assert_eq!(config.scheduler.max_rpm, 240.0);
        assert_eq!(config.session.root, PitchClass::D);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn toml_round_trip() {
        let config = Config::new().with_master_volume(0.5);
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}
