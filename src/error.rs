//! Error types shared by the scale model, scheduler and voice engine.
//!
//! Nothing in this crate treats these as fatal. Configuration problems are
//! recovered by the caller (keep the previous value, skip the note), resource
//! problems turn playback-dependent operations into no-ops until the audio
//! subsystem comes back.

use thiserror::Error;

/// Result type for fallible polyrhythm operations.
pub type PolyResult<T> = Result<T, PolyError>;

/// Broad classification used when deciding how loudly to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input: recovered locally by falling back or skipping.
    Configuration,
    /// Audio subsystem unavailable, suspended, or out of capacity.
    Resource,
}

#[derive(Debug, Error)]
pub enum PolyError {
    /// RPM outside the accepted range, zero, negative or non-finite.
    #[error("invalid rpm {rpm}: expected a finite value in {min}..={max}")]
    InvalidRpm { rpm: f64, min: f64, max: f64 },

    /// A pitch name that does not parse as scientific pitch notation.
    #[error("unknown pitch name '{0}'")]
    UnknownPitch(String),

    /// A pitch that parses but lies outside the playable MIDI range.
    #[error("pitch {pitch} is outside the MIDI range C-1..=G9")]
    PitchOutOfRange { pitch: String },

    #[error("invalid side count {sides}: expected {min}..={max}")]
    InvalidSides { sides: usize, min: usize, max: usize },

    #[error("vertex {vertex} out of range for a {sides}-sided polygon")]
    InvalidVertex { vertex: usize, sides: usize },

    #[error("no polygon with id {0}")]
    UnknownPolygon(u32),

    /// Note duration that cannot produce an envelope.
    #[error("invalid note duration {0} s")]
    InvalidDuration(f64),

    #[error("invalid config '{name}': {message}")]
    InvalidConfig { name: String, message: String },

    /// Audio device missing, suspended, or closed.
    #[error("audio subsystem unavailable: {0}")]
    AudioUnavailable(String),

    /// Stopping a voice the renderer already retired.
    #[error("voice {0} already stopped")]
    AlreadyStopped(u64),

    /// Command queue to the audio thread is full.
    #[error("voice queue full, dropped voice {0}")]
    VoiceLimit(u64),

    /// A control command (stop) could not be queued for the audio thread.
    #[error("audio command queue full, dropped {0}")]
    QueueFull(String),

    #[cfg(feature = "serde")]
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "serde")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PolyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PolyError::AudioUnavailable(_)
            | PolyError::AlreadyStopped(_)
            | PolyError::VoiceLimit(_)
            | PolyError::QueueFull(_)
            | PolyError::Io(_) => ErrorKind::Resource,
            _ => ErrorKind::Configuration,
        }
    }

    pub(crate) fn config(name: impl Into<String>, message: impl Into<String>) -> Self {
        PolyError::InvalidConfig {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_resource_errors() {
        assert_eq!(
            PolyError::AudioUnavailable("suspended".into()).kind(),
            ErrorKind::Resource
        );
        assert_eq!(PolyError::AlreadyStopped(3).kind(), ErrorKind::Resource);
    }

    #[test]
    fn classifies_configuration_errors() {
        let err = PolyError::InvalidRpm {
            rpm: -1.0,
            min: 1.0,
            max: 240.0,
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("-1"));
    }
}
