// Voice synthesis: per-polygon timbre, envelope planning, node chains,
// mixing and the backends that carry voices to the audio thread.

pub mod backend;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod message;
pub mod mixer;
pub mod voice_graph;

pub use backend::{AudioBackend, BackendState, OfflineBackend};
pub use config::SynthConfig;
pub use engine::{LiveVoice, VoiceEngine};
pub use envelope::EnvelopeSchedule;
pub use mixer::{ScheduledVoice, VoiceMixer};
pub use voice_graph::{build_voice_graph, Stage, VoiceGraph};

#[cfg(feature = "rtrb")]
pub use message::{ring_backend, RingBackend};

/// Unique per trigger; never reused within an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);
