pub mod config; // Engine, scheduler and session settings
pub mod dsp; // Sample-level building blocks
pub mod error;
pub mod export; // Analytic note lists
pub mod graph; // Composable audio graph nodes
pub mod model; // Polygons, playhead, session
pub mod scale; // Pitches, scales, quantization
pub mod scheduler; // Playhead motion and vertex crossings
pub mod synth; // Voice planning, mixing and backends

pub use config::Config;
pub use error::{ErrorKind, PolyError, PolyResult};
pub use model::{Polygon, PolygonId, Session};
pub use scale::{Pitch, PitchClass, ScaleKind};
pub use scheduler::{RotationalScheduler, Trigger, TriggerSink};
pub use synth::{SynthConfig, VoiceEngine, VoiceId};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
