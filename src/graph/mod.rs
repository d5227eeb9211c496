//! Block-rendering nodes a voice is assembled from.
//!
//! Nodes wrap the `dsp` primitives with what a voice needs: a start event,
//! parameter modulation, and rendering against a [`node::RenderCtx`] whose
//! `time` is measured from the voice start. `extensions` adds the fluent
//! `.through()` / `.amplify()` / `.modulate()` combinators.

/// Multiply a signal by a gain curve or LFO.
pub mod amplify;
/// Feedback echo.
pub mod delay;
/// Soft-clip drive.
pub mod distortion;
/// Scheduled gain automation node.
pub mod envelope;
/// Fluent combinators.
pub mod extensions;
/// State-variable filter node.
pub mod filter;
/// Low frequency oscillators for parameter modulation.
pub mod lfo;
/// Connect an LFO to a node parameter.
pub mod modulate;
/// Core traits shared by all graph nodes.
pub mod node;
/// Audio-band oscillator.
pub mod oscillator;
/// Additive, wavetable, FM and granular sources.
pub mod sources;
/// Serial chaining of two nodes (source → effect).
pub mod through;

pub use extensions::NodeExt;
pub use node::{GraphNode, Modulatable, RenderCtx};
