//! Low-level DSP primitives used by the graph nodes.
//!
//! Allocation-free once constructed, so they can live inside voices rendered
//! on the audio thread.

/// Circular delay line.
pub mod delay;
/// Soft-clip waveshaping.
pub mod distortion;
/// Breakpoint gain automation.
pub mod envelope;
/// State-variable filter.
pub mod filter;
/// Phase-accumulator oscillators and noise.
pub mod oscillator;

pub use envelope::{Breakpoint, GainAutomation};
