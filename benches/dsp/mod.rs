//! Benchmarks for the building blocks of a voice.

mod filter;
mod sources;

pub use filter::bench_filter;
pub use sources::bench_sources;
