//! Control-loop and mixing scenarios.

mod mixer;
mod scheduler;

pub use mixer::bench_mixer;
pub use scheduler::bench_scheduler;
