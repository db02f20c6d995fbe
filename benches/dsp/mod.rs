//! Benchmarks for low-level DSP primitives.

mod automation;
mod distortion;
mod filter;

pub use automation::bench_automation;
pub use distortion::bench_distortion;
pub use filter::bench_filter;
