//! Real-world scenario benchmarks.
//!
//! Complete voice chains as the engine builds them, and a bus carrying a
//! strummed chord.

mod bus;
mod voices;

pub use bus::bench_bus;
pub use voices::bench_voices;
