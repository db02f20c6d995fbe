//! Audio-thread building blocks.
//!
//! Each voice is a small chain of graph nodes rendered block by block into
//! the shared [`bus::MixBus`]. Nodes that the control side needs to steer
//! come as a `(node, handle)` pair connected by lock-free rings: the node
//! moves to the audio thread, the handle stays with the engine.

/// Multiply a signal by a control curve.
pub mod amplify;
/// Time-domain tap feeding a visualizer.
pub mod analyser;
/// The shared output pipeline voices attach to.
pub mod bus;
/// Soft-clip waveshaping node.
pub mod distortion;
/// Fluent combinators (`.through()`, `.amplify()`).
pub mod extensions;
/// State-variable tone filters.
pub mod filter;
/// Gain automation lane rendered as a control signal.
pub mod gain;
/// Core traits shared by all graph nodes.
pub mod node;
/// Control/audio automation lane pairs.
pub mod param;
/// Variable-rate playback of the excitation clip.
pub mod player;
/// Serial chaining of two nodes (source → processor).
pub mod through;

pub use bus::{BusCommand, BusHandle, BusQueues, MixBus, RetiredVoice};
pub use node::{GraphNode, RenderCtx};
