// Purpose: notes as voices - creation, pitch bends, release and teardown
// This layer sits above graph nodes and drives them through automation

/// Pitch targets for note-on, slides and bends.
pub mod bend;
/// The engine context: registry, scale mode and the bus command queue.
pub mod engine;
/// Input events and the receivers that deliver them.
pub mod message;
/// Live voices by id.
pub mod registry;
/// One sounding note and its audio chain.
pub mod voice;

pub use engine::{FretEngine, VoiceSnapshot};
pub use message::{InputEvent, MessageReceiver};
pub use voice::{Voice, VoiceId, VoiceKey};
