use rtrb::Consumer;

use crate::synth::voice::VoiceId;

/// Gesture-independent input: what the pointer, keyboard or test harness
/// wants the instrument to do.
///
/// Every event for an id comes after that id's `NoteOn`; `NoteOff` is final.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    NoteOn {
        string: usize,
        fret: usize,
        id: VoiceId,
    },
    /// Total displacement from the note-on position, not an increment
    PitchUpdate {
        id: VoiceId,
        fret_offset: f32,
        bend_semitones: f32,
    },
    NoteOff {
        id: VoiceId,
    },
}

impl InputEvent {
    pub fn id(&self) -> &VoiceId {
        match self {
            InputEvent::NoteOn { id, .. }
            | InputEvent::PitchUpdate { id, .. }
            | InputEvent::NoteOff { id } => id,
        }
    }
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<InputEvent>;
}

impl MessageReceiver for Consumer<InputEvent> {
    fn pop(&mut self) -> Option<InputEvent> {
        Consumer::pop(self).ok()
    }
}

impl MessageReceiver for std::collections::VecDeque<InputEvent> {
    fn pop(&mut self) -> Option<InputEvent> {
        self.pop_front()
    }
}
