use std::collections::HashMap;

use crate::synth::voice::{Voice, VoiceId};

/// Live voices by id: at most one per id.
///
/// Only create and stop mutate it. Iteration exists for diagnostics and
/// never drives audio decisions.
#[derive(Debug, Default)]
pub struct VoiceRegistry {
    voices: HashMap<VoiceId, Voice>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `voice`, handing back whichever voice held its id before.
    pub fn insert(&mut self, voice: Voice) -> Option<Voice> {
        self.voices.insert(voice.id().clone(), voice)
    }

    pub fn remove(&mut self, id: &VoiceId) -> Option<Voice> {
        self.voices.remove(id)
    }

    pub fn get(&self, id: &VoiceId) -> Option<&Voice> {
        self.voices.get(id)
    }

    pub fn get_mut(&mut self, id: &VoiceId) -> Option<&mut Voice> {
        self.voices.get_mut(id)
    }

    pub fn contains(&self, id: &VoiceId) -> bool {
        self.voices.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.values_mut()
    }
}
