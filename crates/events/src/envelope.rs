use serde::{Deserialize, Serialize};

/// Envelope for an event read from an ordered input.
///
/// `sequence_number` is the 1-based line the event came from. It is only used to
/// point at the offending line when processing fails; ordering is the order in
/// which envelopes are handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(sequence_number: u64, payload: E) -> Self {
        Self {
            sequence_number,
            payload,
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}
