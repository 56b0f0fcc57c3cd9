//! Session-wide sequence counter for the radio link.
//!
//! Incremented exactly once per send attempt, wrapping modulo 4096. Failures
//! do not reset it, so a receiver sees gaps for lost packets.

use std::sync::Mutex;

use super::record::SEQUENCE_MODULUS;

/// Sequence state for one operating session
#[derive(Debug, Default)]
pub struct LinkSession {
    last: Mutex<u16>,
}

impl LinkSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session whose next sequence number follows `last`
    pub fn starting_after(last: u16) -> Self {
        Self {
            last: Mutex::new(last % SEQUENCE_MODULUS),
        }
    }

    /// Advance the counter and return the new sequence number
    ///
    /// The first call on a fresh session returns 1.
    pub fn next(&self) -> u16 {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = (*last + 1) % SEQUENCE_MODULUS;
        *last
    }

    /// Most recently issued sequence number
    pub fn last(&self) -> u16 {
        *self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
