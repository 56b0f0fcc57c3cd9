//! Data-ready latch shared between the sensor interrupt and the decoder.
//!
//! The interrupt side is the only writer of `true`; the reader is the only
//! clearer. `test_and_clear` is a single atomic swap so no lock is needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Edge-triggered data-ready flag
#[derive(Debug, Clone, Default)]
pub struct DataReadyLatch {
    ready: Arc<AtomicBool>,
}

impl DataReadyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a new frame as available. Called from the data-ready edge.
    pub fn signal(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Return whether a frame was signalled since the last call, clearing the flag.
    pub fn test_and_clear(&self) -> bool {
        self.ready.swap(false, Ordering::AcqRel)
    }

    /// Current state without consuming it
    pub fn is_set(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
