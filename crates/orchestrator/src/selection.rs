#![forbid(unsafe_code)]

use serde::Serialize;

/// Tag of one year selection. Later selections carry larger values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Hands out generations and remembers the latest one, so that a result
/// arriving after a newer selection can be recognized and dropped.
#[derive(Debug, Default)]
pub struct Selector {
    latest: Generation,
}

impl Selector {
    pub fn next(&mut self) -> Generation {
        self.latest = Generation(self.latest.0.saturating_add(1));
        self.latest
    }

    pub fn current(&self) -> Generation {
        self.latest
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.latest
    }
}
