//! Walk and session statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entry::EntryOutcome;

/// Counters collected by one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkStats {
    /// Files newly linked in this walk.
    pub linked: u64,
    /// Files skipped because they were already linked.
    pub skipped: u64,
    /// Entries ignored because they are part of the destination or state.
    pub excluded: u64,
    /// Directories descended into, including the root.
    pub dirs: u64,
}

impl WalkStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a non-directory entry.
    pub fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Skipped => self.skipped += 1,
            EntryOutcome::Linked => self.linked += 1,
            EntryOutcome::Excluded => self.excluded += 1,
        }
    }

    /// Record a directory.
    pub fn record_dir(&mut self) {
        self.dirs += 1;
    }

    /// Non-directory entries seen, excluded ones not counted.
    pub fn files_seen(&self) -> u64 {
        self.linked + self.skipped
    }
}

/// Result of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Counters from the walk.
    pub walk: WalkStats,
    /// Members in the state loaded at session start.
    pub state_before: usize,
    /// Members in the state persisted at session end.
    pub state_after: usize,
    /// Wall time of the whole session.
    pub elapsed: Duration,
}
