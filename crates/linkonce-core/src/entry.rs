//! Per-entry traversal records.

use std::path::{Path, PathBuf};

/// A filesystem object visited during a walk.
///
/// Transient: produced and consumed within a single walk step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalEntry {
    /// Path relative to the source root, without a leading `./`.
    pub path: PathBuf,
    /// Directories are descended into, never linked.
    pub is_dir: bool,
}

impl TraversalEntry {
    /// Create a new traversal entry.
    pub fn new(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            is_dir,
        }
    }

    /// Relative path of the entry.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// What happened to a single entry during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Already in the link state; nothing was done.
    Skipped,
    /// Newly materialized and recorded.
    Linked,
    /// Belongs to the destination tree or is the state file itself.
    Excluded,
}
