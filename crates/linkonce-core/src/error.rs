//! Error types for linking sessions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a linking session.
///
/// Every variant is fatal: nothing in the core recovers locally, the
/// session driver surfaces the error and stops.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No destination directory was given.
    #[error("must specify a destination directory")]
    MissingDestination,

    /// The destination root could not be created.
    #[error("error creating destination directory {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source root is not a directory.
    #[error("Source root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Enumerating the source tree failed.
    #[error("error walking tree at {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// A missing ancestor directory of a link could not be created.
    #[error("could not create hard link dest dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Hard link creation failed even after creating its parent directories.
    #[error("could not create hard link {dest} -> {original}: {source}")]
    Link {
        original: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisting the state file failed.
    #[error("error during state file {stage} for {path}: {source}")]
    StateWrite {
        path: PathBuf,
        stage: SaveStage,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Create a state write error for the given stage.
    pub fn state_write(path: impl Into<PathBuf>, stage: SaveStage, source: std::io::Error) -> Self {
        Self::StateWrite {
            path: path.into(),
            stage,
            source,
        }
    }
}

/// Step of the state file save protocol that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveStage {
    /// Creating the sibling temporary file.
    Create,
    /// Writing encoded entries.
    Write,
    /// Flushing buffered output.
    Flush,
    /// Syncing the temporary file to disk.
    Sync,
    /// Renaming the temporary file over the state file.
    Rename,
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Flush => "flush",
            Self::Sync => "sync",
            Self::Rename => "rename",
        };
        f.write_str(stage)
    }
}
