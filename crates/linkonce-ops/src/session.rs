//! Session driver: prepare the destination, load state, walk, persist.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use linkonce_core::{SessionConfig, SessionError, SessionSummary};
use linkonce_scan::TreeWalker;

use crate::materialize::{LinkMaterializer, LinkOutcome, create_dir_all};
use crate::store::StateStore;

/// One run of the tool over a source tree.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
}

impl Session {
    /// Create a session for the given configuration.
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run the session to completion.
    ///
    /// Steps run in strict order: create the destination root, load the
    /// state, walk the source tree linking new files, save the state. Any
    /// error stops the session immediately. State is only saved after a
    /// complete walk, so links created before an abort are rediscovered (and
    /// accepted as already linked) by the next run.
    pub fn run(&self) -> Result<SessionSummary, SessionError> {
        let start = Instant::now();

        self.prepare_destination()?;

        let store = StateStore::new(&self.config.state_file);
        let mut state = store.load();
        let state_before = state.len();

        let materializer = LinkMaterializer::from_config(&self.config);
        let walker = self.walker();

        let walk = walker.walk(&mut state, |relative| {
            let outcome = materializer.materialize(relative)?;
            if outcome == LinkOutcome::AlreadyLinked {
                info!(path = %relative.display(), "already present in destination");
            } else {
                info!(path = %relative.display(), "linked");
            }
            Ok(())
        })?;

        store.save(&state)?;

        Ok(SessionSummary {
            walk,
            state_before,
            state_after: state.len(),
            elapsed: start.elapsed(),
        })
    }

    /// Create the destination root if needed.
    fn prepare_destination(&self) -> Result<(), SessionError> {
        let dest = &self.config.dest_root;
        if dest.as_os_str().is_empty() {
            return Err(SessionError::MissingDestination);
        }

        create_dir_all(dest, self.config.dir_mode).map_err(|e| SessionError::Destination {
            path: dest.clone(),
            source: e,
        })
    }

    /// Walker over the source root, excluding our own outputs when they
    /// live inside it.
    fn walker(&self) -> TreeWalker {
        let mut walker = TreeWalker::new(&self.config.source_root);

        let Ok(source) = self.config.source_root.canonicalize() else {
            // The walk itself reports the unusable root.
            return walker;
        };

        if let Ok(dest) = self.config.dest_root.canonicalize() {
            if let Ok(relative) = dest.strip_prefix(&source) {
                debug!(path = %relative.display(), "excluding destination from walk");
                walker = walker.exclude(relative);
            }
        }
        if let Some(state_file) = canonical_file(&self.config.state_file) {
            if let Ok(relative) = state_file.strip_prefix(&source) {
                debug!(path = %relative.display(), "excluding state file from walk");
                walker = walker.exclude_state_file(relative);
            }
        }

        walker
    }
}

/// Canonical form of a file path whose file may not exist yet.
fn canonical_file(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    parent.canonicalize().ok().map(|dir| dir.join(name))
}
