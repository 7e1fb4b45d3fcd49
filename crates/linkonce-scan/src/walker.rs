//! Serial jwalk traversal feeding new files to a callback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use tracing::{debug, trace};

use linkonce_core::{
    EntryOutcome, LinkState, STATE_TEMP_SUFFIX, SessionError, TraversalEntry, WalkStats,
};

/// Walks a source tree and reports files that are not linked yet.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    excluded: Vec<PathBuf>,
    state_files: Vec<PathBuf>,
}

impl TreeWalker {
    /// Create a walker over `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
            state_files: Vec::new(),
        }
    }

    /// Never visit `relative` (a path under the root) or anything below it.
    ///
    /// An empty path would exclude the whole tree and is ignored.
    pub fn exclude(mut self, relative: impl Into<PathBuf>) -> Self {
        let relative = relative.into();
        if !relative.as_os_str().is_empty() {
            self.excluded.push(relative);
        }
        self
    }

    /// Never visit the state file at `relative`, nor the temporary files a
    /// save leaves next to it (`<name>...<STATE_TEMP_SUFFIX>`).
    pub fn exclude_state_file(mut self, relative: impl Into<PathBuf>) -> Self {
        let relative = relative.into();
        if relative.file_name().is_some() {
            self.state_files.push(relative);
        }
        self
    }

    /// Walk the whole tree.
    ///
    /// For every non-directory entry missing from `state`, `on_new_file` is
    /// called with its path relative to the root; on success the path is
    /// inserted into `state`. The first error, from enumeration or from the
    /// callback, stops the walk and is returned as is.
    pub fn walk<F>(&self, state: &mut LinkState, mut on_new_file: F) -> Result<WalkStats, SessionError>
    where
        F: FnMut(&Path) -> Result<(), SessionError>,
    {
        let metadata = std::fs::metadata(&self.root).map_err(|e| SessionError::Walk {
            path: self.root.clone(),
            message: e.to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(SessionError::NotADirectory {
                path: self.root.clone(),
            });
        }

        let prune_root = self.root.clone();
        let prune_excluded = Arc::new(self.excluded.clone());

        let walker = WalkDir::new(&self.root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .process_read_dir(move |_depth, _dir_path, _state, children| {
                // Stop jwalk from descending into excluded directories.
                for child in children.iter_mut().flatten() {
                    if child.read_children_path.is_none() {
                        continue;
                    }
                    let path = child.path();
                    if let Ok(relative) = path.strip_prefix(&prune_root) {
                        if is_excluded(&prune_excluded, relative) {
                            child.read_children_path = None;
                        }
                    }
                }
            });

        let mut stats = WalkStats::new();

        for entry_result in walker {
            let mut entry = entry_result.map_err(|err| SessionError::Walk {
                path: err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone()),
                message: err.to_string(),
            })?;

            // jwalk reports an unreadable directory on the entry itself.
            if let Some(err) = entry.read_children_error.take() {
                return Err(SessionError::Walk {
                    path: entry.path(),
                    message: err.to_string(),
                });
            }

            let path = entry.path();
            let relative = match path.strip_prefix(&self.root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => {
                    return Err(SessionError::Walk {
                        path: path.clone(),
                        message: "entry outside of walk root".to_string(),
                    });
                }
            };

            let entry = TraversalEntry::new(relative, entry.file_type().is_dir());
            let outcome = self.visit(entry, state, &mut on_new_file)?;
            if let Some(outcome) = outcome {
                stats.record(outcome);
            } else {
                stats.record_dir();
            }
        }

        Ok(stats)
    }

    /// Handle one entry. Returns `None` for directories that are descended into.
    fn visit<F>(
        &self,
        entry: TraversalEntry,
        state: &mut LinkState,
        on_new_file: &mut F,
    ) -> Result<Option<EntryOutcome>, SessionError>
    where
        F: FnMut(&Path) -> Result<(), SessionError>,
    {
        if is_excluded(&self.excluded, entry.path())
            || (!entry.is_dir && self.is_state_file(entry.path()))
        {
            trace!(path = %entry.path().display(), "excluded");
            return Ok(Some(EntryOutcome::Excluded));
        }

        if entry.is_dir {
            return Ok(None);
        }

        if state.contains(entry.path()) {
            trace!(path = %entry.path().display(), "already linked");
            return Ok(Some(EntryOutcome::Skipped));
        }

        on_new_file(entry.path())?;
        debug!(path = %entry.path().display(), "recorded");
        state.insert(entry.path);
        Ok(Some(EntryOutcome::Linked))
    }

    /// Whether `relative` is a state file or one of its save temporaries.
    fn is_state_file(&self, relative: &Path) -> bool {
        let Some(name) = relative.file_name() else {
            return false;
        };
        self.state_files.iter().any(|state| {
            if relative == state.as_path() {
                return true;
            }
            let Some(state_name) = state.file_name() else {
                return false;
            };
            let name = name.as_encoded_bytes();
            relative.parent() == state.parent()
                && name.starts_with(state_name.as_encoded_bytes())
                && name.ends_with(STATE_TEMP_SUFFIX.as_bytes())
        })
    }
}

fn is_excluded(excluded: &[PathBuf], relative: &Path) -> bool {
    excluded.iter().any(|prefix| relative.starts_with(prefix))
}
