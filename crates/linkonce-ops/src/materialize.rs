//! Hard link creation with on-demand parent directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use linkonce_core::{DEFAULT_DIR_MODE, SessionConfig, SessionError};

/// How a link came to exist at its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Linked on the first attempt.
    Linked,
    /// Linked after creating missing ancestor directories.
    LinkedAfterMkdir,
    /// The destination already was a link to the same file.
    AlreadyLinked,
}

/// Mirrors source files into the destination tree as hard links.
#[derive(Debug, Clone)]
pub struct LinkMaterializer {
    source_root: PathBuf,
    dest_root: PathBuf,
    dir_mode: u32,
}

impl LinkMaterializer {
    /// Create a materializer linking from `source_root` into `dest_root`.
    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    /// Create a materializer from session configuration.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.source_root, &config.dest_root).with_dir_mode(config.dir_mode)
    }

    /// Set the mode used for created directories.
    pub fn with_dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    /// Destination of the file at `relative` under the source root.
    pub fn destination_for(&self, relative: &Path) -> PathBuf {
        self.dest_root.join(relative)
    }

    /// Ensure a hard link to `relative` exists in the destination tree.
    ///
    /// The link is attempted directly first. If that fails, missing ancestor
    /// directories are created and the link is retried exactly once; a
    /// second failure is fatal. A destination that already is the same file
    /// counts as success.
    pub fn materialize(&self, relative: &Path) -> Result<LinkOutcome, SessionError> {
        let original = self.source_root.join(relative);
        let dest = self.destination_for(relative);

        let first_error = match fs::hard_link(&original, &dest) {
            Ok(()) => return Ok(LinkOutcome::Linked),
            Err(e) => e,
        };

        if is_same_file(&original, &dest) {
            debug!(dest = %dest.display(), "already linked");
            return Ok(LinkOutcome::AlreadyLinked);
        }

        trace!(dest = %dest.display(), error = %first_error, "link failed, creating parents");
        if let Some(parent) = dest.parent() {
            create_dir_all(parent, self.dir_mode).map_err(|e| SessionError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::hard_link(&original, &dest).map_err(|e| SessionError::Link {
            original: original.clone(),
            dest: dest.clone(),
            source: e,
        })?;

        Ok(LinkOutcome::LinkedAfterMkdir)
    }
}

/// Create `path` and any missing ancestors with the given mode.
pub(crate) fn create_dir_all(path: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(path)
}

/// Whether two paths name the same inode (symlinks are not followed).
#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(_a: &Path, _b: &Path) -> bool {
    false
}
