//! Loading and atomically persisting the link state.

use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use linkonce_core::{LinkState, SaveStage, SessionError};

/// Reads and writes the link state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state.
    ///
    /// A state file that does not exist or cannot be opened yields an empty
    /// state: that is what a first run looks like. If reading stops partway,
    /// the entries read so far are kept. Loading never fails.
    pub fn load(&self) -> LinkState {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file, starting empty");
                return LinkState::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot open state file, starting empty");
                return LinkState::new();
            }
        };

        let mut bytes = Vec::new();
        if let Err(e) = file.read_to_end(&mut bytes) {
            warn!(
                path = %self.path.display(),
                error = %e,
                bytes_read = bytes.len(),
                "error reading state file, keeping what was read"
            );
        }

        let state = LinkState::decode(&bytes);
        debug!(path = %self.path.display(), entries = state.len(), "loaded state");
        state
    }

    /// Persist `state`, replacing the previous file.
    ///
    /// Entries go to a temporary file next to the state file, which is
    /// flushed and synced before being renamed over the target. The rename
    /// is the only commit point, so an interrupted save leaves the old file
    /// intact.
    pub fn save(&self, state: &LinkState) -> Result<(), SessionError> {
        let tmp = self.temp_file().map_err(self.write_error(SaveStage::Create))?;

        let mut writer = BufWriter::new(tmp);
        state
            .encode_to(&mut writer)
            .map_err(self.write_error(SaveStage::Write))?;
        writer.flush().map_err(self.write_error(SaveStage::Flush))?;
        let tmp = writer
            .into_inner()
            .map_err(|e| self.write_error(SaveStage::Flush)(e.into_error()))?;

        tmp.as_file()
            .sync_all()
            .map_err(self.write_error(SaveStage::Sync))?;

        tmp.persist(&self.path)
            .map_err(|e| self.write_error(SaveStage::Rename)(e.error))?;

        debug!(path = %self.path.display(), entries = state.len(), "saved state");
        Ok(())
    }

    fn write_error(&self, stage: SaveStage) -> impl FnOnce(std::io::Error) -> SessionError + '_ {
        move |source| SessionError::state_write(&self.path, stage, source)
    }

    /// Create the sibling temporary file the next save writes into.
    fn temp_file(&self) -> std::io::Result<tempfile::NamedTempFile> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let prefix = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| ".linkonce".into());

        let tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))?;
        }

        Ok(tmp)
    }
}
