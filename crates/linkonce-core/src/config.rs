//! Session configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default name of the state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".linkonce";

/// Suffix of the temporary file a state save writes before renaming it.
pub const STATE_TEMP_SUFFIX: &str = ".tmp";

/// Default mode for directories created under the destination root.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Configuration for one linking session.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SessionConfig {
    /// Root of the tree to mirror. Paths in the link state are relative to it.
    #[builder(default = "PathBuf::from(\".\")")]
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// Directory under which the mirrored tree is created.
    pub dest_root: PathBuf,

    /// File remembering already linked paths across runs.
    #[builder(default = "PathBuf::from(DEFAULT_STATE_FILE)")]
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Permission bits for created directories (Unix only).
    #[builder(default = "DEFAULT_DIR_MODE")]
    #[serde(default = "default_dir_mode")]
    pub dir_mode: u32,
}

fn default_source_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

fn default_dir_mode() -> u32 {
    DEFAULT_DIR_MODE
}

impl SessionConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.dest_root {
            Some(ref dest) if dest.as_os_str().is_empty() => {
                Err("Destination directory cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Destination directory is required".to_string()),
        }
    }
}

impl SessionConfig {
    /// Create a new session config builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Create a config linking the working directory into `dest_root`.
    pub fn new(dest_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: default_source_root(),
            dest_root: dest_root.into(),
            state_file: default_state_file(),
            dir_mode: DEFAULT_DIR_MODE,
        }
    }
}
