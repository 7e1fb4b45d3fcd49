//! Core types for linkonce.
//!
//! This crate provides the data shared by every part of a linking session:
//! the persisted set of already linked paths, session configuration, the
//! error taxonomy and walk statistics.

mod config;
mod entry;
mod error;
mod state;
mod stats;

pub use config::{
    DEFAULT_DIR_MODE, DEFAULT_STATE_FILE, STATE_TEMP_SUFFIX, SessionConfig, SessionConfigBuilder,
};
pub use entry::{EntryOutcome, TraversalEntry};
pub use error::{SaveStage, SessionError};
pub use state::{LinkState, SEPARATOR};
pub use stats::{SessionSummary, WalkStats};
