//! Linking operations for linkonce.
//!
//! This crate ties the pieces of a session together:
//!
//! - [`StateStore`] loads the set of already linked paths and persists it
//!   atomically (temporary file plus rename).
//! - [`LinkMaterializer`] creates one hard link in the destination tree,
//!   creating missing parent directories on demand.
//! - [`Session`] prepares the destination, walks the source tree and saves
//!   the updated state.
//!
//! # Example
//!
//! ```rust,no_run
//! use linkonce_ops::{Session, SessionConfig};
//!
//! let summary = Session::new(SessionConfig::new("/srv/mirror")).run().unwrap();
//! println!("{} files linked", summary.walk.linked);
//! ```

mod materialize;
mod session;
mod store;

pub use materialize::{LinkMaterializer, LinkOutcome};
pub use session::Session;
pub use store::StateStore;

// Re-export core types for convenience
pub use linkonce_core::{LinkState, SaveStage, SessionConfig, SessionError, SessionSummary, WalkStats};
