//! Tree walker for linkonce.
//!
//! Enumerates every entry under a source root with jwalk, running serially
//! with sorted directory reads so the visit order is stable. Each file not
//! yet in the [`LinkState`] is handed to a callback and recorded once the
//! callback succeeds.
//!
//! # Example
//!
//! ```rust,no_run
//! use linkonce_scan::{LinkState, TreeWalker};
//!
//! let mut state = LinkState::new();
//! let walker = TreeWalker::new(".").exclude("out");
//! let stats = walker
//!     .walk(&mut state, |path| {
//!         println!("new file: {}", path.display());
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! println!("{} new, {} already linked", stats.linked, stats.skipped);
//! ```

mod walker;

pub use walker::TreeWalker;

// Re-export core types for convenience
pub use linkonce_core::{EntryOutcome, LinkState, SessionError, TraversalEntry, WalkStats};
