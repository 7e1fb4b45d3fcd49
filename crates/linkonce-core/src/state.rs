//! The set of already linked paths and its on-disk encoding.
//!
//! The encoding is a flat byte stream: every member is written as its raw
//! path bytes followed by a single NUL. There is no header, length prefix
//! or escaping, since real paths never contain NUL.

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Separator written after every encoded path.
pub const SEPARATOR: u8 = 0;

/// Typical number of entries; avoids rehashing for common trees.
const INITIAL_CAPACITY: usize = 20_000;

/// Paths, relative to the source root, that already have a hard link in
/// the destination tree.
///
/// Membership only; insertion is the sole mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkState {
    linked: HashSet<PathBuf>,
}

impl LinkState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self {
            linked: HashSet::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Whether `path` has already been linked.
    pub fn contains(&self, path: &Path) -> bool {
        self.linked.contains(path)
    }

    /// Record `path` as linked. Returns `true` if it was not present before.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.linked.insert(path.into())
    }

    /// Number of linked paths.
    pub fn len(&self) -> usize {
        self.linked.len()
    }

    /// Check if no path has been linked yet.
    pub fn is_empty(&self) -> bool {
        self.linked.is_empty()
    }

    /// Iterate over linked paths in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.linked.iter().map(PathBuf::as_path)
    }

    /// Decode a state from its NUL separated encoding.
    ///
    /// A trailing separator does not produce an empty entry, and a final
    /// fragment without a separator is still accepted as a member. Empty
    /// fragments are ignored.
    pub fn decode(bytes: &[u8]) -> Self {
        let mut state = Self::new();
        for fragment in bytes.split(|&b| b == SEPARATOR) {
            if !fragment.is_empty() {
                state.linked.insert(path_from_bytes(fragment));
            }
        }
        state
    }

    /// Write every member followed by a separator.
    pub fn encode_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for path in &self.linked {
            writer.write_all(&path_to_bytes(path))?;
            writer.write_all(&[SEPARATOR])?;
        }
        Ok(())
    }

    /// Encode into a freshly allocated buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for path in &self.linked {
            buf.extend_from_slice(&path_to_bytes(path));
            buf.push(SEPARATOR);
        }
        buf
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for LinkState {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut state = Self::new();
        for path in iter {
            state.insert(path);
        }
        state
    }
}

impl<P: Into<PathBuf>> Extend<P> for LinkState {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for path in iter {
            self.insert(path);
        }
    }
}

// Raw path bytes. Unix paths are arbitrary bytes; elsewhere fall back to UTF-8.

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    match path.to_string_lossy() {
        std::borrow::Cow::Borrowed(s) => std::borrow::Cow::Borrowed(s.as_bytes()),
        std::borrow::Cow::Owned(s) => std::borrow::Cow::Owned(s.into_bytes()),
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
