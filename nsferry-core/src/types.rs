//! Core type definitions with strong typing and validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{Error, Result};

// `sockaddr_un` is a short family tag followed by the path bytes; libc does
// not export the array length, so derive it from the struct layout.
const SUN_PATH_CAPACITY: usize =
    std::mem::size_of::<libc::sockaddr_un>() - std::mem::size_of::<libc::sa_family_t>();

/// Rendezvous socket path with validation
///
/// A path is accepted only if it fits a `sockaddr_un` address, so binding
/// and connecting cannot fail on length after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "PathBuf", into = "PathBuf")]
pub struct SocketPath(PathBuf);

impl SocketPath {
    /// Maximum number of path bytes that fit `sockaddr_un.sun_path`
    /// together with the trailing NUL
    pub const MAX_LENGTH: usize = SUN_PATH_CAPACITY - 1;

    /// Create a new `SocketPath` with validation
    ///
    /// # Errors
    /// Returns error if the path is empty or too long for a Unix socket
    /// address.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        Self::validate(&path)?;
        Ok(Self(path))
    }

    /// Validate a socket path
    fn validate(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidPath {
                message: "Socket path cannot be empty".to_string(),
            });
        }

        let len = path.as_os_str().as_bytes().len();
        if len > Self::MAX_LENGTH {
            return Err(Error::InvalidPath {
                message: format!(
                    "Socket path too long ({len} bytes, max {})",
                    Self::MAX_LENGTH
                ),
            });
        }

        Ok(())
    }

    /// Get the socket path as a `Path` slice
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SocketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl FromStr for SocketPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<PathBuf> for SocketPath {
    type Error = Error;

    fn try_from(path: PathBuf) -> Result<Self> {
        Self::new(path)
    }
}

impl From<SocketPath> for PathBuf {
    fn from(path: SocketPath) -> Self {
        path.0
    }
}

impl AsRef<Path> for SocketPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
