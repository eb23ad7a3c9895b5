//! Namespace descriptor set lifecycle

use std::fs::File;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};
use std::path::Path;

use nsferry_core::{Error, Result};

use crate::kind::NamespaceKind;

/// Directory holding the calling process's namespace files
pub const PROC_NS_DIR: &str = "/proc/self/ns";

/// Owned descriptors for every namespace kind, indexed in kind order
///
/// Every slot is either present or absent. A descriptor leaves the set only
/// through [`take`](Self::take) or [`close_all`](Self::close_all); dropping
/// the set closes whatever is still populated.
#[derive(Debug, Default)]
pub struct NamespaceFdSet {
    slots: [Option<OwnedFd>; NamespaceKind::COUNT],
}

impl NamespaceFdSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every namespace file under [`PROC_NS_DIR`] read-only, in kind order
    ///
    /// Stops at the first failure, leaving the slots opened so far populated
    /// so a later [`close_all`](Self::close_all) releases them.
    ///
    /// # Errors
    /// Returns [`Error::NamespaceOpen`] naming the kind that failed.
    pub fn open_all(&mut self) -> Result<()> {
        self.open_all_from(Path::new(PROC_NS_DIR))
    }

    /// Open every namespace file under `dir` read-only, in kind order
    ///
    /// # Errors
    /// Returns [`Error::NamespaceOpen`] naming the kind that failed.
    pub fn open_all_from(&mut self, dir: &Path) -> Result<()> {
        for kind in NamespaceKind::ALL {
            let path = dir.join(kind.as_str());
            let file = File::open(&path).map_err(|e| {
                tracing::error!(
                    kind = %kind,
                    path = %path.display(),
                    error = %e,
                    "Failed to open namespace file"
                );
                Error::NamespaceOpen {
                    kind: kind.as_str(),
                    source: e,
                }
            })?;

            tracing::debug!(kind = %kind, fd = file.as_raw_fd(), "Opened namespace file");
            self.slots[kind.index()] = Some(OwnedFd::from(file));
        }

        Ok(())
    }

    /// Store a descriptor in the slot for `kind`, returning the previous one
    pub fn insert(&mut self, kind: NamespaceKind, fd: OwnedFd) -> Option<OwnedFd> {
        self.slots[kind.index()].replace(fd)
    }

    /// Borrow the descriptor for `kind`, if present
    #[must_use]
    pub fn get(&self, kind: NamespaceKind) -> Option<BorrowedFd<'_>> {
        self.slots[kind.index()].as_ref().map(AsFd::as_fd)
    }

    /// Remove and return the descriptor for `kind`, if present
    #[must_use]
    pub fn take(&mut self, kind: NamespaceKind) -> Option<OwnedFd> {
        self.slots[kind.index()].take()
    }

    /// Number of populated slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check whether no slot is populated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Check whether every slot is populated
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Raw descriptor values for all slots, in kind order
    ///
    /// # Errors
    /// Returns [`Error::IncompleteSet`] if any slot is absent.
    pub fn raw_fds(&self) -> Result<[RawFd; NamespaceKind::COUNT]> {
        let mut fds = [0; NamespaceKind::COUNT];
        for kind in NamespaceKind::ALL {
            fds[kind.index()] = self.slots[kind.index()]
                .as_ref()
                .ok_or(Error::IncompleteSet)?
                .as_raw_fd();
        }
        Ok(fds)
    }

    /// Close every populated slot, in kind order
    ///
    /// A failed close is logged and recorded but does not stop the sweep.
    /// The slot is left absent either way: the kernel releases the
    /// descriptor number even when close(2) reports an error, so a retry
    /// could close an unrelated descriptor. Sweeping an empty set is a
    /// no-op.
    ///
    /// # Errors
    /// Returns [`Error::NamespaceClose`] naming every kind that failed.
    pub fn close_all(&mut self) -> Result<()> {
        let mut failures = Vec::new();

        for kind in NamespaceKind::ALL {
            let Some(fd) = self.slots[kind.index()].take() else {
                continue;
            };

            if let Err(e) = nix::unistd::close(fd.into_raw_fd()) {
                tracing::warn!(kind = %kind, error = %e, "Failed to close namespace descriptor");
                failures.push(kind.as_str());
            } else {
                tracing::debug!(kind = %kind, "Closed namespace descriptor");
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::NamespaceClose { failures })
        }
    }
}
