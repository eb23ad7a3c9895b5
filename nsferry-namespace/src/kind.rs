//! Namespace kind vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed, ordered set of namespace kinds carried in a handoff
///
/// The declaration order is the transfer order: slot `i` of a descriptor
/// transfer always holds the descriptor for `NamespaceKind::ALL[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    /// Inter-process communication namespace
    Ipc,
    /// Mount namespace
    Mnt,
    /// Network namespace
    Net,
    /// PID namespace
    Pid,
    /// User namespace
    User,
    /// UTS namespace (hostname and domain name)
    Uts,
}

impl NamespaceKind {
    /// Number of namespace kinds in a complete transfer
    pub const COUNT: usize = 6;

    /// Every kind in transfer order
    pub const ALL: [Self; Self::COUNT] = [
        Self::Ipc,
        Self::Mnt,
        Self::Net,
        Self::Pid,
        Self::User,
        Self::Uts,
    ];

    /// File name of this kind under a proc namespace directory
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ipc => "ipc",
            Self::Mnt => "mnt",
            Self::Net => "net",
            Self::Pid => "pid",
            Self::User => "user",
            Self::Uts => "uts",
        }
    }

    /// Slot index of this kind in a transfer
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
