//! Error types for nsferry

use thiserror::Error;

/// nsferry error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// System error from nix
    #[error("System error: {0}")]
    System(#[from] nix::Error),

    /// Socket path failed validation
    #[error("Invalid socket path: {message}")]
    InvalidPath {
        /// Error message
        message: String,
    },

    /// Opening one namespace file failed
    #[error("Failed to open {kind} namespace: {source}")]
    NamespaceOpen {
        /// Namespace kind name
        kind: &'static str,
        /// Underlying open error
        #[source]
        source: std::io::Error,
    },

    /// Closing one or more namespace descriptors failed
    #[error("Failed to close namespace descriptors: {}", .failures.join(", "))]
    NamespaceClose {
        /// Names of the kinds whose close reported an error
        failures: Vec<&'static str>,
    },

    /// The descriptor set is missing at least one slot
    #[error("Namespace descriptor set is incomplete")]
    IncompleteSet,

    /// Peer sent a second start command
    #[error("Duplicate start command from peer")]
    DuplicateStart,

    /// Peer sent a command that is only valid after start
    #[error("Received {command} command before start")]
    CommandBeforeStart {
        /// Command name
        command: &'static str,
    },

    /// Peer sent a byte that maps to no command
    #[error("Invalid command byte {value} from peer")]
    InvalidCommand {
        /// The offending byte
        value: u8,
    },

    /// Peer reported a failure on its side
    #[error("Peer reported an error")]
    PeerError,

    /// Peer closed the connection mid-protocol
    #[error("Peer disconnected")]
    Disconnected,

    /// A single write accepted fewer bytes than required
    #[error("Short write: accepted {sent} of {expected} bytes")]
    ShortWrite {
        /// Bytes the kernel accepted
        sent: usize,
        /// Bytes required
        expected: usize,
    },

    /// Transfer arrived without an ancillary descriptor record
    #[error("No ancillary descriptor record in transfer")]
    AncillaryMissing,

    /// Transfer carried ancillary data of the wrong kind
    #[error("Ancillary record is not a descriptor-rights record")]
    AncillaryKind,

    /// Ancillary record held the wrong number of descriptors
    #[error("Ancillary record holds {actual} descriptors, expected {expected}")]
    AncillaryLength {
        /// Descriptors required
        expected: usize,
        /// Descriptors delivered
        actual: usize,
    },

    /// Replacing the process image failed
    #[error("Failed to execute {program}: {source}")]
    Exec {
        /// Program path
        program: String,
        /// Underlying exec error
        #[source]
        source: nix::Error,
    },
}

/// Result type alias for nsferry operations
pub type Result<T> = std::result::Result<T, Error>;
