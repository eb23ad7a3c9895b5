//! Wire command vocabulary

use std::fmt;

use nsferry_core::{Error, Result};

/// Session commands exchanged as single in-band bytes
///
/// The numeric values are the wire format and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Open the session
    Start = 42,
    /// Close the session successfully
    End = 43,
    /// Request the descriptor transfer
    Fds = 44,
    /// Report a failure on the sending side
    Error = 45,
}

impl Command {
    /// Wire byte for this command
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Short name used in diagnostics
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Fds => "fds",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            42 => Ok(Self::Start),
            43 => Ok(Self::End),
            44 => Ok(Self::Fds),
            45 => Ok(Self::Error),
            _ => Err(Error::InvalidCommand { value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_are_fixed() {
        assert_eq!(Command::Start.as_byte(), 42);
        assert_eq!(Command::End.as_byte(), 43);
        assert_eq!(Command::Fds.as_byte(), 44);
        assert_eq!(Command::Error.as_byte(), 45);
    }

    #[test]
    fn test_try_from_accepts_wire_bytes() {
        for command in [Command::Start, Command::End, Command::Fds, Command::Error] {
            assert_eq!(Command::try_from(command.as_byte()).unwrap(), command);
        }
    }

    #[test]
    fn test_try_from_rejects_unknown_bytes() {
        for value in [0u8, 1, 41, 46, 100, 255] {
            assert!(matches!(
                Command::try_from(value),
                Err(Error::InvalidCommand { value: v }) if v == value
            ));
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(Command::Start.name(), "start");
        assert_eq!(Command::End.name(), "end");
        assert_eq!(format!("{}", Command::Fds), "fds");
        assert_eq!(Command::Error.to_string(), "error");
    }
}
