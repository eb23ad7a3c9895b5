//! Receiver session: the client side of the descriptor handoff

use std::convert::Infallible;
use std::ffi::CString;
use std::io::Write;
use std::os::unix::net::UnixStream;

use nix::errno::Errno;
use nix::unistd::execv;
use tracing::{debug, error, info};

use nsferry_core::{Error, Result, SocketPath};
use nsferry_namespace::NamespaceFdSet;

use crate::codec::recv_fd_set;
use crate::command::Command;

/// The fixed command sequence the receiver sends before any read
///
/// All three commands go out before the first read; the holder answers
/// `fds` while the later bytes sit in its receive queue.
const COMMAND_SEQUENCE: [u8; 3] = [
    Command::Start.as_byte(),
    Command::Fds.as_byte(),
    Command::End.as_byte(),
];

/// Program to run once the descriptors have arrived
///
/// The argument vector is handed to the program verbatim, argv[0]
/// included; nothing is copied from the receiver's own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecTarget {
    program: String,
    args: Vec<String>,
}

impl ExecTarget {
    /// Create a target from a program path and its full argument vector
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Program path
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Replace the current process image with the target
    ///
    /// On success this never returns; every descriptor not marked
    /// close-on-exec stays open in the new image. The returned error
    /// reports why the replacement failed.
    pub fn exec(&self) -> Error {
        let e = match self.try_exec() {
            Ok(never) => match never {},
            Err(e) => e,
        };
        error!(program = %self.program, error = %e, "Failed to replace the process image");
        Error::Exec {
            program: self.program.clone(),
            source: e,
        }
    }

    fn try_exec(&self) -> nix::Result<Infallible> {
        // An interior NUL can never reach execv; surface it as EINVAL.
        let program = CString::new(self.program.as_bytes()).map_err(|_| Errno::EINVAL)?;
        let args = self
            .args
            .iter()
            .map(|arg| CString::new(arg.as_bytes()).map_err(|_| Errno::EINVAL))
            .collect::<nix::Result<Vec<_>>>()?;
        execv(&program, &args)
    }
}

/// Client side of the handoff
#[derive(Debug)]
pub struct ReceiverSession {
    path: SocketPath,
    exec: Option<ExecTarget>,
}

impl ReceiverSession {
    /// Create a session; `exec` is the optional follow-on program
    #[must_use]
    pub fn new(path: SocketPath, exec: Option<ExecTarget>) -> Self {
        Self { path, exec }
    }

    /// Run the session to completion
    ///
    /// Connects, sends `start, fds, end` as one write, and receives the
    /// descriptor set. Without a follow-on program the populated set is
    /// returned to the caller with every descriptor open. With one, the
    /// process image is replaced and this only returns on failure; the
    /// received descriptors are inherited because nothing marked them
    /// close-on-exec, while the rendezvous socket is and closes.
    pub fn run(self) -> Result<NamespaceFdSet> {
        info!(path = %self.path, "Connecting to the holder");
        let mut stream = UnixStream::connect(self.path.as_path()).map_err(|e| {
            error!(path = %self.path, error = %e, "Failed to connect to the holder");
            Error::Io(e)
        })?;

        send_commands(&mut stream)?;

        let set = recv_fd_set(&stream)?;
        info!(descriptors = set.len(), "Received the namespace descriptor set");

        let Some(target) = self.exec else {
            info!("Received descriptors and nothing more to do");
            return Ok(set);
        };

        debug!(program = %target.program, "Replacing the process image");
        // `set` stays live across the call, so the new image inherits it.
        Err(target.exec())
    }
}

/// Send the full command sequence as a single write
///
/// The protocol has no partial-command recovery, so a short write is a
/// hard fault rather than a retry.
fn send_commands(stream: &mut UnixStream) -> Result<()> {
    let sent = stream.write(&COMMAND_SEQUENCE).map_err(|e| {
        error!(error = %e, "Failed to send session commands");
        Error::Io(e)
    })?;
    if sent < COMMAND_SEQUENCE.len() {
        error!(
            sent,
            expected = COMMAND_SEQUENCE.len(),
            "Short write sending session commands"
        );
        return Err(Error::ShortWrite {
            sent,
            expected: COMMAND_SEQUENCE.len(),
        });
    }

    debug!("Sent start, fds, end");
    Ok(())
}
