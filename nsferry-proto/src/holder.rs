//! Holder session: the server side of the descriptor handoff
//!
//! The session owns the rendezvous path from bind to final removal and
//! serves exactly one receiver connection. This module uses `unsafe` to
//! adopt the descriptor `accept` delivers into an owned handle.

#![allow(unsafe_code)]

use std::io::Read;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::socket::{
    AddressFamily, Backlog, SockFlag, SockType, UnixAddr, accept, bind, listen, socket,
};
use nix::unistd::{close, unlink};
use tracing::{debug, error, info, warn};

use nsferry_core::{Error, Result, SocketPath};
use nsferry_namespace::{NamespaceFdSet, PROC_NS_DIR};

use crate::codec::send_fd_set;
use crate::command::Command;

/// Server side of the handoff
///
/// Binds the rendezvous socket, opens the namespace descriptor set, and
/// answers the commands of a single receiver. The session owns the bound
/// path: any stale object there is removed before binding, and the path
/// is removed again after the listening socket closes, on success and on
/// failure alike.
#[derive(Debug)]
pub struct HolderSession {
    path: SocketPath,
    ns_dir: PathBuf,
}

impl HolderSession {
    /// Create a session serving this process's namespace descriptors
    #[must_use]
    pub fn new(path: SocketPath) -> Self {
        Self {
            path,
            ns_dir: PathBuf::from(PROC_NS_DIR),
        }
    }

    #[cfg(test)]
    fn with_namespace_dir(path: SocketPath, ns_dir: impl Into<PathBuf>) -> Self {
        Self {
            path,
            ns_dir: ns_dir.into(),
        }
    }

    /// Run the session to completion
    ///
    /// Once the rendezvous path is bound, cleanup covers every exit:
    /// the accepted connection, the descriptor set, the listener, and
    /// the path itself are all released even when an earlier step
    /// failed, and any cleanup failure downgrades an otherwise
    /// successful result.
    pub fn run(self) -> Result<()> {
        info!(path = %self.path, "Starting holder session");

        remove_socket_path(self.path.as_path())?;

        let listener = self.bind_listener()?;

        let mut set = NamespaceFdSet::new();
        let mut conn = None;
        let served = self.serve(&listener, &mut set, &mut conn);

        let cleaned = teardown(conn, &mut set, listener, self.path.as_path());

        if served.is_ok() && cleaned.is_ok() {
            info!(path = %self.path, "Holder session finished");
        }
        served.and(cleaned)
    }

    fn bind_listener(&self) -> Result<OwnedFd> {
        let listener = socket(AddressFamily::Unix, SockType::Stream, SockFlag::empty(), None)
            .map_err(|e| {
                error!(error = %e, "Failed to create rendezvous socket");
                Error::System(e)
            })?;

        let addr = UnixAddr::new(self.path.as_path())?;
        bind(listener.as_raw_fd(), &addr).map_err(|e| {
            error!(path = %self.path, error = %e, "Failed to bind rendezvous socket");
            Error::System(e)
        })?;

        debug!(path = %self.path, "Bound rendezvous socket");
        Ok(listener)
    }

    fn serve(
        &self,
        listener: &OwnedFd,
        set: &mut NamespaceFdSet,
        conn: &mut Option<UnixStream>,
    ) -> Result<()> {
        // The set opens right after bind so the teardown in `run` covers
        // it on every later failure.
        set.open_all_from(&self.ns_dir)?;

        // One receiver per run, so one pending connection is enough.
        listen(listener, Backlog::new(1)?).map_err(|e| {
            error!(error = %e, "Failed to listen on rendezvous socket");
            Error::System(e)
        })?;
        info!(path = %self.path, "Waiting for the receiver");

        let raw = accept(listener.as_raw_fd()).map_err(|e| {
            error!(error = %e, "Failed to accept receiver connection");
            Error::System(e)
        })?;
        // SAFETY: accept just created this descriptor; nothing else owns it.
        let stream = conn.insert(UnixStream::from(unsafe { OwnedFd::from_raw_fd(raw) }));
        debug!("Receiver connected");

        respond(stream, set)
    }
}

/// Answer receiver commands until `end`, a fault, or a disconnect
///
/// `start` must come first and only once; `fds` and `end` are legal only
/// after it. Every well-ordered `fds` command transfers the full set
/// again, so one session can serve several transfers.
fn respond(stream: &mut UnixStream, set: &NamespaceFdSet) -> Result<()> {
    let mut started = false;

    loop {
        let mut byte = [0u8; 1];
        let read = stream.read(&mut byte).map_err(|e| {
            error!(error = %e, "Failed to read command from receiver");
            Error::Io(e)
        })?;
        if read == 0 {
            error!("Receiver disconnected before ending the session");
            return Err(Error::Disconnected);
        }

        let command = Command::try_from(byte[0]).map_err(|e| {
            error!(value = byte[0], "Invalid command byte from receiver");
            e
        })?;
        debug!(command = %command, "Received command");

        match command {
            Command::Start => {
                if started {
                    error!("Duplicate start command from receiver");
                    return Err(Error::DuplicateStart);
                }
                started = true;
            }
            Command::Fds => {
                if !started {
                    error!("Received fds command before start");
                    return Err(Error::CommandBeforeStart {
                        command: command.name(),
                    });
                }
                send_fd_set(stream, set)?;
            }
            Command::End => {
                if !started {
                    error!("Received end command before start");
                    return Err(Error::CommandBeforeStart {
                        command: command.name(),
                    });
                }
                debug!("Receiver ended the session");
                return Ok(());
            }
            Command::Error => {
                error!("Receiver reported an error");
                return Err(Error::PeerError);
            }
        }
    }
}

/// Release everything the session acquired
///
/// Connection, descriptor set, listener, then the rendezvous path. Every
/// step runs regardless of earlier failures; the first failure is the
/// one reported.
fn teardown(
    conn: Option<UnixStream>,
    set: &mut NamespaceFdSet,
    listener: OwnedFd,
    path: &Path,
) -> Result<()> {
    let mut result = Ok(());

    if let Some(stream) = conn {
        if let Err(e) = close(stream.into_raw_fd()) {
            warn!(error = %e, "Failed to close receiver connection");
            result = result.and(Err(Error::System(e)));
        }
    }

    if let Err(e) = set.close_all() {
        result = result.and(Err(e));
    }

    if let Err(e) = close(listener.into_raw_fd()) {
        warn!(error = %e, "Failed to close listening socket");
        result = result.and(Err(Error::System(e)));
    }

    result.and(remove_socket_path(path))
}

/// Remove the rendezvous path, treating "already gone" as success
fn remove_socket_path(path: &Path) -> Result<()> {
    match unlink(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed rendezvous path");
            Ok(())
        }
        Err(Errno::ENOENT) => Ok(()),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to remove rendezvous path");
            Err(Error::System(e))
        }
    }
}
