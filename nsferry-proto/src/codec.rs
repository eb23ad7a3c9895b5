//! Ancillary transfer of the namespace descriptor set
//!
//! One message carries the whole set: a single in-band tag byte plus one
//! SCM_RIGHTS control record holding all six descriptors. This module uses
//! `unsafe` to adopt the descriptor numbers the kernel delivers into owned
//! handles.

#![allow(unsafe_code)]

use std::io::{IoSlice, IoSliceMut};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::cmsg_space;
use nix::sys::socket::{ControlMessage, ControlMessageOwned, MsgFlags, recvmsg, sendmsg};
use tracing::{debug, error};

use nsferry_core::{Error, Result};
use nsferry_namespace::{NamespaceFdSet, NamespaceKind};

use crate::command::Command;

/// Send the complete descriptor set over `socket`
///
/// The in-band payload is the single `fds` tag byte; the descriptors ride
/// in one SCM_RIGHTS record. `MSG_NOSIGNAL` keeps a dead peer an error
/// instead of a signal.
///
/// # Errors
/// Returns [`Error::IncompleteSet`] before any bytes move if a slot is
/// absent, or the send fault otherwise.
pub fn send_fd_set<S: AsRawFd>(socket: &S, set: &NamespaceFdSet) -> Result<()> {
    let fds = set.raw_fds()?;

    let tag = [Command::Fds.as_byte()];
    let iov = [IoSlice::new(&tag)];
    let rights = [ControlMessage::ScmRights(&fds)];

    let sent = sendmsg::<()>(
        socket.as_raw_fd(),
        &iov,
        &rights,
        MsgFlags::MSG_NOSIGNAL,
        None,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to send descriptor set");
        Error::System(e)
    })?;

    if sent < tag.len() {
        error!(sent, "Descriptor transfer accepted no in-band byte");
        return Err(Error::ShortWrite {
            sent,
            expected: tag.len(),
        });
    }

    debug!(count = fds.len(), "Sent descriptor set");
    Ok(())
}

/// Receive the descriptor set from `socket`
///
/// The transfer is accepted only with exactly the expected shape: an
/// in-band byte, one descriptor-rights record, exactly
/// [`NamespaceKind::COUNT`] descriptors, and no control-data truncation.
/// Delivered descriptors are adopted into owned handles before validation,
/// so a rejected transfer closes them instead of leaking them.
///
/// # Errors
/// Returns [`Error::Disconnected`] if the peer closed the connection, or
/// the ancillary shape fault.
pub fn recv_fd_set<S: AsRawFd>(socket: &S) -> Result<NamespaceFdSet> {
    let mut tag = [0u8; 1];
    let mut iov = [IoSliceMut::new(&mut tag)];
    let mut space = cmsg_space!([RawFd; NamespaceKind::COUNT]);

    let msg = recvmsg::<()>(
        socket.as_raw_fd(),
        &mut iov,
        Some(&mut space),
        MsgFlags::empty(),
    )
    .map_err(|e| {
        error!(error = %e, "Failed to receive descriptor set");
        Error::System(e)
    })?;

    if msg.bytes == 0 {
        error!("Peer disconnected before the descriptor transfer");
        return Err(Error::Disconnected);
    }

    let truncated = msg.flags.contains(MsgFlags::MSG_CTRUNC);

    // Adopt whatever the kernel delivered before judging the shape.
    let mut fds: Vec<OwnedFd> = Vec::new();
    let mut rights_seen = false;
    let mut foreign_seen = false;
    if let Ok(records) = msg.cmsgs() {
        for record in records {
            match record {
                ControlMessageOwned::ScmRights(raw) => {
                    rights_seen = true;
                    for fd in raw {
                        // SAFETY: recvmsg just created this descriptor in our
                        // process; nothing else owns it yet.
                        fds.push(unsafe { OwnedFd::from_raw_fd(fd) });
                    }
                }
                _ => foreign_seen = true,
            }
        }
    }

    if !rights_seen && !foreign_seen && !truncated {
        error!("Transfer arrived without an ancillary record");
        return Err(Error::AncillaryMissing);
    }

    if foreign_seen {
        error!("Transfer carried a non-rights ancillary record");
        return Err(Error::AncillaryKind);
    }

    if truncated || fds.len() != NamespaceKind::COUNT {
        error!(
            expected = NamespaceKind::COUNT,
            actual = fds.len(),
            truncated,
            "Descriptor transfer had the wrong shape"
        );
        return Err(Error::AncillaryLength {
            expected: NamespaceKind::COUNT,
            actual: fds.len(),
        });
    }

    let mut set = NamespaceFdSet::new();
    for (kind, fd) in NamespaceKind::ALL.into_iter().zip(fds) {
        set.insert(kind, fd);
    }

    debug!(count = set.len(), "Received descriptor set");
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;
    use std::fs::File;
    use std::io::{Read, Write};
    use std::os::unix::fs::FileTypeExt;
    use std::os::unix::net::UnixStream;

    fn filled_set() -> NamespaceFdSet {
        let mut set = NamespaceFdSet::new();
        for kind in NamespaceKind::ALL {
            set.insert(kind, OwnedFd::from(File::open("/dev/null").unwrap()));
        }
        set
    }

    #[test]
    fn test_round_trip_delivers_six_usable_descriptors() {
        let (a, b) = UnixStream::pair().unwrap();
        let set = filled_set();
        send_fd_set(&a, &set).unwrap();

        let mut received = recv_fd_set(&b).unwrap();
        assert!(received.is_complete());

        // The sender still holds its own descriptors, so every received
        // number is a fresh duplicate and must be openly usable.
        for kind in NamespaceKind::ALL {
            let fd = received.take(kind).unwrap();
            let file = File::from(fd);
            assert!(file.metadata().unwrap().file_type().is_char_device());
        }
    }

    #[test]
    fn test_send_incomplete_set_fails_before_any_bytes() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut set = filled_set();
        let _removed = set.take(NamespaceKind::User);

        assert!(matches!(send_fd_set(&a, &set), Err(Error::IncompleteSet)));

        // Nothing reached the peer.
        b.set_nonblocking(true).unwrap();
        let mut b = b;
        let mut buf = [0u8; 1];
        let err = b.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
    }

    #[test]
    fn test_recv_rejects_missing_ancillary() {
        let (mut a, b) = UnixStream::pair().unwrap();
        a.write_all(&[Command::Fds.as_byte()]).unwrap();

        assert!(matches!(recv_fd_set(&b), Err(Error::AncillaryMissing)));
    }

    #[test]
    fn test_recv_rejects_wrong_ancillary_kind() {
        let (mut a, b) = UnixStream::pair().unwrap();

        // With SO_PASSCRED set the kernel attaches a credentials record to
        // the plain byte, which is ancillary data of the wrong kind.
        let on: libc::c_int = 1;
        let rc = unsafe {
            libc::setsockopt(
                b.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_PASSCRED,
                std::ptr::from_ref(&on).cast(),
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        assert_eq!(rc, 0);

        a.write_all(&[Command::Fds.as_byte()]).unwrap();

        assert!(matches!(recv_fd_set(&b), Err(Error::AncillaryKind)));
    }

    #[test]
    fn test_recv_rejects_short_set() {
        let (a, b) = UnixStream::pair().unwrap();

        let files: Vec<File> = (0..4).map(|_| File::open("/dev/null").unwrap()).collect();
        let fds: Vec<RawFd> = files.iter().map(AsRawFd::as_raw_fd).collect();
        let tag = [Command::Fds.as_byte()];
        let iov = [IoSlice::new(&tag)];
        let rights = [ControlMessage::ScmRights(&fds)];
        sendmsg::<()>(a.as_raw_fd(), &iov, &rights, MsgFlags::empty(), None).unwrap();

        assert!(matches!(
            recv_fd_set(&b),
            Err(Error::AncillaryLength {
                expected: 6,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_recv_after_peer_closed() {
        let (a, b) = UnixStream::pair().unwrap();
        drop(a);

        assert!(matches!(recv_fd_set(&b), Err(Error::Disconnected)));
    }

    #[test]
    fn test_send_to_dead_peer_is_an_error_not_a_signal() {
        let (a, b) = UnixStream::pair().unwrap();
        drop(b);

        let set = filled_set();
        assert!(matches!(
            send_fd_set(&a, &set),
            Err(Error::System(Errno::EPIPE))
        ));
    }
}
