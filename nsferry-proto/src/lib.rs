//! Descriptor handoff protocol between a holder and a receiver
//!
//! The holder binds a rendezvous socket, opens the namespace descriptor
//! set, and serves exactly one receiver. The receiver connects, drives the
//! four-command session protocol, and collects the descriptors from a
//! single ancillary transfer.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod codec;
pub mod command;
pub mod holder;
pub mod receiver;

pub use codec::{recv_fd_set, send_fd_set};
pub use command::Command;
pub use holder::HolderSession;
pub use receiver::{ExecTarget, ReceiverSession};
