//! Session execution for the server and client roles

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use nsferry_core::SocketPath;
use nsferry_proto::{ExecTarget, HolderSession, ReceiverSession};

/// Bind the rendezvous socket and serve one receiver.
pub fn server(socket: &Path) -> Result<()> {
    let path = SocketPath::new(socket)?;

    HolderSession::new(path)
        .run()
        .context("Holder session failed")?;

    info!("Holder session complete");
    Ok(())
}

/// Connect to the holder and collect the descriptors.
///
/// `command` is the optional follow-on program and its argument vector;
/// when a program is given this only returns on failure.
pub fn client(socket: &Path, command: &[String]) -> Result<()> {
    let path = SocketPath::new(socket)?;

    let exec = command
        .split_first()
        .map(|(program, argv)| ExecTarget::new(program, argv.to_vec()));

    let set = ReceiverSession::new(path, exec)
        .run()
        .context("Receiver session failed")?;

    info!(descriptors = set.len(), "Receiver session complete");
    Ok(())
}
