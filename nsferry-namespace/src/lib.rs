//! Namespace descriptor acquisition and release
//!
//! This crate owns the fixed vocabulary of namespace kinds that take part
//! in a handoff, and the set of open descriptors for them:
//! - IPC namespace - Inter-process communication
//! - Mount namespace - Filesystem mounts
//! - Network namespace - Network stack
//! - PID namespace - Process identifiers
//! - User namespace - UID/GID mappings
//! - UTS namespace - Hostname and domain name

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod fdset;
pub mod kind;

pub use fdset::{NamespaceFdSet, PROC_NS_DIR};
pub use kind::NamespaceKind;
