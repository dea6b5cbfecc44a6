//! Sync status and offline queueing for PocketWall.
//!
//! The remote store itself is a collaborator ([`RemoteStore`]). This crate
//! owns what the app shows about it: a [`SyncController`] that tracks the
//! current [`SyncStatus`], notifies subscribers on every change, and queues
//! pushes made while offline until the connection comes back.

mod controller;
mod error;
mod remote;

pub use controller::{PushOutcome, Subscription, SyncController, SyncState, SyncStatus};
pub use error::{SyncError, SyncResult};
pub use remote::{MemoryRemoteStore, RemoteStore};
