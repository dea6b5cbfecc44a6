//! Remote store abstraction.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use pocketwall_types::{DataMap, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Per-user document in a hosted store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Replaces the user's remote document with `data`.
    async fn push(&self, user_id: &UserId, data: DataMap) -> SyncResult<()>;

    /// Fetches the user's remote document, if any.
    async fn pull(&self, user_id: &UserId) -> SyncResult<Option<DataMap>>;
}

/// In-memory remote that can be switched off to simulate a lost connection.
#[derive(Debug)]
pub struct MemoryRemoteStore {
    documents: Mutex<HashMap<UserId, DataMap>>,
    reachable: AtomicBool,
    pushes: AtomicUsize,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            pushes: AtomicUsize::new(0),
        }
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the remote reachable or unreachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of successful pushes so far.
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Current document for `user_id`.
    pub fn document(&self, user_id: &UserId) -> Option<DataMap> {
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(user_id)
            .cloned()
    }

    fn check_reachable(&self) -> SyncResult<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::Network("remote unreachable".to_string()))
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn push(&self, user_id: &UserId, data: DataMap) -> SyncResult<()> {
        self.check_reachable()?;
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_id.clone(), data);
        self.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn pull(&self, user_id: &UserId) -> SyncResult<Option<DataMap>> {
        self.check_reachable()?;
        Ok(self.document(user_id))
    }
}
