//! Sync status controller.
//!
//! Owns the sync status and the offline queue. Status changes are pushed to
//! subscribers synchronously, after internal locks are released, so a
//! listener may call back into the controller.

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;
use chrono::{DateTime, Utc};
use pocketwall_types::{Clock, DataMap, SystemClock, UserId};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, info, warn};

/// What the controller is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Syncing,
    Offline,
    Error,
}

/// Snapshot of the sync status delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub state: SyncState,
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Pushes waiting for the connection to come back.
    pub pending: usize,
    pub last_error: Option<String>,
}

/// Result of [`SyncController::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Delivered to the remote.
    Pushed,
    /// Held in the offline queue.
    Queued,
}

type Listener = Arc<dyn Fn(&SyncStatus) + Send + Sync>;
type Listeners = Mutex<Vec<(u64, Listener)>>;

struct PendingPush {
    user_id: UserId,
    data: DataMap,
}

struct Inner {
    online: bool,
    state: SyncState,
    last_synced_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    queue: VecDeque<PendingPush>,
}

impl Inner {
    fn status(&self) -> SyncStatus {
        SyncStatus {
            state: self.state,
            last_synced_at: self.last_synced_at,
            pending: self.queue.len(),
            last_error: self.last_error.clone(),
        }
    }

    /// Queues a push, replacing any older one for the same user.
    fn enqueue(&mut self, user_id: UserId, data: DataMap) {
        match self.queue.iter_mut().find(|p| p.user_id == user_id) {
            Some(existing) => existing.data = data,
            None => self.queue.push_back(PendingPush { user_id, data }),
        }
    }
}

/// Handle returned by [`SyncController::subscribe`].
///
/// Dropping the handle leaves the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug)]
#[must_use = "the handle is needed to unsubscribe"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Removes the listener. A no-op if the controller is gone.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// Tracks sync status and queues pushes while offline.
pub struct SyncController {
    remote: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
    listeners: Arc<Listeners>,
    next_listener: AtomicU64,
    flush_lock: tokio::sync::Mutex<()>,
}

impl SyncController {
    /// Creates an online, idle controller using the system clock.
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self::with_clock(remote, Arc::new(SystemClock))
    }

    /// Creates a controller with an explicit clock.
    pub fn with_clock(remote: Arc<dyn RemoteStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            remote,
            clock,
            inner: Mutex::new(Inner {
                online: true,
                state: SyncState::Idle,
                last_synced_at: None,
                last_error: None,
                queue: VecDeque::new(),
            }),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Current status.
    pub fn status(&self) -> SyncStatus {
        self.lock().status()
    }

    /// Whether the controller believes the remote is reachable.
    pub fn is_online(&self) -> bool {
        self.lock().online
    }

    /// Number of queued pushes.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Registers a listener. It is called once right away with the current
    /// status, then after every change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        let listener: Listener = Arc::new(listener);
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::clone(&listener)));

        listener(&self.status());

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Pushes `data` for `user_id`, or queues it if offline.
    ///
    /// A network failure moves the controller offline and queues the data.
    /// Other remote failures are returned and leave the state at `Error`.
    pub async fn push(&self, user_id: &UserId, data: DataMap) -> SyncResult<PushOutcome> {
        let queued = self.update(|inner| {
            if inner.online {
                inner.state = SyncState::Syncing;
                false
            } else {
                inner.enqueue(user_id.clone(), data.clone());
                true
            }
        });
        if queued {
            debug!("Offline, queued push for {user_id}");
            return Ok(PushOutcome::Queued);
        }

        match self.remote.push(user_id, data.clone()).await {
            Ok(()) => {
                let now = self.clock.now();
                self.update(|inner| {
                    inner.state = SyncState::Idle;
                    inner.last_synced_at = Some(now);
                    inner.last_error = None;
                });
                Ok(PushOutcome::Pushed)
            }
            Err(e) if e.is_transient() => {
                warn!("Push failed, going offline: {e}");
                self.update(|inner| {
                    inner.online = false;
                    inner.state = SyncState::Offline;
                    inner.enqueue(user_id.clone(), data);
                });
                Ok(PushOutcome::Queued)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Pulls the remote document for `user_id`.
    pub async fn pull(&self, user_id: &UserId) -> SyncResult<Option<DataMap>> {
        let online = self.update(|inner| {
            if inner.online {
                inner.state = SyncState::Syncing;
            }
            inner.online
        });
        if !online {
            return Err(SyncError::Offline);
        }

        match self.remote.pull(user_id).await {
            Ok(document) => {
                let now = self.clock.now();
                self.update(|inner| {
                    inner.state = SyncState::Idle;
                    inner.last_synced_at = Some(now);
                    inner.last_error = None;
                });
                Ok(document)
            }
            Err(e) => {
                if e.is_transient() {
                    self.update(|inner| {
                        inner.online = false;
                        inner.state = SyncState::Offline;
                    });
                } else {
                    self.fail(&e);
                }
                Err(e)
            }
        }
    }

    /// Records a connectivity change. Coming back online flushes the queue
    /// and returns the number of pushes delivered.
    pub async fn set_online(&self, online: bool) -> SyncResult<usize> {
        if !online {
            self.update(|inner| {
                inner.online = false;
                inner.state = SyncState::Offline;
            });
            info!("Sync offline");
            return Ok(0);
        }

        self.update(|inner| {
            inner.online = true;
            if inner.state == SyncState::Offline {
                inner.state = SyncState::Idle;
            }
        });
        info!("Sync online");
        self.flush().await
    }

    /// Delivers queued pushes in order. Stops at the first failure, leaving
    /// the rest queued.
    pub async fn flush(&self) -> SyncResult<usize> {
        let _guard = self.flush_lock.lock().await;
        let mut delivered = 0;

        loop {
            let next = self.update(|inner| {
                if !inner.online {
                    return None;
                }
                let next = inner.queue.pop_front();
                if next.is_some() {
                    inner.state = SyncState::Syncing;
                }
                next
            });
            let Some(pending) = next else {
                break;
            };

            if let Err(e) = self
                .remote
                .push(&pending.user_id, pending.data.clone())
                .await
            {
                let transient = e.is_transient();
                self.update(|inner| {
                    inner.queue.push_front(pending);
                    if transient {
                        inner.online = false;
                        inner.state = SyncState::Offline;
                    }
                });
                if transient {
                    warn!("Flush interrupted, {delivered} delivered: {e}");
                    return Ok(delivered);
                }
                self.fail(&e);
                return Err(e);
            }

            delivered += 1;
            let now = self.clock.now();
            self.update(|inner| {
                inner.state = SyncState::Idle;
                inner.last_synced_at = Some(now);
                inner.last_error = None;
            });
        }

        if delivered > 0 {
            info!("Flushed {delivered} queued pushes");
        }
        Ok(delivered)
    }

    fn fail(&self, error: &SyncError) {
        warn!("Sync error: {error}");
        let message = error.to_string();
        self.update(|inner| {
            inner.state = SyncState::Error;
            inner.last_error = Some(message);
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Applies `f` to the state and notifies listeners if the status changed.
    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let (result, changed) = {
            let mut inner = self.lock();
            let before = inner.status();
            let result = f(&mut inner);
            let after = inner.status();
            (result, (before != after).then_some(after))
        };

        if let Some(status) = changed {
            self.notify(&status);
        }
        result
    }

    fn notify(&self, status: &SyncStatus) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(status);
        }
    }
}
