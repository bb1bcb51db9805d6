//! Registry of in-flight waiters.
//!
//! When several callers miss on the same key, the first one (the leader)
//! computes the value while the others block on a [`WaitHandle`]. The handle
//! is released when its [`Waiter`] is closed, either by the leader once the
//! value is stored or by the [`Reaper`](crate::Reaper) once the backing key
//! has expired.
//!
//! All creation and deletion goes through one mutex. A waiter is closed by
//! dropping its sender, and since removal hands back the owned [`Waiter`],
//! a channel can only ever be closed once.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, watch};

/// Generation number distinguishing successive waiters for the same key.
pub type WaiterId = u64;

/// The sending side of a waiter channel. Never carries a value; closing it is
/// the only signal.
#[derive(Debug)]
pub struct Waiter {
    id: WaiterId,
    tx: watch::Sender<()>,
}

impl Waiter {
    fn new(id: WaiterId) -> Self {
        let (tx, _rx) = watch::channel(());
        Waiter { id, tx }
    }

    pub fn id(&self) -> WaiterId {
        self.id
    }

    /// Create a new handle observing this waiter.
    pub fn subscribe(&self) -> WaitHandle {
        WaitHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of handles currently waiting.
    pub fn waiting(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Close the channel, releasing every handle.
    pub fn close(self) {
        drop(self.tx);
    }
}

/// The receiving side of a waiter channel.
#[derive(Debug, Clone)]
pub struct WaitHandle {
    rx: watch::Receiver<()>,
}

impl WaitHandle {
    /// Wait until the waiter is closed. Returns immediately if it already is.
    pub async fn closed(&mut self) {
        while self.rx.changed().await.is_ok() {}
    }

    pub fn is_closed(&self) -> bool {
        self.rx.has_changed().is_err()
    }
}

/// Result of [`WaiterMap::join`].
#[derive(Debug)]
pub struct Registration {
    pub handle: WaitHandle,
    /// True when this call created the waiter and is responsible for
    /// producing the value.
    pub is_leader: bool,
}

/// The map guarded by the registry lock.
///
/// Obtained through [`WaiterRegistry::lock`] for compound operations; every
/// method here assumes the caller holds the lock.
#[derive(Debug, Default)]
pub struct WaiterMap {
    waiters: HashMap<String, Waiter>,
    next_id: WaiterId,
}

impl WaiterMap {
    fn allocate(&mut self, key: &str) -> WaitHandle {
        self.next_id += 1;
        let waiter = Waiter::new(self.next_id);
        let handle = waiter.subscribe();
        self.waiters.insert(key.to_string(), waiter);
        handle
    }

    /// Create a waiter for `key`. Returns `None` if one already exists.
    pub fn insert(&mut self, key: &str) -> Option<WaitHandle> {
        if self.waiters.contains_key(key) {
            return None;
        }
        Some(self.allocate(key))
    }

    /// Subscribe to the waiter for `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<WaitHandle> {
        self.waiters.get(key).map(Waiter::subscribe)
    }

    /// Subscribe to the existing waiter for `key` or create one.
    pub fn join(&mut self, key: &str) -> Registration {
        match self.lookup(key) {
            Some(handle) => Registration {
                handle,
                is_leader: false,
            },
            None => Registration {
                handle: self.allocate(key),
                is_leader: true,
            },
        }
    }

    /// Detach the waiter for `key`. Dropping the returned value closes it.
    pub fn remove(&mut self, key: &str) -> Option<Waiter> {
        self.waiters.remove(key)
    }

    /// Detach the waiter for `key` only if it is still generation `id`.
    pub fn remove_if_current(&mut self, key: &str, id: WaiterId) -> Option<Waiter> {
        match self.waiters.get(key) {
            Some(waiter) if waiter.id == id => self.waiters.remove(key),
            _ => None,
        }
    }

    pub fn id_of(&self, key: &str) -> Option<WaiterId> {
        self.waiters.get(key).map(Waiter::id)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.waiters.contains_key(key)
    }

    /// Copy out every key with its current generation.
    pub fn snapshot(&self) -> Vec<(String, WaiterId)> {
        self.waiters
            .iter()
            .map(|(key, waiter)| (key.clone(), waiter.id))
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.waiters.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

/// Shared handle to the waiter map and the one lock guarding it.
///
/// Cloning is cheap and every clone refers to the same map, so the
/// coordination layer and the reaper always contend on a single lock.
#[derive(Debug, Clone, Default)]
pub struct WaiterRegistry {
    inner: Arc<Mutex<WaiterMap>>,
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the registry lock.
    ///
    /// Hold the guard only for map reads and writes, never across network I/O.
    pub async fn lock(&self) -> MutexGuard<'_, WaiterMap> {
        self.inner.lock().await
    }

    pub async fn insert(&self, key: &str) -> Option<WaitHandle> {
        self.lock().await.insert(key)
    }

    pub async fn lookup(&self, key: &str) -> Option<WaitHandle> {
        self.lock().await.lookup(key)
    }

    pub async fn join(&self, key: &str) -> Registration {
        self.lock().await.join(key)
    }

    pub async fn remove(&self, key: &str) -> Option<Waiter> {
        self.lock().await.remove(key)
    }

    /// Remove and close the waiter for `key`. Returns false if there was none.
    pub async fn complete(&self, key: &str) -> bool {
        let mut map = self.lock().await;
        match map.remove(key) {
            Some(waiter) => {
                waiter.close();
                true
            }
            None => false,
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.lock().await.contains(key)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.lock().await.keys()
    }

    pub async fn len(&self) -> usize {
        self.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lock().await.is_empty()
    }
}
