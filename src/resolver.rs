//! Memoizing resolver with in-flight request deduplication
//!
//! Maps a key to a single shared future. The first `resolve` for a key spawns
//! the fetch and stores the pending handle before the fetch can settle, so
//! every later caller for that key observes the same outcome without issuing
//! another request.

use crate::config::FailurePolicy;
use crate::error::{ApiError, ApiResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::runtime::Handle;

/// Settled value of a lookup, shareable between any number of callers
pub type Resolution<V> = Result<Arc<V>, Arc<ApiError>>;

/// Future returned by a fetch collaborator
pub type FetchFuture<V> = BoxFuture<'static, ApiResult<V>>;

const PENDING: u8 = 0;
const FULFILLED: u8 = 1;
const FAILED: u8 = 2;

/// Observable state of a cached lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Fulfilled,
    Failed,
}

impl EntryState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            FULFILLED => EntryState::Fulfilled,
            FAILED => EntryState::Failed,
            _ => EntryState::Pending,
        }
    }
}

/// Shared handle to a pending or settled lookup.
///
/// Cloning is cheap; all clones settle with the same `Resolution`.
pub struct LookupHandle<V> {
    inner: Shared<BoxFuture<'static, Resolution<V>>>,
    status: Arc<AtomicU8>,
}

impl<V> Clone for LookupHandle<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            status: Arc::clone(&self.status),
        }
    }
}

impl<V> LookupHandle<V> {
    /// Current state without waiting
    pub fn state(&self) -> EntryState {
        EntryState::from_raw(self.status.load(Ordering::Acquire))
    }

    /// True if both handles point at the same shared lookup
    pub fn ptr_eq(&self, other: &Self) -> bool {
        // `Shared::ptr_eq` turns false once a clone has been polled to completion
        Arc::ptr_eq(&self.status, &other.status)
    }
}

impl<V> Future for LookupHandle<V> {
    type Output = Resolution<V>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

impl<V> fmt::Debug for LookupHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Counters for a resolver instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverStats {
    /// Number of keys currently in the table
    pub entries: usize,
    /// Entries whose fetch has not settled yet
    pub pending: usize,
    pub hits: u64,
    /// Number of fetches issued
    pub misses: u64,
}

struct Entry<V> {
    id: u64,
    handle: LookupHandle<V>,
}

type Table<K, V> = Mutex<HashMap<K, Entry<V>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Generic memoizing resolver, instantiated once per kind of lookup
pub struct MemoResolver<K, V> {
    label: &'static str,
    fetch: Arc<dyn Fn(&K) -> FetchFuture<V> + Send + Sync>,
    table: Arc<Table<K, V>>,
    policy: FailurePolicy,
    runtime: Handle,
    next_id: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> MemoResolver<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    V: Send + Sync + 'static,
{
    /// Create a resolver that spawns fetches on the current Tokio runtime
    pub fn new<F>(label: &'static str, policy: FailurePolicy, fetch: F) -> ApiResult<Self>
    where
        F: Fn(&K) -> FetchFuture<V> + Send + Sync + 'static,
    {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(label, policy, runtime, fetch))
    }

    pub fn with_runtime<F>(
        label: &'static str,
        policy: FailurePolicy,
        runtime: Handle,
        fetch: F,
    ) -> Self
    where
        F: Fn(&K) -> FetchFuture<V> + Send + Sync + 'static,
    {
        Self {
            label,
            fetch: Arc::new(fetch),
            table: Arc::new(Mutex::new(HashMap::new())),
            policy,
            runtime,
            next_id: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the shared lookup for `key`, starting a fetch only on a miss.
    ///
    /// Never waits: on a miss the fetch is spawned and its handle is stored
    /// before this returns. The fetch closure runs with the table locked and
    /// must not call back into this resolver.
    pub fn resolve(&self, key: K) -> LookupHandle<V> {
        let mut table = lock(&self.table);

        if let Some(entry) = table.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "{} cache hit for {:?} ({:?})",
                self.label,
                key,
                entry.handle.state()
            );
            return entry.handle.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::info!("{} cache miss for {:?}, fetching", self.label, key);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let status = Arc::new(AtomicU8::new(PENDING));
        let fetch = (self.fetch)(&key);

        let evict = match self.policy {
            FailurePolicy::EvictFailures => Some((Arc::downgrade(&self.table), key.clone())),
            FailurePolicy::CacheFailures => None,
        };
        let task_evict = evict.clone();
        let label = self.label;
        let task_status = Arc::clone(&status);

        // Spawned so the fetch runs to completion even if every caller stops waiting
        let task = self.runtime.spawn(async move {
            let result = match AssertUnwindSafe(fetch).catch_unwind().await {
                Ok(outcome) => outcome.map(Arc::new).map_err(Arc::new),
                Err(panic) => Err(Arc::new(ApiError::TaskFailed(panic_message(&*panic)))),
            };
            match &result {
                Ok(_) => task_status.store(FULFILLED, Ordering::Release),
                Err(e) => {
                    log::warn!("{} fetch failed: {}", label, e);
                    task_status.store(FAILED, Ordering::Release);
                    if let Some((table, key)) = task_evict {
                        evict_failed(label, &table, &key, id);
                    }
                }
            }
            result
        });

        let failed_status = Arc::clone(&status);
        let inner = async move {
            task.await.unwrap_or_else(|e| {
                // Only reached if the runtime aborted the task
                log::warn!("{} fetch task failed: {}", label, e);
                failed_status.store(FAILED, Ordering::Release);
                if let Some((table, key)) = evict {
                    evict_failed(label, &table, &key, id);
                }
                Err(Arc::new(ApiError::TaskFailed(e.to_string())))
            })
        }
        .boxed()
        .shared();

        let handle = LookupHandle { inner, status };
        table.insert(
            key,
            Entry {
                id,
                handle: handle.clone(),
            },
        );
        handle
    }

    /// Drop the entry for `key` so the next `resolve` fetches again.
    /// Handles already given out still settle with the old fetch.
    pub fn invalidate(&self, key: &K) -> bool {
        let removed = lock(&self.table).remove(key).is_some();
        if removed {
            log::info!("{} invalidated {:?}", self.label, key);
        }
        removed
    }

    pub fn state(&self, key: &K) -> Option<EntryState> {
        lock(&self.table).get(key).map(|entry| entry.handle.state())
    }

    pub fn contains(&self, key: &K) -> bool {
        lock(&self.table).contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.table).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.table).is_empty()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn stats(&self) -> ResolverStats {
        let table = lock(&self.table);
        let pending = table
            .values()
            .filter(|entry| entry.handle.state() == EntryState::Pending)
            .count();

        ResolverStats {
            entries: table.len(),
            pending,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Text of a panic payload, for `ApiError::TaskFailed`
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("fetch panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("fetch panicked: {}", msg)
    } else {
        "fetch panicked".to_string()
    }
}

/// Remove a failed entry, unless it was already replaced by a newer fetch
fn evict_failed<K, V>(label: &str, table: &Weak<Table<K, V>>, key: &K, id: u64)
where
    K: Eq + Hash + fmt::Debug,
{
    let Some(table) = table.upgrade() else {
        return;
    };
    let mut table = lock(&table);
    if table.get(key).is_some_and(|entry| entry.id == id) {
        table.remove(key);
        log::debug!("{} evicted failed entry for {:?}", label, key);
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
