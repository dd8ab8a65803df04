//! Request De-duplication
//!
//! Coalesces concurrent calls for the same logical request onto one in-flight
//! future. For any key at most one underlying call is running at a time, and
//! every caller that joined it observes the same value or the same error.
//!
//! Each caller holds a [`Deduped`] handle. The entry is removed when the call
//! completes (success or failure) so the next call starts fresh. If the last
//! live handle is dropped before completion, the entry is removed and the
//! underlying call is dropped with it; dropping one of several handles leaves
//! the call running for the others.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::error::ApiResult;

type SharedCall<T> = Shared<BoxFuture<'static, ApiResult<T>>>;

struct InFlight<T> {
    id: u64,
    call: SharedCall<T>,
    consumers: Arc<AtomicUsize>,
}

/// Key → in-flight call map.
pub struct RequestDeduplicator<T> {
    pending: Arc<DashMap<String, InFlight<T>>>,
    next_id: AtomicU64,
}

impl<T> Default for RequestDeduplicator<T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<T> std::fmt::Debug for RequestDeduplicator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDeduplicator")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight call for `key`, or start one with `start`.
    ///
    /// `start` is only invoked when no call for `key` is pending.
    pub fn run<F, Fut>(&self, key: impl Into<String>, start: F) -> Deduped<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let key = key.into();
        match self.pending.entry(key.clone()) {
            Entry::Occupied(entry) => {
                let in_flight = entry.get();
                let joined = in_flight.consumers.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::debug!("[Dedup] joining in-flight {} ({} consumers)", key, joined);
                Deduped {
                    call: in_flight.call.clone(),
                    key,
                    id: in_flight.id,
                    pending: Arc::clone(&self.pending),
                    done: false,
                }
            }
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let pending = Arc::clone(&self.pending);
                let cleanup_key = key.clone();
                let inner = start();
                let call = async move {
                    let result = inner.await;
                    pending.remove_if(&cleanup_key, |_, f| f.id == id);
                    result
                }
                .boxed()
                .shared();

                tracing::debug!("[Dedup] starting {}", key);
                entry.insert(InFlight {
                    id,
                    call: call.clone(),
                    consumers: Arc::new(AtomicUsize::new(1)),
                });
                Deduped {
                    call,
                    key,
                    id,
                    pending: Arc::clone(&self.pending),
                    done: false,
                }
            }
        }
    }

    /// Whether a call for `key` is currently in flight.
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Number of keys currently in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// A caller's handle on a de-duplicated call.
#[must_use = "futures do nothing unless polled"]
pub struct Deduped<T> {
    call: SharedCall<T>,
    key: String,
    id: u64,
    pending: Arc<DashMap<String, InFlight<T>>>,
    done: bool,
}

impl<T: Clone> Future for Deduped<T> {
    type Output = ApiResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.call).poll(cx) {
            Poll::Ready(result) => {
                this.done = true;
                Poll::Ready(result)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for Deduped<T> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let id = self.id;
        // Decrement under the shard lock so a concurrent join cannot observe
        // a count of zero for an entry that is about to be removed.
        let removed = self.pending.remove_if(&self.key, |_, f| {
            f.id == id && f.consumers.fetch_sub(1, Ordering::AcqRel) == 1
        });
        if removed.is_some() {
            tracing::debug!("[Dedup] last consumer left, aborting {}", self.key);
        }
    }
}
