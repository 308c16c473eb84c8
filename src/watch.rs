// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Watch subscriptions and event delivery.
//!
//! Each [`Watcher`] is anchored at one node (its watch root) and owns a
//! bounded internal queue plus a delivery channel. The store's write path
//! enqueues events under the world lock and never blocks: when the queue
//! is full the oldest event is dropped so a slow consumer can only fall
//! behind, never stall writers or peer watchers. A dedicated dispatcher
//! task drains the queue into the channel and holds no tree locks.
//!
//! Buffer exhaustion is not an error; the consumer observes it only as a
//! gap in the stream (and the `treewatch_events_dropped_total` counter).
//!
//! # Example
//!
//! ```rust,no_run
//! # use treewatch::Store;
//! # async fn example(store: &Store) {
//! let mut watcher = store.watch("/nodes/6", 100);
//! store.put("/nodes/6/ip", "192.168.1.1");
//! if let Some(event) = watcher.recv().await {
//!     // paths arrive relative to the watch root
//!     assert_eq!(event.path, "/ip");
//! }
//! watcher.remove();
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, trace};

use crate::event::{Action, Event};
use crate::metrics;
use crate::path;
use crate::store::StoreInner;
use crate::tree::NodeId;

/// State shared between the store (producer side), the dispatcher task and
/// the consumer-facing [`Watcher`] handle.
///
/// The queue is single-producer (fan-out under the world lock) and
/// single-consumer (the dispatcher), so a plain mutex around a `VecDeque`
/// is all the synchronization it needs.
#[derive(Debug)]
pub(crate) struct WatchShared {
    id: u64,
    /// Normalized path of the watch root.
    path: String,
    node: NodeId,
    capacity: usize,
    queue: Mutex<VecDeque<Event>>,
    notify: Notify,
    removed: AtomicBool,
    dropped: AtomicU64,
}

impl WatchShared {
    pub(crate) fn new(id: u64, watch_path: String, node: NodeId, capacity: usize) -> Self {
        Self {
            id,
            path: watch_path,
            node,
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            notify: Notify::new(),
            removed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn node_id(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub(crate) fn watch_path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub(crate) fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Rewrite an absolute event path relative to this watch root and
    /// enqueue it, dropping the oldest event on overflow. Called with the
    /// world lock held; must never block.
    pub(crate) fn enqueue(&self, abs_path: &str, action: Action, value: &str) {
        if self.is_removed() {
            return;
        }
        // fan-out only visits watchers on the ancestor chain, so the
        // rewrite cannot fail; skip defensively if it ever would
        let Ok(rel) = path::relativize(abs_path, &self.path) else {
            return;
        };
        let event = Event {
            action,
            path: rel,
            value: value.to_string(),
        };
        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.capacity {
                queue.pop_front();
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                metrics::record_event_dropped();
                debug!(
                    watcher = self.id,
                    path = %self.path,
                    dropped,
                    "watch buffer full, dropping oldest event"
                );
            }
            queue.push_back(event);
        }
        self.notify.notify_one();
    }

    /// Latch removal. Returns the previous state; wakes the dispatcher so
    /// it can exit and close the delivery channel.
    pub(crate) fn mark_removed(&self) -> bool {
        let was = self.removed.swap(true, Ordering::AcqRel);
        if !was {
            self.notify.notify_one();
        }
        was
    }

    fn pop(&self) -> Option<Event> {
        self.queue.lock().pop_front()
    }
}

/// Spawn the per-watcher dispatcher task.
///
/// Drains the internal queue into the delivery channel. Sending may block
/// this task when the consumer is slow, never the store's writers. The
/// task exits (closing the channel) once the watcher is removed or the
/// consumer drops its receiver.
pub(crate) fn spawn_dispatcher(shared: Arc<WatchShared>, tx: mpsc::Sender<Event>) {
    tokio::spawn(async move {
        loop {
            while let Some(event) = shared.pop() {
                if tx.send(event).await.is_err() {
                    trace!(watcher = shared.id(), "event receiver dropped, dispatcher exiting");
                    return;
                }
            }
            if shared.is_removed() {
                trace!(watcher = shared.id(), "watcher removed, dispatcher exiting");
                return;
            }
            shared.notify.notified().await;
        }
    });
}

/// A live subscription to a subtree.
///
/// Created by [`Store::watch`](crate::Store::watch). Consume events from
/// [`event_chan`](Self::event_chan) or [`recv`](Self::recv); call
/// [`remove`](Self::remove) (or just drop the watcher) to unsubscribe.
/// After removal the channel closes once buffered events are drained, and
/// the watch-root node becomes eligible for pruning.
#[derive(Debug)]
pub struct Watcher {
    shared: Arc<WatchShared>,
    rx: mpsc::Receiver<Event>,
    store: Weak<StoreInner>,
}

impl Watcher {
    pub(crate) fn attached(
        shared: Arc<WatchShared>,
        rx: mpsc::Receiver<Event>,
        store: Weak<StoreInner>,
    ) -> Self {
        Self { shared, rx, store }
    }

    /// A watcher whose channel is already closed, handed out by a
    /// destroyed store.
    pub(crate) fn closed(watch_path: String) -> Self {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let shared = Arc::new(WatchShared::new(0, watch_path, NodeId::ROOT, 1));
        shared.mark_removed();
        Self {
            shared,
            rx,
            store: Weak::new(),
        }
    }

    /// The normalized path this watcher is anchored at.
    #[must_use]
    pub fn path(&self) -> &str {
        self.shared.watch_path()
    }

    /// The delivery channel. Closed after [`remove`](Self::remove).
    pub fn event_chan(&mut self) -> &mut mpsc::Receiver<Event> {
        &mut self.rx
    }

    /// Receive the next event, `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Unsubscribe. Idempotent; the channel closes at most once.
    ///
    /// Events enqueued before removal may still be observed by draining
    /// the channel; events after removal are discarded. The watch-root
    /// node is handed to the sweeper for delayed pruning.
    pub fn remove(&self) {
        if self.shared.mark_removed() {
            return;
        }
        debug!(watcher = self.shared.id(), path = %self.shared.watch_path(), "watcher removed");
        let Some(inner) = self.store.upgrade() else {
            return;
        };
        if inner.destroyed.load(Ordering::Acquire) {
            return;
        }
        let count = inner.watcher_count.fetch_sub(1, Ordering::Relaxed) - 1;
        metrics::set_watcher_count(count);
        {
            let mut tree = inner.world.write();
            tree.remove_watcher(self.shared.node_id(), self.shared.id());
        }
        // prune on the sweeper so teardown stays off the write fast path
        let _ = inner.sweep_tx.send(self.shared.node_id());
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.remove();
    }
}
