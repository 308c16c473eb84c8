//! The store facade.
//!
//! [`Store`] coordinates tree mutations with watcher notification under a
//! single store-wide reader/writer lock (the world lock). Reads take the
//! shared lock; every mutation, watcher creation and removal included,
//! takes the exclusive lock. Events are synthesized and enqueued while the
//! exclusive lock is held, which fixes a total order per watcher; actual
//! delivery happens on per-watcher dispatcher tasks that hold no locks.
//!
//! A background sweeper reclaims branches left empty by watcher removal
//! after a short delay; deletes prune eagerly inline.
//!
//! # Lifecycle
//!
//! ```text
//! Running ── destroy() ──▶ Destroyed
//! ```
//!
//! `destroy` closes every watcher's channel, releases the tree and leaves
//! the handle inert; it is idempotent.

mod api;
mod sweep;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::config::StoreConfig;
use crate::event::Action;
use crate::metrics;
use crate::path;
use crate::tree::{NodeId, NodeTree};

/// Store lifecycle state, broadcast on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Accepting reads, writes and subscriptions.
    Running,
    /// Torn down; all operations are inert.
    Destroyed,
}

impl std::fmt::Display for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Destroyed => write!(f, "Destroyed"),
        }
    }
}

pub(crate) struct StoreInner {
    /// The world lock. The tree is the sole shared mutable resource.
    pub(crate) world: RwLock<NodeTree>,
    pub(crate) config: StoreConfig,
    pub(crate) destroyed: AtomicBool,
    pub(crate) sweep_tx: mpsc::UnboundedSender<NodeId>,
    pub(crate) state_tx: watch::Sender<StoreState>,
    pub(crate) next_watcher_id: AtomicU64,
    pub(crate) watcher_count: AtomicU64,
}

/// Handle to an in-memory hierarchical key/value store with path-scoped
/// change notification.
///
/// Cloning is cheap and every clone addresses the same tree. There is no
/// ambient global state; collaborators receive a handle from
/// [`Store::new`].
///
/// Construction spawns the pruning sweeper, so it must happen inside a
/// Tokio runtime (as must [`watch`](Store::watch), which spawns the
/// per-watcher dispatcher).
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store with an explicit configuration.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        let (sweep_tx, sweep_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(StoreState::Running);
        let sweep_delay = Duration::from_millis(config.sweep_delay_ms);
        let inner = Arc::new(StoreInner {
            world: RwLock::new(NodeTree::new()),
            config,
            destroyed: AtomicBool::new(false),
            sweep_tx,
            state_tx,
            next_watcher_id: AtomicU64::new(1),
            watcher_count: AtomicU64::new(0),
        });
        sweep::spawn(Arc::downgrade(&inner), sweep_rx, sweep_delay, state_rx);
        Self { inner }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StoreState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to lifecycle transitions.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<StoreState> {
        self.inner.state_tx.subscribe()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Tear the store down: close every watcher's channel, release the
    /// tree and render all further calls inert. Idempotent.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("destroying store");
        let _ = self.inner.state_tx.send(StoreState::Destroyed);
        {
            let mut tree = self.inner.world.write();
            for watcher in tree.all_watchers() {
                watcher.mark_removed();
            }
            *tree = NodeTree::new();
        }
        self.inner.watcher_count.store(0, Ordering::Relaxed);
        metrics::set_watcher_count(0);
        metrics::set_node_count(1);
    }

    /// Structural lookup that also sees invisible watch anchors. Test
    /// probe for pruning behavior; not part of the read API.
    #[doc(hidden)]
    #[must_use]
    pub fn node_exists(&self, p: &str) -> bool {
        let norm = path::normalize(p);
        let tree = self.inner.world.read();
        tree.lookup(&path::split(&norm)).is_some()
    }

    pub(crate) fn inner(&self) -> &Arc<StoreInner> {
        &self.inner
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state())
            .field("watchers", &self.inner.watcher_count.load(Ordering::Relaxed))
            .finish()
    }
}

/// Fan one synthesized event out to every watcher on the ancestor chain,
/// deepest first. Runs under the world lock; enqueueing never blocks.
pub(crate) fn notify_event(
    tree: &NodeTree,
    from: NodeId,
    abs_path: &str,
    action: Action,
    value: &str,
) {
    metrics::record_event(action);
    let mut cur = Some(from);
    while let Some(id) = cur {
        for watcher in tree.watchers(id) {
            watcher.enqueue(abs_path, action, value);
        }
        cur = tree.parent_of(id);
    }
}
