//! Delayed pruning of branches orphaned by watcher removal.
//!
//! Deletes prune eagerly under the write lock. Watcher teardown instead
//! hands its anchor node to this sweeper, which waits a short interval
//! before walking upward and detaching empty nodes, so tearing down an
//! observer never contends with fast-path writes.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

use super::{StoreInner, StoreState};
use crate::metrics;
use crate::tree::NodeId;

/// Spawn the sweeper task for a store.
///
/// The task exits when the store is destroyed, when its handle count
/// drops to zero, or when the request channel closes.
pub(crate) fn spawn(
    inner: Weak<StoreInner>,
    rx: mpsc::UnboundedReceiver<NodeId>,
    delay: Duration,
    state_rx: watch::Receiver<StoreState>,
) {
    tokio::spawn(run(inner, rx, delay, state_rx));
}

async fn run(
    inner: Weak<StoreInner>,
    mut rx: mpsc::UnboundedReceiver<NodeId>,
    delay: Duration,
    mut state_rx: watch::Receiver<StoreState>,
) {
    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() || *state_rx.borrow() == StoreState::Destroyed {
                    break;
                }
            }
            request = rx.recv() => {
                let Some(node) = request else { break };
                tokio::time::sleep(delay).await;

                let Some(inner) = inner.upgrade() else { break };
                if inner.destroyed.load(std::sync::atomic::Ordering::Acquire) {
                    break;
                }

                // coalesce whatever queued up while sleeping
                let mut pending = vec![node];
                while let Ok(more) = rx.try_recv() {
                    pending.push(more);
                }

                let mut tree = inner.world.write();
                let before = tree.len();
                for node in pending {
                    tree.prune_upward(node);
                }
                let pruned = before - tree.len();
                if pruned > 0 {
                    metrics::record_pruned(pruned);
                    metrics::set_node_count(tree.len());
                    debug!(pruned, "sweeper pruned empty branches");
                }
            }
        }
    }
    trace!("sweeper task exiting");
}
