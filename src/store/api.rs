// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public store operations: `get`, `put`, `put_bulk`, `delete`, `watch`.
//!
//! All operations accept any path shape and normalize it; none of them
//! fail. Mutations plan their event list while applying the change under
//! the exclusive world lock, so each watcher sees events in the order the
//! mutations committed:
//!
//! - a new or changed leaf emits `Update`,
//! - writing below a current leaf first emits `Delete` for the leaf being
//!   shadowed, then the `Update` for the new child,
//! - deleting a subtree emits one `Delete` per visible leaf (children in
//!   lexicographic order), and when the removal uncovers a shadowed leaf
//!   value on the nearest surviving ancestor, a final `Update` announces
//!   the resurrected leaf.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use super::{notify_event, Store};
use crate::event::Action;
use crate::metrics;
use crate::path;
use crate::tree::NodeTree;
use crate::value::Value;
use crate::watch::{spawn_dispatcher, WatchShared, Watcher};

impl Store {
    /// Read the value at a path.
    ///
    /// Returns the scalar for a leaf, the recursively materialized child
    /// mapping for a directory, and `None` for an absent (or watch-only)
    /// node. The root always reads as a directory, possibly empty.
    #[tracing::instrument(skip(self), fields(path = %p))]
    #[must_use]
    pub fn get(&self, p: &str) -> Option<Value> {
        if self.is_destroyed() {
            return None;
        }
        let _timer = metrics::LatencyTimer::new("get");
        let norm = path::normalize(p);
        let tree = self.inner().world.read();
        if norm == path::ROOT {
            return Some(tree.materialize_root());
        }
        let node = tree.lookup(&path::split(&norm))?;
        tree.materialize(node)
    }

    /// Write a value at a path.
    ///
    /// A scalar becomes a leaf; a mapping is flattened recursively into
    /// leaf writes (empty keys dropped at every depth), all applied under
    /// one lock acquisition. A scalar write at `/` is a no-op, the root
    /// stays a directory.
    #[tracing::instrument(skip(self, value), fields(path = %p))]
    pub fn put(&self, p: &str, value: impl Into<Value>) {
        if self.is_destroyed() {
            return;
        }
        let _timer = metrics::LatencyTimer::new("put");
        let norm = path::normalize(p);
        let mut entries = Vec::new();
        value.into().flatten_into(&norm, &mut entries);
        entries.retain(|(leaf_path, _)| leaf_path != path::ROOT);
        if entries.is_empty() {
            return;
        }
        metrics::record_operation("put");

        let mut tree = self.inner().world.write();
        for (leaf_path, leaf_value) in &entries {
            put_leaf(&mut tree, leaf_path, leaf_value);
        }
        metrics::set_node_count(tree.len());
        debug!(leaves = entries.len(), "put applied");
    }

    /// Write a batch of leaves under a common prefix.
    ///
    /// Each key (which may itself contain slashes) is joined onto the
    /// prefix, normalized and applied as a leaf write. The whole batch
    /// runs under a single lock acquisition, in sorted path order.
    #[tracing::instrument(skip(self, values), fields(prefix = %prefix, count = values.len()))]
    pub fn put_bulk(&self, prefix: &str, values: &HashMap<String, String>) {
        if self.is_destroyed() {
            return;
        }
        let _timer = metrics::LatencyTimer::new("put_bulk");
        let base = path::normalize(prefix);
        let mut entries: Vec<(String, &str)> = values
            .iter()
            .map(|(key, value)| (path::join(&base, key), value.as_str()))
            .filter(|(leaf_path, _)| leaf_path != path::ROOT)
            .collect();
        if entries.is_empty() {
            return;
        }
        entries.sort_unstable();
        metrics::record_operation("put_bulk");

        let mut tree = self.inner().world.write();
        for (leaf_path, leaf_value) in &entries {
            put_leaf(&mut tree, leaf_path, leaf_value);
        }
        metrics::set_node_count(tree.len());
        debug!(leaves = entries.len(), "bulk put applied");
    }

    /// Remove the subtree at a path.
    ///
    /// Emits one `Delete` event per visible leaf. Deleting `/` clears all
    /// children but keeps the root. Ancestors left with no children, no
    /// value and no watchers are pruned eagerly; nodes still carrying
    /// watchers stay behind as invisible anchors.
    #[tracing::instrument(skip(self), fields(path = %p))]
    pub fn delete(&self, p: &str) {
        if self.is_destroyed() {
            return;
        }
        let _timer = metrics::LatencyTimer::new("delete");
        let norm = path::normalize(p);
        let mut tree = self.inner().world.write();

        let target = if norm == path::ROOT {
            tree.root()
        } else {
            match tree.lookup(&path::split(&norm)) {
                Some(node) => node,
                None => return,
            }
        };
        metrics::record_operation("delete");

        let mut leaves = Vec::new();
        tree.visible_leaves(target, &norm, &mut leaves);
        for (leaf_path, node, _) in &leaves {
            notify_event(&tree, *node, leaf_path, Action::Delete, "");
        }

        if target == tree.root() {
            tree.remove_subtree(target);
            metrics::set_node_count(tree.len());
            return;
        }

        let parent = tree
            .parent_of(target)
            .expect("non-root node must have a parent");
        tree.remove_subtree(target);

        if let Some(survivor) = tree.prune_upward(parent) {
            // a removal that emptied a directory resurrects its shadowed
            // leaf value, announced after the deletes
            if !leaves.is_empty() && tree.presents_as_leaf(survivor) {
                let survivor_path = tree.path_of(survivor);
                let value = tree
                    .leaf_value(survivor)
                    .expect("leaf face implies a value")
                    .to_string();
                notify_event(&tree, survivor, &survivor_path, Action::Update, &value);
            }
        }
        metrics::set_node_count(tree.len());
        debug!(leaves = leaves.len(), "delete applied");
    }

    /// Subscribe to a subtree.
    ///
    /// The node is created on demand (as a watch-only anchor invisible to
    /// [`get`](Store::get)) so events arriving later are still delivered.
    /// `buffer` bounds the event queue; zero selects the configured
    /// default. Returns immediately with a live watcher.
    #[tracing::instrument(skip(self), fields(path = %p))]
    pub fn watch(&self, p: &str, buffer: usize) -> Watcher {
        let norm = path::normalize(p);
        if self.is_destroyed() {
            return Watcher::closed(norm);
        }
        metrics::record_operation("watch");
        let requested = if buffer == 0 {
            self.inner().config.default_watch_buffer
        } else {
            buffer
        };
        let capacity = requested.max(1);
        let id = self.inner().next_watcher_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(capacity);

        let shared = {
            let mut tree = self.inner().world.write();
            // the walk creates only invisible anchors; nothing to announce
            let created = tree.find_or_create(&path::split(&norm));
            let shared = Arc::new(WatchShared::new(id, norm, created.node, capacity));
            tree.add_watcher(created.node, shared.clone());
            shared
        };
        let count = self.inner().watcher_count.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::set_watcher_count(count);
        debug!(watcher = id, capacity, "watcher attached");

        spawn_dispatcher(shared.clone(), tx);
        Watcher::attached(shared, rx, Arc::downgrade(self.inner()))
    }
}

/// Apply one leaf write and synthesize its events. Caller holds the world
/// lock; `leaf_path` is normalized and never the root.
fn put_leaf(tree: &mut NodeTree, leaf_path: &str, leaf_value: &str) {
    let created = tree.find_or_create(&path::split(leaf_path));

    // ancestors losing their leaf face read as deleted before the new
    // child is announced
    for &shadowed in &created.shadowed {
        let shadowed_path = tree.path_of(shadowed);
        notify_event(tree, shadowed, &shadowed_path, Action::Delete, "");
    }

    let target = created.node;
    let shadowed_by_children = tree.has_visible_child(target);
    tree.set_leaf(target, leaf_value.to_string());
    if !shadowed_by_children {
        notify_event(tree, target, leaf_path, Action::Update, leaf_value);
    }
}
