//! Integration tests for the store.
//!
//! Covers the user-visible contract end to end: reads and writes through
//! the facade, the leaf/directory duality, watcher event streams with
//! relative paths, and pruning of emptied branches.
//!
//! # Test Organization
//! - `store_*` - read/write semantics through the facade
//! - `watch_*` - event streams, ordering, and watcher lifecycle

use std::collections::HashMap;
use std::time::Duration;

use treewatch::{Action, Event, Store, StoreConfig, Value};

/// Sweeper interval short enough for tests to wait out.
const SWEEP_DELAY_MS: u64 = 100;

fn test_store() -> Store {
    Store::with_config(StoreConfig {
        sweep_delay_ms: SWEEP_DELAY_MS,
        ..Default::default()
    })
}

/// Read the next event, `None` if nothing arrives within a second.
async fn read_event(watcher: &mut treewatch::Watcher) -> Option<Event> {
    tokio::time::timeout(Duration::from_secs(1), watcher.recv())
        .await
        .ok()
        .flatten()
}

async fn wait_for_sweep() {
    tokio::time::sleep(Duration::from_millis(SWEEP_DELAY_MS * 5)).await;
}

fn leaf(s: &str) -> Option<Value> {
    Some(Value::Leaf(s.to_string()))
}

// =============================================================================
// Store semantics
// =============================================================================

#[tokio::test]
async fn store_basic_round_trip() {
    let store = test_store();

    assert_eq!(store.get("/foo"), None);
    store.put("/foo", "bar");
    assert_eq!(store.get("/foo"), leaf("bar"));
    store.delete("/foo");
    assert_eq!(store.get("/foo"), None);

    store.destroy();
}

#[tokio::test]
async fn store_dir_contains_written_children() {
    let store = test_store();

    store.put("/foo/foo1", "");
    let foo = store.get("/foo").expect("dir should exist");
    assert!(foo.is_dir());
    assert!(foo.as_dir().unwrap().contains_key("foo1"));

    store.destroy();
}

#[tokio::test]
async fn store_bulk_put_under_root() {
    let store = test_store();

    let mut values = HashMap::new();
    values.insert("/clusters/1/ip".to_string(), "192.168.0.1".to_string());
    values.insert("/clusters/1/name".to_string(), "cluster-1".to_string());
    store.put_bulk("/", &values);

    assert_eq!(store.get("/clusters/1/ip"), leaf("192.168.0.1"));
    assert_eq!(store.get("/clusters/1/name"), leaf("cluster-1"));

    store.destroy();
}

#[tokio::test]
async fn store_leaf_dir_duality() {
    let store = test_store();

    store.put("/n", "v");
    store.put("/n/c", "x");
    // the directory face wins while children exist
    assert!(store.get("/n").unwrap().is_dir());

    store.delete("/n/c");
    // the retained value resurfaces
    assert_eq!(store.get("/n"), leaf("v"));

    store.destroy();
}

#[tokio::test]
async fn store_auto_prunes_emptied_ancestors() {
    let store = test_store();

    store.put("/a/b/c", "x");
    store.delete("/a/b/c");
    assert_eq!(store.get("/a"), None);
    assert!(!store.node_exists("/a"));

    store.destroy();
}

#[tokio::test]
async fn store_root_always_reads_as_dir() {
    let store = test_store();

    assert_eq!(store.get("/"), Some(Value::dir()));
    store.put("/", "test");
    assert_eq!(store.get("/"), Some(Value::dir()));

    store.destroy();
}

// =============================================================================
// Watchers
// =============================================================================

#[tokio::test]
async fn watch_event_paths_are_relative_to_watch_root() {
    let store = test_store();
    let mut watcher = store.watch("/nodes/6", 100);

    store.put("/nodes/6", "node6");
    assert_eq!(read_event(&mut watcher).await, Some(Event::update("/", "node6")));

    store.delete("/nodes/6");
    assert_eq!(read_event(&mut watcher).await, Some(Event::delete("/")));

    watcher.remove();
    store.destroy();
}

/// The full shadow/resurrect dance, in order, on a watcher created before
/// the node exists.
#[tokio::test]
async fn watch_shadow_and_resurrect_sequence() {
    let store = test_store();
    let mut watcher = store.watch("/nodes/6", 100);

    store.put("/nodes/6", "node6");
    let event = read_event(&mut watcher).await.expect("update for watch root");
    assert_eq!(event, Event::update("/", "node6"));

    store.put("/nodes/6/label/key1", "value1");
    // the leaf converts to a dir: announced as deleted first
    assert_eq!(read_event(&mut watcher).await, Some(Event::delete("/")));
    assert_eq!(
        read_event(&mut watcher).await,
        Some(Event::update("/label/key1", "value1"))
    );

    store.put("/nodes/6/label/key1", "value2");
    assert_eq!(
        read_event(&mut watcher).await,
        Some(Event::update("/label/key1", "value2"))
    );

    store.delete("/nodes/6/label/key1");
    assert_eq!(read_event(&mut watcher).await, Some(Event::delete("/label/key1")));
    // children gone: the node returns to a leaf
    assert_eq!(read_event(&mut watcher).await, Some(Event::update("/", "node6")));

    watcher.remove();
    store.destroy();
}

#[tokio::test]
async fn watch_subtree_delete_fans_out_per_leaf() {
    let store = test_store();
    let mut watcher = store.watch("/nodes/6", 100);

    store.put("/nodes/6", "node6");
    assert_eq!(read_event(&mut watcher).await, Some(Event::update("/", "node6")));

    store.put("/nodes/6/name", "node6");
    assert_eq!(read_event(&mut watcher).await, Some(Event::delete("/")));
    assert_eq!(read_event(&mut watcher).await, Some(Event::update("/name", "node6")));

    store.put("/nodes/6/ip", "192.168.1.1");
    assert_eq!(
        read_event(&mut watcher).await,
        Some(Event::update("/ip", "192.168.1.1"))
    );

    store.delete("/nodes/6");
    // exactly one delete per leaf, in some order, and nothing else
    let first = read_event(&mut watcher).await.expect("first delete");
    let second = read_event(&mut watcher).await.expect("second delete");
    for event in [&first, &second] {
        assert_eq!(event.action, Action::Delete);
        assert!(event.path == "/name" || event.path == "/ip");
    }
    assert_ne!(first.path, second.path);
    assert_eq!(read_event(&mut watcher).await, None);

    // the watch anchor survives the delete, invisible to readers
    assert!(store.node_exists("/nodes/6"));
    assert_eq!(store.get("/nodes/6"), None);

    watcher.remove();
    wait_for_sweep().await;
    assert!(!store.node_exists("/nodes/6"));
    assert!(!store.node_exists("/nodes"));

    store.destroy();
}

#[tokio::test]
async fn watch_root_sees_absolute_paths() {
    let store = test_store();
    store.put("/nodes/6/name", "node6");

    let mut watcher = store.watch("/", 100);
    store.put("/nodes/6/ip", "192.168.1.1");

    assert_eq!(
        read_event(&mut watcher).await,
        Some(Event::update("/nodes/6/ip", "192.168.1.1"))
    );

    store.delete("/");
    let first = read_event(&mut watcher).await.expect("first delete");
    let second = read_event(&mut watcher).await.expect("second delete");
    for event in [&first, &second] {
        assert_eq!(event.action, Action::Delete);
        assert!(event.path == "/nodes/6/name" || event.path == "/nodes/6/ip");
    }
    assert_eq!(read_event(&mut watcher).await, None);

    watcher.remove();
    store.destroy();
}

#[tokio::test]
async fn watch_empty_root_delete_emits_nothing() {
    let store = test_store();
    let mut watcher = store.watch("/", 10);

    store.delete("/");
    assert_eq!(read_event(&mut watcher).await, None);

    watcher.remove();
    store.destroy();
}

#[tokio::test]
async fn watch_ancestor_and_descendant_watchers_both_notified() {
    let store = test_store();
    let mut at_root = store.watch("/", 100);
    let mut at_node = store.watch("/nodes/6", 100);

    store.put("/nodes/6/ip", "10.0.0.1");

    assert_eq!(
        read_event(&mut at_root).await,
        Some(Event::update("/nodes/6/ip", "10.0.0.1"))
    );
    assert_eq!(read_event(&mut at_node).await, Some(Event::update("/ip", "10.0.0.1")));

    at_root.remove();
    at_node.remove();
    store.destroy();
}

#[tokio::test]
async fn watch_sibling_mutations_are_not_delivered() {
    let store = test_store();
    let mut watcher = store.watch("/nodes/6", 100);

    store.put("/nodes/7/name", "node7");
    store.put("/other", "x");
    assert_eq!(read_event(&mut watcher).await, None);

    watcher.remove();
    store.destroy();
}

#[tokio::test]
async fn watch_remove_is_idempotent_and_closes_channel() {
    let store = test_store();
    let mut watcher = store.watch("/nodes/6", 100);

    watcher.remove();
    watcher.remove();

    store.put("/nodes/6", "late");
    assert_eq!(watcher.recv().await, None);

    store.destroy();
}

#[tokio::test]
async fn watch_events_before_remove_can_still_be_drained() {
    let store = test_store();
    let mut watcher = store.watch("/nodes/6", 100);

    store.put("/nodes/6", "node6");
    watcher.remove();

    // the enqueued event is still observable; then the channel closes
    assert_eq!(read_event(&mut watcher).await, Some(Event::update("/", "node6")));
    assert_eq!(watcher.recv().await, None);

    store.destroy();
}

#[tokio::test]
async fn watch_buffer_overflow_drops_oldest() {
    let store = test_store();
    let mut watcher = store.watch("/hot", 2);

    // no reads while the writer floods: only the tail can survive
    for i in 0..50 {
        store.put("/hot/key", format!("{}", i));
    }

    watcher.remove();
    let mut received = Vec::new();
    while let Some(event) = read_event(&mut watcher).await {
        received.push(event);
    }

    assert!(!received.is_empty());
    assert!(received.len() < 50, "expected gaps, got {} events", received.len());
    assert_eq!(received.last().unwrap().value, "49");

    store.destroy();
}
