// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic treewatch usage example.
//!
//! Demonstrates:
//! 1. Creating a store
//! 2. Point and bulk writes
//! 3. Reading leaves and materialized directories
//! 4. Watching a subtree and observing the event stream
//! 5. Displaying metrics (OTEL-compatible)
//! 6. Clean shutdown
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use std::collections::HashMap;
use std::time::Duration;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use treewatch::{Store, StoreState};

#[tokio::main]
async fn main() {
    // Install metrics recorder (captures all metrics for OTEL export)
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    // Simple logging (no filter for simplicity)
    tracing_subscriber::fmt().with_target(false).compact().init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║            treewatch: Basic Usage Example                     ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Create the store
    // ─────────────────────────────────────────────────────────────────────────
    println!("📦 Creating store...");
    let store = Store::new();
    println!("   State: {}", store.state());

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Subscribe before the data exists
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n👀 Watching /nodes/6 (node does not exist yet)...");
    let mut watcher = store.watch("/nodes/6", 100);

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Point and bulk writes
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Writing values...");
    store.put("/nodes/6", "node6");
    store.put("/nodes/6/label/key1", "value1");

    let mut bulk = HashMap::new();
    for i in 1..=3 {
        bulk.insert(format!("/clusters/{}/ip", i), format!("192.168.0.{}", i));
        bulk.insert(format!("/clusters/{}/name", i), format!("cluster-{}", i));
    }
    store.put_bulk("/", &bulk);
    println!("   └─ 2 point writes + {} bulk leaves", bulk.len());

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Read back
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📖 Reading back...");
    let ip = store.get("/clusters/1/ip").expect("leaf exists");
    println!("   └─ /clusters/1/ip → {:?}", ip.as_str().unwrap());

    let six = store.get("/nodes/6").expect("dir exists");
    println!(
        "   └─ /nodes/6 → directory ({} children; the leaf value is shadowed)",
        six.as_dir().map(|d| d.len()).unwrap_or(0)
    );

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Drain the event stream
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📨 Events observed at /nodes/6 (paths relative to the watch root):");
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(200), watcher.recv()).await
    {
        println!("   └─ {} {} {:?}", event.action, event.path, event.value);
    }

    // Deleting the only child resurrects the shadowed leaf value
    println!("\n🗑  Deleting /nodes/6/label/key1 (resurrects the leaf)...");
    store.delete("/nodes/6/label/key1");
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(200), watcher.recv()).await
    {
        println!("   └─ {} {} {:?}", event.action, event.path, event.value);
    }
    let six = store.get("/nodes/6").expect("leaf again");
    println!("   └─ /nodes/6 → {:?}", six.as_str().unwrap());

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Metrics (OTEL export format)
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Raw Metrics (OTEL export format):");
    dump_metrics(&snapshotter);

    // ─────────────────────────────────────────────────────────────────────────
    // 7. Clean shutdown
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🛑 Shutting down...");
    watcher.remove();
    store.destroy();
    assert_eq!(store.state(), StoreState::Destroyed);
    println!("   ✅ Shutdown complete! State: {}", store.state());

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");
}

/// Dump all captured metrics in OTEL-compatible format
fn dump_metrics(snapshotter: &Snapshotter) {
    let snapshot = snapshotter.snapshot();

    let mut counters: Vec<_> = vec![];
    let mut gauges: Vec<_> = vec![];
    let mut histograms: Vec<_> = vec![];

    for (composite_key, _, _, value) in snapshot.into_vec() {
        let (kind, key) = composite_key.into_parts();
        let name = key.name();
        let labels: Vec<_> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        let label_str = if labels.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", labels.join(","))
        };
        let _ = kind;

        match value {
            DebugValue::Counter(v) => counters.push((name.to_string(), label_str, v)),
            DebugValue::Gauge(v) => gauges.push((name.to_string(), label_str, v.into_inner())),
            DebugValue::Histogram(samples) => {
                let count = samples.len();
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                histograms.push((name.to_string(), label_str, count, sum));
            }
        }
    }

    counters.sort_by(|a, b| a.0.cmp(&b.0));
    gauges.sort_by(|a, b| a.0.cmp(&b.0));
    histograms.sort_by(|a, b| a.0.cmp(&b.0));

    if !counters.is_empty() {
        println!("   ┌─ Counters (cumulative)");
        for (name, labels, value) in &counters {
            println!("   │  └─ {}{} = {}", name, labels, value);
        }
    }
    if !gauges.is_empty() {
        println!("   ├─ Gauges (current value)");
        for (name, labels, value) in &gauges {
            println!("   │  └─ {}{} = {:.0}", name, labels, value);
        }
    }
    if !histograms.is_empty() {
        println!("   └─ Histograms (distributions)");
        for (name, labels, count, sum) in &histograms {
            println!("   │  └─ {}{} count={} sum={:.6}s", name, labels, count, sum);
        }
    }
    if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
}
