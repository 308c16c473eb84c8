//! # treewatch
//!
//! An in-memory hierarchical key/value store with path-scoped change
//! notification.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Store Facade                          │
//! │  • get / put / put_bulk / delete / watch / destroy         │
//! │  • world lock: shared for reads, exclusive for mutations   │
//! │  • synthesizes events while applying mutations             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Node Tree                            │
//! │  • arena of nodes keyed by stable handles                  │
//! │  • leaf and directory faces on the same node               │
//! │  • shadowed values resurface when children vanish          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                   (fan-out along ancestor chain)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Watcher Registry                        │
//! │  • per-node subscriber lists                               │
//! │  • bounded queues, drop-oldest on overflow                 │
//! │  • one dispatcher task per watcher, no tree locks          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     (delayed reclamation)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Sweeper                             │
//! │  • prunes branches emptied by watcher removal              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use treewatch::Store;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Store::new();
//!
//!     store.put("/nodes/6/name", "node6");
//!
//!     // watch a subtree; event paths arrive relative to the watch root
//!     let mut watcher = store.watch("/nodes/6", 100);
//!     store.put("/nodes/6/ip", "192.168.1.1");
//!
//!     let event = watcher.recv().await.expect("event");
//!     assert_eq!(event.path, "/ip");
//!     assert_eq!(event.value, "192.168.1.1");
//!
//!     watcher.remove();
//!     store.destroy();
//! }
//! ```
//!
//! ## Semantics
//!
//! - Paths are slash-delimited and normalized: blank segments collapse,
//!   so `/test//node` addresses `/test/node`.
//! - A node can hold a leaf value and children at once; readers see the
//!   directory face while children exist, and the retained value
//!   resurfaces when the last child disappears.
//! - A watcher's buffer bounds how far its consumer may fall behind: on
//!   overflow the oldest event is dropped so writers and peer watchers
//!   never block on a slow consumer. The consumer sees the loss only as
//!   a gap in the stream.
//! - The store holds no ambient global state; everything hangs off the
//!   handle returned by [`Store::new`], which must be called inside a
//!   Tokio runtime.
//!
//! ## Modules
//!
//! - [`store`]: the [`Store`] facade and its lifecycle
//! - [`watch`]: [`Watcher`] subscriptions and event delivery
//! - [`event`]: the [`Event`] envelope
//! - [`value`]: the leaf-or-directory [`Value`] model
//! - [`path`]: path normalization helpers
//! - [`config`]: [`StoreConfig`]
//! - [`metrics`]: instrumentation via the `metrics` facade

pub mod config;
pub mod event;
pub mod metrics;
pub mod path;
pub mod store;
mod tree;
pub mod value;
pub mod watch;

pub use config::StoreConfig;
pub use event::{Action, Event};
pub use path::PathError;
pub use store::{Store, StoreState};
pub use value::Value;
pub use watch::Watcher;
