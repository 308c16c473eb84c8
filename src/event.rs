// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Change events delivered to watchers.
//!
//! Every mutation fans out as a stream of [`Event`]s, one per affected
//! leaf, with the path rewritten relative to each watcher's root (`/`
//! denotes the watch root itself).
//!
//! # Wire Format
//!
//! The serde representation is the stable envelope for any serializer
//! wrapping the store:
//!
//! ```text
//! { "Action": "Update", "Path": "/label/key1", "Value": "value1" }
//! { "Action": "Delete", "Path": "/label/key1", "Value": "" }
//! ```

use serde::{Deserialize, Serialize};

/// What happened to the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// A value appeared or changed.
    Update,
    /// A value or subtree was removed.
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update => write!(f, "Update"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// A single observation on a watcher's channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    pub action: Action,
    /// Path relative to the watch root.
    pub path: String,
    /// The new value for `Update`; empty for `Delete`.
    pub value: String,
}

impl Event {
    #[must_use]
    pub fn update(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action: Action::Update,
            path: path.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            action: Action::Delete,
            path: path.into(),
            value: String::new(),
        }
    }
}
