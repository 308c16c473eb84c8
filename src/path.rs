// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Slash-delimited path handling.
//!
//! Paths address nodes in the tree: `/nodes/6/label/key1`. The canonical
//! form has a leading `/`, no trailing `/` (except the root itself) and no
//! empty segments. `Put("/test//node", ...)` therefore lands at
//! `/test/node`, and a blank path means the root.
//!
//! Segments are arbitrary UTF-8 not containing `/`. Comparison is
//! byte-exact after normalization and case-sensitive.

use thiserror::Error;

/// The root path.
pub const ROOT: &str = "/";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path '{path}' is not under base '{base}'")]
    NotUnderBase { path: String, base: String },
}

/// Normalize a path to canonical form.
///
/// Empty segments collapse, a trailing slash is stripped, and blank input
/// normalizes to `/`.
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.split('/') {
        if !segment.is_empty() {
            out.push('/');
            out.push_str(segment);
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Split a path into its non-empty segments.
///
/// `/nodes/6/label` -> `["nodes", "6", "label"]`; the root splits to `[]`.
#[must_use]
pub fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join a child onto a base path, normalizing the result.
///
/// The child may itself carry slashes: `join("/clusters", "1/ip")` is
/// `/clusters/1/ip`.
#[must_use]
pub fn join(base: &str, child: &str) -> String {
    normalize(&format!("{}/{}", base, child))
}

/// Express `path` relative to `base`, both in canonical form.
///
/// Returns `/` when they are equal; the suffix (with leading `/`) when
/// `path` sits strictly under `base`.
pub fn relativize(path: &str, base: &str) -> Result<String, PathError> {
    if base == ROOT {
        return Ok(path.to_string());
    }
    if path == base {
        return Ok(ROOT.to_string());
    }
    match path.strip_prefix(base) {
        Some(rest) if rest.starts_with('/') => Ok(rest.to_string()),
        _ => Err(PathError::NotUnderBase {
            path: path.to_string(),
            base: base.to_string(),
        }),
    }
}
