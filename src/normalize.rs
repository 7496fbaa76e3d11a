// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Path templating from marker query parameters.
//!
//! A request such as `/users/42?:id=42` carries a hint that the `42` segment
//! is the `:id` placeholder. Normalizing rewrites the captured `host+path`
//! into `/users/:id` so that every request for that resource falls into the
//! same fingerprint group.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Query keys starting with this prefix name a path placeholder.
pub const MARKER_PREFIX: char = ':';

/// Host and (normalized) path of a request, compared as a pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostPath {
    pub host: String,
    pub path: String,
}

impl HostPath {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for HostPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.host, self.path)
    }
}

/// Outcome of normalizing one request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// The rewritten `host+path`.
    pub host_path: HostPath,
    /// Marker keys whose value was substituted into the path.
    pub substituted: BTreeSet<String>,
}

impl Normalized {
    /// Whether the query key `name` was turned into a path placeholder.
    pub fn is_promoted(&self, name: &str) -> bool {
        self.substituted.contains(name)
    }
}

/// Replace the first occurrence of every marker value inside `host+path`
/// with the marker key itself.
///
/// Markers are applied in ascending key order. Multi-valued markers are
/// matched on the concatenation of their values; a marker whose values join
/// to the empty string is ignored.
pub fn normalize(host: &str, path: &str, query: &BTreeMap<String, Vec<String>>) -> Normalized {
    let mut joined = format!("{}{}", host, path);
    let mut substituted = BTreeSet::new();

    for (key, values) in query.iter().filter(|(k, _)| k.starts_with(MARKER_PREFIX)) {
        let needle = values.concat();
        if needle.is_empty() {
            continue;
        }
        if let Some(index) = joined.find(&needle) {
            joined.replace_range(index..index + needle.len(), key);
            substituted.insert(key.clone());
        }
    }

    let host_path = match joined.strip_prefix(host) {
        Some(rest) => HostPath::new(host, rest),
        None => HostPath::new("", joined),
    };

    Normalized {
        host_path,
        substituted,
    }
}
