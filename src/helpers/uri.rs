// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Small reusable helpers for reading the parts of a captured request URI.

use hyper::Uri;
use std::collections::BTreeMap;

/// Host (and port, when present) of an absolute URI; empty for origin-form
/// request targets such as `/hello`.
pub fn host(uri: &Uri) -> &str {
    uri.authority().map(|a| a.as_str()).unwrap_or("")
}

/// Decode the query string into a multi-map ordered by key.
///
/// Repeated keys keep every value in the order they appear.
pub fn query_values(uri: &Uri) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(query) = uri.query() {
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            out.entry(k.into_owned()).or_default().push(v.into_owned());
        }
    }
    out
}
