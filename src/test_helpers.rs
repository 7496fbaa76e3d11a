// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Shared test utilities to reduce duplication across test modules.

use crate::entry::Entry;
use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;

/// Create an entry with empty headers and bodies.
pub fn make_entry(method: &str, uri: &str, status: u16) -> anyhow::Result<Entry> {
    Ok(Entry::new(method, uri.parse()?, status))
}

/// Build a header map, appending repeated names.
pub fn make_headers_from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<HeaderMap> {
    let mut hm = HeaderMap::new();
    for (k, v) in pairs {
        hm.append(k.parse::<HeaderName>()?, v.parse::<HeaderValue>()?);
    }
    Ok(hm)
}
