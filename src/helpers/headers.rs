// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use hyper::HeaderMap;
use std::collections::BTreeMap;

/// Rewrite a header field-name into its canonical MIME form.
///
/// The first letter and any letter following a hyphen are upper-cased, the
/// rest lower-cased: `accept-encoding` becomes `Accept-Encoding`. Names that
/// contain characters outside the token alphabet are returned unchanged.
pub fn canonical_header_name(name: &str) -> String {
    if name.bytes().any(|b| b == b' ' || !b.is_ascii_graphic()) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Group every header of a `HeaderMap` by canonical name, keeping all values
/// in arrival order.
///
/// Values that are not visible ASCII are dropped, the same way they are
/// dropped when a capture is serialized.
pub fn header_values(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        if values.is_empty() {
            continue;
        }
        out.entry(canonical_header_name(name.as_str()))
            .or_default()
            .extend(values);
    }
    out
}
