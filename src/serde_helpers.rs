// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Serde helpers for the HTTP types carried by a captured `Entry`.

use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Uri};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Headers are written as `name -> [values]`; values that are not visible
/// ASCII are dropped.
pub fn serialize_headers<S>(hm: &HeaderMap, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (k, v) in hm.iter() {
        if let Ok(s) = v.to_str() {
            map.entry(k.as_str()).or_default().push(s);
        }
    }
    map.serialize(serializer)
}

pub fn deserialize_headers<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
where
    D: Deserializer<'de>,
{
    let map = BTreeMap::<String, Vec<String>>::deserialize(deserializer)?;
    let mut hm = HeaderMap::new();
    for (k, values) in map {
        let name = k
            .parse::<HeaderName>()
            .map_err(serde::de::Error::custom)?;
        for v in values {
            let val = v.parse::<HeaderValue>().map_err(serde::de::Error::custom)?;
            hm.append(name.clone(), val);
        }
    }
    Ok(hm)
}

/// Bodies are opaque bytes, written as standard base64.
pub fn serialize_body<S>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&general_purpose::STANDARD.encode(body))
}

pub fn deserialize_body<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    general_purpose::STANDARD
        .decode(s.as_bytes())
        .map(Bytes::from)
        .map_err(serde::de::Error::custom)
}

pub fn serialize_uri<S>(uri: &Uri, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(uri)
}

pub fn deserialize_uri<'de, D>(deserializer: D) -> Result<Uri, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<Uri>().map_err(serde::de::Error::custom)
}
