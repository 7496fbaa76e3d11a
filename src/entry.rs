// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Captured request/response pair that flows from capture into aggregation.

use crate::normalize::{normalize, HostPath, Normalized};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::{HeaderMap, Uri};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// One observed transaction. Bodies are fully materialized when the entry is
/// recorded and never change afterwards.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Entry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,

    pub method: String,
    #[serde(
        serialize_with = "crate::serde_helpers::serialize_uri",
        deserialize_with = "crate::serde_helpers::deserialize_uri"
    )]
    pub uri: Uri,
    pub status: u16,

    #[serde(
        default,
        serialize_with = "crate::serde_helpers::serialize_headers",
        deserialize_with = "crate::serde_helpers::deserialize_headers"
    )]
    pub request_headers: HeaderMap,
    #[serde(
        default,
        serialize_with = "crate::serde_helpers::serialize_body",
        deserialize_with = "crate::serde_helpers::deserialize_body"
    )]
    pub request_body: Bytes,

    #[serde(
        default,
        serialize_with = "crate::serde_helpers::serialize_headers",
        deserialize_with = "crate::serde_helpers::deserialize_headers"
    )]
    pub response_headers: HeaderMap,
    #[serde(
        default,
        serialize_with = "crate::serde_helpers::serialize_body",
        deserialize_with = "crate::serde_helpers::deserialize_body"
    )]
    pub response_body: Bytes,
}

impl Entry {
    /// Create an entry with empty headers and bodies.
    pub fn new(method: impl Into<String>, uri: Uri, status: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            method: method.into(),
            uri,
            status,
            request_headers: HeaderMap::new(),
            request_body: Bytes::new(),
            response_headers: HeaderMap::new(),
            response_body: Bytes::new(),
        }
    }

    pub fn with_request_headers(mut self, headers: HeaderMap) -> Self {
        self.request_headers = headers;
        self
    }

    pub fn with_request_body(mut self, body: impl Into<Bytes>) -> Self {
        self.request_body = body.into();
        self
    }

    pub fn with_response_headers(mut self, headers: HeaderMap) -> Self {
        self.response_headers = headers;
        self
    }

    pub fn with_response_body(mut self, body: impl Into<Bytes>) -> Self {
        self.response_body = body.into();
        self
    }

    pub fn host(&self) -> &str {
        crate::helpers::uri::host(&self.uri)
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> BTreeMap<String, Vec<String>> {
        crate::helpers::uri::query_values(&self.uri)
    }

    /// Whether the response carried a 2xx status.
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Host and path with marker query values replaced by their keys.
    pub fn normalize(&self) -> Normalized {
        normalize(self.host(), self.path(), &self.query())
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(&self.method, &self.normalize().host_path, self.status)
    }
}

/// Grouping key: entries sharing it are samples of the same endpoint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(method: &str, host_path: &HostPath, status: u16) -> Self {
        Self(format!("{}-{}-{}", method, host_path, status))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
