// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Aggregated view of one endpoint, consumed by every output.

use crate::normalize::HostPath;
use crate::score::{KeyedAggregator, ScalarScore};
use bytes::Bytes;

/// Knobs for the keyed aggregators of each group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOptions {
    pub threshold: f64,
    pub merge_duplicates: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            threshold: KeyedAggregator::DEFAULT_THRESHOLD,
            merge_duplicates: false,
        }
    }
}

impl AggregateOptions {
    pub(crate) fn keyed(&self) -> KeyedAggregator {
        KeyedAggregator::new()
            .with_threshold(self.threshold)
            .with_merge_duplicates(self.merge_duplicates)
    }
}

/// Result of folding every sample of one fingerprint group.
///
/// Built by [`crate::group::aggregate`]; read-only afterwards.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) method: ScalarScore<String>,
    pub(crate) status: ScalarScore<u16>,
    pub(crate) url: ScalarScore<HostPath>,
    pub(crate) params: KeyedAggregator,
    pub(crate) request_headers: KeyedAggregator,
    pub(crate) request_body: ScalarScore<Bytes>,
    pub(crate) response_headers: KeyedAggregator,
    pub(crate) response_body: ScalarScore<Bytes>,
}

impl Document {
    pub(crate) fn empty(options: &AggregateOptions) -> Self {
        Self {
            method: ScalarScore::new(),
            status: ScalarScore::new(),
            url: ScalarScore::new(),
            params: options.keyed(),
            request_headers: options.keyed(),
            request_body: ScalarScore::new(),
            response_headers: options.keyed(),
            response_body: ScalarScore::new(),
        }
    }

    pub fn method(&self) -> &ScalarScore<String> {
        &self.method
    }

    pub fn status(&self) -> &ScalarScore<u16> {
        &self.status
    }

    pub fn url(&self) -> &ScalarScore<HostPath> {
        &self.url
    }

    pub fn params(&self) -> &KeyedAggregator {
        &self.params
    }

    pub fn request_headers(&self) -> &KeyedAggregator {
        &self.request_headers
    }

    pub fn request_body(&self) -> &ScalarScore<Bytes> {
        &self.request_body
    }

    pub fn response_headers(&self) -> &KeyedAggregator {
        &self.response_headers
    }

    pub fn response_body(&self) -> &ScalarScore<Bytes> {
        &self.response_body
    }

    /// Number of entries folded into this document.
    pub fn samples(&self) -> u64 {
        self.method.len()
    }

    /// Ordering used by outputs: URL, then method, then status.
    pub fn sort_key(&self) -> (String, String, u16) {
        (
            self.url.majority().value.to_string(),
            self.method.majority().value,
            self.status.majority().value,
        )
    }
}
