// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Frequency scoring primitives used to fold many samples of one endpoint.
//!
//! `ScalarScore` votes on single values (method, status, URL, body);
//! `KeyedAggregator` splits named values (parameters, headers) into the
//! canonical ones present in every sample and the variant ones.

pub mod keyed;
pub mod scalar;

pub use keyed::{KeyedAggregator, PairScore, PromotedValue, Values, VariantBucket};
pub use scalar::{ScalarScore, Scored};
