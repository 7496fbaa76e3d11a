// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Documentation generator for HTTP APIs.
//!
//! Captured request/response pairs are grouped by endpoint, every attribute
//! is scored by how often it appears, and the result is rendered as plain
//! text or API Blueprint markdown. A recording forward proxy is provided to
//! capture traffic.

pub mod capture;
pub mod config;
pub mod document;
pub mod documenter;
pub mod entry;
pub mod error;
pub mod group;
pub mod helpers;
pub mod normalize;
pub mod output;
pub mod proxy;
pub mod score;

mod serde_helpers;

#[cfg(test)]
mod test_helpers;

pub use capture::Recorder;
pub use document::{AggregateOptions, Document};
pub use documenter::Documenter;
pub use entry::Entry;
pub use group::aggregate;
