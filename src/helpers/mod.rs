// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Helper utilities shared by the capture and aggregation layers.
//!
//! This module groups small routines for reading header and URI structures.

pub mod headers;
pub mod uri;
