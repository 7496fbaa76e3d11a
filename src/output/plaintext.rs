// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Flat text listing of every endpoint.

use super::{join_values, Renderer};
use crate::document::Document;
use crate::score::KeyedAggregator;
use std::io::{self, Write};

/// One block per document:
///
/// ```text
/// GET 200 - /hello
/// - Parameters:
///  ・ possible 2 (optional)
/// - Request Headers:
///  ・ Accept-Encoding gzip
/// - Response Headers:
///  ・ Content-Type application/json
/// - Response Body:
///
///   {"hello":"world"}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Plaintext;

impl Renderer for Plaintext {
    fn name(&self) -> &'static str {
        "plaintext"
    }

    fn render(&self, docs: &[&Document], w: &mut dyn Write) -> io::Result<()> {
        for doc in docs {
            writeln!(w, "{} {} - {}", doc.method(), doc.status(), doc.url())?;

            writeln!(w, "- Parameters:")?;
            write_values(w, doc.params())?;

            writeln!(w, "- Request Headers:")?;
            write_values(w, doc.request_headers())?;

            let body = doc.request_body().majority().value;
            if !body.is_empty() {
                writeln!(w, "- Request Body:")?;
                write!(w, "\n  {}\n\n", String::from_utf8_lossy(&body))?;
            }

            writeln!(w, "- Response Headers:")?;
            write_values(w, doc.response_headers())?;

            let body = doc.response_body().majority().value;
            if !body.is_empty() {
                writeln!(w, "- Response Body:")?;
                write!(w, "\n  {}\n", String::from_utf8_lossy(&body))?;
            }
        }
        Ok(())
    }
}

// Canonical rows first, then each variant bucket; names share one column.
fn write_values(w: &mut dyn Write, agg: &KeyedAggregator) -> io::Result<()> {
    let mut rows: Vec<(String, String)> = agg
        .canonical()
        .into_iter()
        .map(|(name, values)| (name, join_values(&values)))
        .collect();
    for bucket in agg.variants() {
        rows.extend(
            bucket
                .values
                .into_iter()
                .map(|(name, values)| (name, format!("{} (optional)", join_values(&values)))),
        );
    }

    let width = rows
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (name, value) in rows {
        writeln!(w, " ・ {:<width$} {}", name, value, width = width)?;
    }
    Ok(())
}
