// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! API Blueprint flavoured markdown.

use super::{join_values, Renderer};
use crate::document::Document;
use crate::score::KeyedAggregator;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

const BLOCK_INDENT: &str = "            ";

#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintOptions {
    /// Render variant parameters and headers, annotated `(optional, ...)`.
    pub include_optional: bool,
    /// Heading at the top of the document.
    pub title: String,
    /// Re-indent JSON bodies with four spaces and sorted keys.
    pub pretty_json: bool,
    /// Written below the title when set.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for BlueprintOptions {
    fn default() -> Self {
        Self {
            include_optional: true,
            title: "API".to_string(),
            pretty_json: true,
            generated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Blueprint {
    options: BlueprintOptions,
}

impl Blueprint {
    pub fn new(options: BlueprintOptions) -> Self {
        Self { options }
    }

    fn parameter_lines(&self, agg: &KeyedAggregator) -> Vec<String> {
        let mut lines: Vec<String> = agg
            .canonical()
            .iter()
            .map(|(name, values)| format!("{} (required, '{}')", name, join_values(values)))
            .collect();
        if self.options.include_optional {
            for bucket in agg.variants() {
                lines.extend(bucket.values.iter().map(|(name, values)| {
                    format!("{} (optional, '{}')", name, join_values(values))
                }));
            }
        }
        lines
    }

    fn header_lines(&self, agg: &KeyedAggregator) -> Vec<String> {
        let mut lines: Vec<String> = agg
            .canonical()
            .iter()
            .map(|(name, values)| format!("{}: {}", name, join_values(values)))
            .collect();
        if self.options.include_optional {
            for bucket in agg.variants() {
                lines.extend(
                    bucket
                        .values
                        .iter()
                        .map(|(name, values)| format!("{}: {} (optional)", name, join_values(values))),
                );
            }
        }
        lines
    }

    fn body_lines(&self, body: &Bytes) -> Vec<String> {
        if body.is_empty() {
            return Vec::new();
        }
        let text = if self.options.pretty_json {
            pretty_json(body).unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
        } else {
            String::from_utf8_lossy(body).into_owned()
        };
        text.lines().map(str::to_string).collect()
    }
}

impl Renderer for Blueprint {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn render(&self, docs: &[&Document], w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "FORMAT: 1A")?;
        writeln!(w)?;
        writeln!(w, "# {}", self.options.title)?;
        writeln!(w)?;
        if let Some(at) = self.options.generated_at {
            writeln!(w, "Generated at {}.", at.to_rfc3339())?;
            writeln!(w)?;
        }

        for doc in docs {
            writeln!(w, "# {} {}", doc.method(), doc.url().majority().value.path)?;
            writeln!(w)?;

            writeln!(w, "+ Request")?;
            write_section(w, "Parameters", &self.parameter_lines(doc.params()))?;
            write_section(w, "Headers", &self.header_lines(doc.request_headers()))?;
            write_section(w, "Body", &self.body_lines(&doc.request_body().majority().value))?;

            writeln!(w, "+ Response {}", doc.status())?;
            write_section(w, "Headers", &self.header_lines(doc.response_headers()))?;
            write_section(w, "Body", &self.body_lines(&doc.response_body().majority().value))?;
        }
        Ok(())
    }
}

fn write_section(w: &mut dyn Write, name: &str, lines: &[String]) -> io::Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    writeln!(w, "    + {}", name)?;
    writeln!(w)?;
    for line in lines {
        if line.is_empty() {
            writeln!(w)?;
        } else {
            writeln!(w, "{}{}", BLOCK_INDENT, line)?;
        }
    }
    writeln!(w)
}

// Only object and array bodies are treated as JSON; anything else, or
// anything that fails to parse, is shown verbatim.
fn pretty_json(body: &[u8]) -> Option<String> {
    let first = body.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first != b'{' && *first != b'[' {
        return None;
    }
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser).ok()?;
    String::from_utf8(out).ok()
}
