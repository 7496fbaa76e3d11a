// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Rendering of aggregated documents and the destinations they are written to.
//!
//! A render pass formats the whole document list into memory first and only
//! then opens the destination, so a destination that cannot be opened never
//! receives partial output. Each output fails independently.

pub mod blueprint;
pub mod plaintext;

pub use blueprint::{Blueprint, BlueprintOptions};
pub use plaintext::Plaintext;

use crate::config::{OutputConfig, OutputKind};
use crate::document::Document;
use crate::error::{ConfigError, OutputError, OutputErrors};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// Formats an ordered list of documents.
pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;

    fn render(&self, docs: &[&Document], w: &mut dyn Write) -> io::Result<()>;
}

/// In-memory sink shared between the caller and an `Output`.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    fn append(&self, bytes: &[u8]) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(bytes);
    }
}

/// Where rendered text goes.
#[derive(Clone, Debug)]
pub enum Destination {
    Stdout,
    /// Created (truncated) on every render pass.
    File(PathBuf),
    /// Appended to on every render pass.
    Buffer(SharedBuffer),
}

impl Destination {
    /// Parse `stdout` or `file:PATH`. The scheme is case-insensitive, the
    /// path is kept verbatim.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("stdout") {
            return Ok(Destination::Stdout);
        }
        match value.split_once(':') {
            Some((scheme, path)) if scheme.eq_ignore_ascii_case("file") && !path.is_empty() => {
                Ok(Destination::File(PathBuf::from(path)))
            }
            _ => Err(ConfigError::InvalidDestination(value.to_string())),
        }
    }

    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Destination::Stdout => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(bytes)?;
                lock.flush()
            }
            Destination::File(path) => {
                let mut w = BufWriter::new(File::create(path)?);
                w.write_all(bytes)?;
                w.flush()
            }
            Destination::Buffer(buffer) => {
                buffer.append(bytes);
                Ok(())
            }
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => f.write_str("stdout"),
            Destination::File(path) => write!(f, "file:{}", path.display()),
            Destination::Buffer(_) => f.write_str("buffer"),
        }
    }
}

/// A renderer bound to its destination.
pub struct Output {
    renderer: Box<dyn Renderer>,
    destination: Destination,
}

impl Output {
    pub fn new(renderer: impl Renderer + 'static, destination: Destination) -> Self {
        Self {
            renderer: Box::new(renderer),
            destination,
        }
    }

    pub fn plaintext(destination: Destination) -> Self {
        Self::new(Plaintext, destination)
    }

    pub fn blueprint(destination: Destination, options: BlueprintOptions) -> Self {
        Self::new(Blueprint::new(options), destination)
    }

    pub fn from_config(cfg: &OutputConfig) -> Result<Self, ConfigError> {
        let destination = Destination::parse(&cfg.destination)?;
        Ok(match cfg.kind {
            OutputKind::Plaintext => Self::plaintext(destination),
            OutputKind::Markdown => Self::blueprint(
                destination,
                BlueprintOptions {
                    include_optional: cfg.include_optional,
                    title: cfg.title.clone(),
                    pretty_json: cfg.pretty_json,
                    generated_at: cfg.timestamp.then(chrono::Utc::now),
                },
            ),
        })
    }

    pub fn label(&self) -> String {
        format!("{} -> {}", self.renderer.name(), self.destination)
    }

    /// Render `docs` (ordered by URL, method, status) and write them out.
    pub fn write(&self, docs: &[Document]) -> Result<(), OutputError> {
        let ordered = sorted(docs);
        let mut rendered = Vec::new();
        self.renderer
            .render(&ordered, &mut rendered)
            .and_then(|_| self.destination.write_all(&rendered))
            .map_err(|source| OutputError {
                output: self.label(),
                source,
            })?;

        info!(
            output = %self.label(),
            documents = docs.len(),
            bytes = rendered.len(),
            "wrote documentation"
        );
        Ok(())
    }
}

/// Build every configured output, failing on the first invalid one.
pub fn build_outputs(configs: &[OutputConfig]) -> Result<Vec<Output>, ConfigError> {
    configs.iter().map(Output::from_config).collect()
}

/// Run every output over the same documents. A failing output does not
/// stop the others; all failures are returned together.
pub fn write_all(outputs: &[Output], docs: &[Document]) -> Result<(), OutputErrors> {
    let mut errors = Vec::new();
    for output in outputs {
        if let Err(e) = output.write(docs) {
            error!(error = %e, "output failed");
            errors.push(e);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(OutputErrors(errors))
    }
}

/// Documents in the order outputs present them.
pub fn sorted(docs: &[Document]) -> Vec<&Document> {
    let mut ordered: Vec<&Document> = docs.iter().collect();
    ordered.sort_by_cached_key(|d| d.sort_key());
    ordered
}

/// Join multi-valued entries the way every output shows them.
pub(crate) fn join_values(values: &[String]) -> String {
    values.join(", ")
}
