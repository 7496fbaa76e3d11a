// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Configuration loading and output descriptor parsing.

use crate::document::AggregateOptions;
use crate::error::ConfigError;
use crate::output::Destination;
use crate::score::KeyedAggregator;
use serde::Deserialize;
use std::net::SocketAddr;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Listen address, e.g. 127.0.0.1:3000
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Optional path to append captured entries as JSONL
    #[serde(default)]
    pub captures: Option<String>,

    /// Only record 2xx transactions
    #[serde(default = "default_true")]
    pub successful_only: bool,

    /// Request headers that are not forwarded upstream
    #[serde(default)]
    pub suppress_headers: Vec<String>,

    /// Output descriptor, e.g. `plaintext;markdown,file:api.md`
    #[serde(default)]
    pub outputs: Option<String>,
}

fn default_listen() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_destination() -> String {
    "stdout".to_string()
}

fn default_title() -> String {
    "API".to_string()
}

fn default_threshold() -> f64 {
    KeyedAggregator::DEFAULT_THRESHOLD
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            captures: None,
            successful_only: true,
            suppress_headers: Vec::new(),
            outputs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub merge_duplicates: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            merge_duplicates: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Plaintext,
    Markdown,
}

impl OutputKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plaintext" => Some(OutputKind::Plaintext),
            "markdown" => Some(OutputKind::Markdown),
            _ => None,
        }
    }
}

/// One `[[outputs]]` table, or one segment of an output descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputConfig {
    pub kind: OutputKind,
    #[serde(default = "default_destination")]
    pub destination: String,
    #[serde(default = "default_true")]
    pub include_optional: bool,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_true")]
    pub pretty_json: bool,
    #[serde(default)]
    pub timestamp: bool,
}

impl OutputConfig {
    pub fn new(kind: OutputKind) -> Self {
        Self {
            kind,
            destination: default_destination(),
            include_optional: true,
            title: default_title(),
            pretty_json: true,
            timestamp: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    ///
    /// ```toml
    /// [general]
    /// listen = "127.0.0.1:3000"
    /// outputs = "plaintext"
    ///
    /// [aggregation]
    /// threshold = 0.8
    ///
    /// [[outputs]]
    /// kind = "markdown"
    /// destination = "file:api.md"
    /// title = "Shop"
    /// ```
    pub async fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let s = tokio::fs::read_to_string(path.as_ref()).await?;
        Ok(Self::from_toml(&s)?)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.aggregation.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        self.listen_addr()?;
        for output in self.all_outputs()? {
            Destination::parse(&output.destination)?;
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.general
            .listen
            .parse()
            .map_err(|source| ConfigError::InvalidListen {
                value: self.general.listen.clone(),
                source,
            })
    }

    /// `[[outputs]]` tables followed by the `general.outputs` descriptor.
    pub fn all_outputs(&self) -> Result<Vec<OutputConfig>, ConfigError> {
        let mut outputs = self.outputs.clone();
        if let Some(descriptor) = &self.general.outputs {
            outputs.extend(parse_descriptor(descriptor)?);
        }
        Ok(outputs)
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            threshold: self.aggregation.threshold,
            merge_duplicates: self.aggregation.merge_duplicates,
        }
    }
}

/// Parse `kind[,destination[,style[,title]]]` segments separated by `;`.
///
/// Kinds are case-insensitive and unknown kinds are skipped. A destination
/// other than `stdout` or `file:PATH` fails the whole descriptor.
pub fn parse_descriptor(descriptor: &str) -> Result<Vec<OutputConfig>, ConfigError> {
    let mut outputs = Vec::new();
    for segment in descriptor.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let mut fields = segment.split(',').map(str::trim);
        let kind_field = fields.next().unwrap_or_default();
        let Some(kind) = OutputKind::parse(kind_field) else {
            warn!(kind = %kind_field, "skipping unknown output kind");
            continue;
        };

        let mut cfg = OutputConfig::new(kind);
        if let Some(destination) = fields.next().filter(|d| !d.is_empty()) {
            Destination::parse(destination)?;
            cfg.destination = destination.to_string();
        }
        let style = fields.next().unwrap_or_default();
        if kind == OutputKind::Markdown && style.eq_ignore_ascii_case("apiary") {
            cfg.title = fields
                .next()
                .filter(|t| !t.is_empty())
                .unwrap_or("Apiary")
                .to_string();
        }
        outputs.push(cfg);
    }
    Ok(outputs)
}
