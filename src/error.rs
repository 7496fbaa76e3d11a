// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Error types for configuration and output rendering.

use std::fmt;
use thiserror::Error;

/// Problems found while reading configuration or an output descriptor.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no valid output found in '{0}'")]
    InvalidDestination(String),

    #[error("aggregation threshold must be within (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("invalid listen address '{value}': {source}")]
    InvalidListen {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// One output that failed during a render pass.
#[derive(Error, Debug)]
#[error("output '{output}' failed: {source}")]
pub struct OutputError {
    pub output: String,
    #[source]
    pub source: std::io::Error,
}

/// Every output failure of one render pass.
#[derive(Debug)]
pub struct OutputErrors(pub Vec<OutputError>);

impl OutputErrors {
    pub fn errors(&self) -> &[OutputError] {
        &self.0
    }
}

impl fmt::Display for OutputErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} output(s) failed", self.0.len())?;
        for e in &self.0 {
            write!(f, "; {}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for OutputErrors {}
