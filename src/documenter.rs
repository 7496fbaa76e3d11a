// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Ties a recorder to the outputs that document what it captured.

use crate::capture::Recorder;
use crate::document::{AggregateOptions, Document};
use crate::error::OutputErrors;
use crate::group::aggregate;
use crate::output::{write_all, Output};
use tracing::info;

pub struct Documenter {
    recorder: Recorder,
    outputs: Vec<Output>,
    options: AggregateOptions,
}

impl Documenter {
    pub fn new(recorder: Recorder, outputs: Vec<Output>) -> Self {
        Self {
            recorder,
            outputs,
            options: AggregateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AggregateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Aggregate what has been recorded so far without rendering it.
    pub fn documents(&self) -> Vec<Document> {
        aggregate(&self.recorder.snapshot(), &self.options)
    }

    /// Render everything recorded so far through every output.
    ///
    /// Recording may continue while this runs; entries recorded after the
    /// snapshot is taken show up in the next pass.
    pub fn output(&self) -> Result<(), OutputErrors> {
        let entries = self.recorder.snapshot();
        let docs = aggregate(&entries, &self.options);
        info!(
            entries = entries.len(),
            documents = docs.len(),
            outputs = self.outputs.len(),
            "rendering documentation"
        );
        write_all(&self.outputs, &docs)
    }
}
