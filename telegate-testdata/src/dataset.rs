// Telegate Testdata - Dataset structures
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dataset structures and I/O operations.
//!
//! A `Dataset` is an ordered adapter stream. It is stored either as one
//! JSON document or as JSON lines, one update per line, with the
//! metadata on the first line.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::machining::MachiningScenario;
use crate::update::AdapterUpdate;

/// Dataset error types.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Empty dataset")]
    Empty,
}

/// Dataset metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Dataset name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Scenario the stream was generated from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<MachiningScenario>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Device key of the simulated machine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_key: Option<String>,
    /// Generation seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Tick interval in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_interval_ms: Option<i64>,
}

/// An ordered stream of adapter updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Metadata.
    #[serde(default)]
    pub metadata: DatasetMetadata,
    /// Updates in adapter order.
    pub updates: Vec<AdapterUpdate>,
}

impl Dataset {
    /// Create a dataset from updates.
    pub fn new(updates: Vec<AdapterUpdate>) -> Self {
        Self {
            metadata: DatasetMetadata::default(),
            updates,
        }
    }

    /// Append an update.
    pub fn push(&mut self, update: AdapterUpdate) {
        self.updates.push(update);
    }

    /// Get all updates.
    pub fn updates(&self) -> &[AdapterUpdate] {
        &self.updates
    }

    /// Get number of updates.
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Number of value updates.
    pub fn observation_count(&self) -> usize {
        self.updates.iter().filter(|u| !u.is_condition()).count()
    }

    /// Number of fault state operations.
    pub fn condition_count(&self) -> usize {
        self.updates.iter().filter(|u| u.is_condition()).count()
    }

    /// Get duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match (self.updates.first(), self.updates.last()) {
            (Some(first), Some(last)) => last.timestamp() - first.timestamp(),
            _ => 0,
        }
    }

    /// Updates targeting one data item.
    pub fn updates_for<'a>(
        &'a self,
        data_item_key: &'a str,
    ) -> impl Iterator<Item = &'a AdapterUpdate> {
        self.updates
            .iter()
            .filter(move |u| u.data_item_key() == data_item_key)
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: DatasetMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.metadata.name = Some(name.to_string());
        self
    }

    /// Export to a JSON lines file.
    pub fn to_jsonl(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer(&mut writer, &self.metadata)?;
        writeln!(writer)?;
        for update in &self.updates {
            serde_json::to_writer(&mut writer, update)?;
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Import from a JSON lines file.
    pub fn from_jsonl(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header = lines.next().ok_or(DatasetError::Empty)??;
        let metadata: DatasetMetadata =
            serde_json::from_str(&header).map_err(|e| DatasetError::Parse {
                line: 1,
                message: e.to_string(),
            })?;

        let mut dataset = Dataset::new(Vec::new()).with_metadata(metadata);
        for (line_num, line_result) in lines.enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let update = serde_json::from_str(&line).map_err(|e| DatasetError::Parse {
                line: line_num + 2,
                message: e.to_string(),
            })?;
            dataset.push(update);
        }

        Ok(dataset)
    }

    /// Export to JSON file.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Import from JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let dataset = serde_json::from_reader(reader)?;
        Ok(dataset)
    }
}
