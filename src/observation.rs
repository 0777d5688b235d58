//! Observation records
//!
//! An [`ObservationInput`] is the mutable form a producer fills in: keys,
//! timestamp and a [`ValueSet`]. Resolving it against the
//! [`TypeCatalog`] tags it with its category, representation and
//! component, computes both change identifiers once, and yields an
//! immutable [`ObservationRecord`]. Condition records are built from a
//! [`FaultStateSnapshot`] instead of a value set.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::{DataItemDescriptor, TypeCatalog};
use crate::change_id::{ChangeId, ChangeIds};
use crate::error::{CoreError, Result};
use crate::fault_state::{FaultLevel, FaultStateSnapshot};
use crate::value_set::{keys, ValueSet};

/// Observation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Category {
    /// Continuously variable measurement
    Sample,
    /// Discrete state or message
    Event,
    /// Qualitative health state
    Condition,
}

impl Category {
    /// Document name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sample => "SAMPLE",
            Self::Event => "EVENT",
            Self::Condition => "CONDITION",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a sample or event result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Representation {
    /// Single `result`
    #[default]
    Value,
    /// Key/value entries
    DataSet,
    /// Rows of key/value cells
    Table,
    /// Fixed-rate series of samples
    TimeSeries,
}

impl Representation {
    /// Document name of the representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "VALUE",
            Self::DataSet => "DATA_SET",
            Self::Table => "TABLE",
            Self::TimeSeries => "TIME_SERIES",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a monitored point
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PointKey {
    /// Owning device
    pub device_key: String,
    /// Data item within the device
    pub data_item_key: String,
}

impl PointKey {
    /// Create a point key
    pub fn new(device_key: impl Into<String>, data_item_key: impl Into<String>) -> Self {
        Self {
            device_key: device_key.into(),
            data_item_key: data_item_key.into(),
        }
    }
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device_key, self.data_item_key)
    }
}

/// A value update before catalog resolution
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ObservationInput {
    device_key: String,
    data_item_key: String,
    timestamp: i64,
    values: ValueSet,
}

impl ObservationInput {
    /// Create an input with no values
    pub fn new(
        device_key: impl Into<String>,
        data_item_key: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            device_key: device_key.into(),
            data_item_key: data_item_key.into(),
            timestamp,
            values: ValueSet::new(),
        }
    }

    /// Single `result` value
    pub fn value(
        device_key: impl Into<String>,
        data_item_key: impl Into<String>,
        timestamp: i64,
        result: impl Into<String>,
    ) -> Self {
        Self::new(device_key, data_item_key, timestamp).with_result(result)
    }

    /// Key/value data set
    pub fn data_set(
        device_key: impl Into<String>,
        data_item_key: impl Into<String>,
        timestamp: i64,
        entries: ValueSet,
    ) -> Self {
        Self::new(device_key, data_item_key, timestamp).with_values(entries)
    }

    /// Table: one entry per row, cells rendered as `{cell=value ...}`
    pub fn table<K, I>(
        device_key: impl Into<String>,
        data_item_key: impl Into<String>,
        timestamp: i64,
        rows: I,
    ) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ValueSet)>,
    {
        let values: ValueSet = rows
            .into_iter()
            .map(|(key, cells)| {
                let rendered: Vec<String> =
                    cells.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                let key: String = key.into();
                (key, format!("{{{}}}", rendered.join(" ")))
            })
            .collect();
        Self::new(device_key, data_item_key, timestamp).with_values(values)
    }

    /// Time series sampled at `sample_rate` Hz
    pub fn time_series(
        device_key: impl Into<String>,
        data_item_key: impl Into<String>,
        timestamp: i64,
        sample_rate: f64,
        samples: &[f64],
    ) -> Self {
        let rendered: Vec<String> = samples.iter().map(|s| s.to_string()).collect();
        Self::new(device_key, data_item_key, timestamp)
            .with_value(keys::COUNT, samples.len().to_string())
            .with_value(keys::SAMPLE_RATE, sample_rate.to_string())
            .with_value(keys::SAMPLES, rendered.join(" "))
    }

    /// `UNAVAILABLE` result
    pub fn unavailable(
        device_key: impl Into<String>,
        data_item_key: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self::new(device_key, data_item_key, timestamp).with_values(ValueSet::unavailable())
    }

    /// Set one value
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Set the `result` value
    pub fn with_result(self, result: impl Into<String>) -> Self {
        self.with_value(keys::RESULT, result)
    }

    /// Replace all values
    pub fn with_values(mut self, values: ValueSet) -> Self {
        self.values = values;
        self
    }

    /// Assign the owning device
    pub fn set_device_key(&mut self, device_key: impl Into<String>) {
        self.device_key = device_key.into();
    }

    /// Assign the timestamp
    pub fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }

    /// Mutable access to the values
    pub fn values_mut(&mut self) -> &mut ValueSet {
        &mut self.values
    }

    /// Owning device
    pub fn device_key(&self) -> &str {
        &self.device_key
    }

    /// Data item key
    pub fn data_item_key(&self) -> &str {
        &self.data_item_key
    }

    /// Timestamp (ms since epoch)
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Values
    pub fn values(&self) -> &ValueSet {
        &self.values
    }

    /// Digests of the current content.
    ///
    /// Computed on every call; [`ObservationInput::resolve`] computes them
    /// once for the committed record.
    pub fn change_ids(&self) -> ChangeIds {
        ChangeIds::compute(
            non_empty(&self.device_key),
            self.values.canonical().as_bytes(),
            self.timestamp,
        )
    }

    /// Resolve against the catalog and commit
    pub fn resolve(self, catalog: &dyn TypeCatalog) -> Result<ObservationRecord> {
        if self.data_item_key.is_empty() {
            return Err(CoreError::EmptyKey("data item"));
        }
        let descriptor = catalog
            .describe(&self.data_item_key)
            .ok_or_else(|| CoreError::UnknownDataItem(self.data_item_key.clone()))?;
        self.resolve_with(descriptor)
    }

    /// Resolve against a known descriptor and commit
    pub fn resolve_with(self, descriptor: &DataItemDescriptor) -> Result<ObservationRecord> {
        if self.device_key.is_empty() {
            return Err(CoreError::EmptyKey("device"));
        }
        if self.data_item_key.is_empty() {
            return Err(CoreError::EmptyKey("data item"));
        }
        if descriptor.category == Category::Condition {
            return Err(CoreError::CategoryMismatch {
                data_item: self.data_item_key,
                expected: Category::Condition,
            });
        }

        let ids = self.change_ids();
        Ok(ObservationRecord {
            key: PointKey::new(self.device_key, self.data_item_key),
            timestamp: self.timestamp,
            category: descriptor.category,
            representation: descriptor.representation,
            component_id: descriptor.component_id.clone(),
            content: ObservationContent::Values(self.values),
            ids,
        })
    }
}

/// Payload of a committed record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ObservationContent {
    /// Sample or event values
    Values(ValueSet),
    /// Condition fault states
    FaultStates(Arc<FaultStateSnapshot>),
}

/// Immutable, resolved observation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ObservationRecord {
    #[cfg_attr(feature = "serde", serde(flatten))]
    key: PointKey,
    timestamp: i64,
    category: Category,
    representation: Representation,
    component_id: String,
    content: ObservationContent,
    #[cfg_attr(feature = "serde", serde(skip))]
    ids: ChangeIds,
}

impl ObservationRecord {
    /// Build a condition record from a fault state snapshot
    pub fn condition(
        device_key: impl Into<String>,
        descriptor: &DataItemDescriptor,
        snapshot: Arc<FaultStateSnapshot>,
        timestamp: i64,
    ) -> Result<Self> {
        let device_key = device_key.into();
        if device_key.is_empty() {
            return Err(CoreError::EmptyKey("device"));
        }
        if descriptor.category != Category::Condition {
            return Err(CoreError::CategoryMismatch {
                data_item: descriptor.key.clone(),
                expected: descriptor.category,
            });
        }

        let ids = *snapshot.change_ids();
        Ok(Self {
            key: PointKey::new(device_key, descriptor.key.clone()),
            timestamp,
            category: Category::Condition,
            representation: descriptor.representation,
            component_id: descriptor.component_id.clone(),
            content: ObservationContent::FaultStates(snapshot),
            ids,
        })
    }

    /// Point identity
    pub fn key(&self) -> &PointKey {
        &self.key
    }

    /// Owning device
    pub fn device_key(&self) -> &str {
        &self.key.device_key
    }

    /// Data item key
    pub fn data_item_key(&self) -> &str {
        &self.key.data_item_key
    }

    /// Timestamp (ms since epoch)
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Category tag
    pub fn category(&self) -> Category {
        self.category
    }

    /// Representation tag
    pub fn representation(&self) -> Representation {
        self.representation
    }

    /// Owning structural element
    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    /// Payload
    pub fn content(&self) -> &ObservationContent {
        &self.content
    }

    /// Values of a sample or event
    pub fn values(&self) -> Option<&ValueSet> {
        match &self.content {
            ObservationContent::Values(values) => Some(values),
            ObservationContent::FaultStates(_) => None,
        }
    }

    /// Fault states of a condition
    pub fn fault_states(&self) -> Option<&FaultStateSnapshot> {
        match &self.content {
            ObservationContent::FaultStates(snapshot) => Some(snapshot),
            ObservationContent::Values(_) => None,
        }
    }

    /// Check if the point is reported unavailable
    pub fn is_unavailable(&self) -> bool {
        match &self.content {
            ObservationContent::Values(values) => values.is_unavailable(),
            ObservationContent::FaultStates(snapshot) => {
                !snapshot.is_empty()
                    && snapshot
                        .entries()
                        .iter()
                        .all(|e| e.level() == FaultLevel::Unavailable)
            }
        }
    }

    /// Both digests
    pub fn change_ids(&self) -> &ChangeIds {
        &self.ids
    }

    /// Digest excluding the timestamp
    pub fn change_id(&self) -> ChangeId {
        self.ids.content
    }

    /// Digest including the timestamp
    pub fn change_id_with_timestamp(&self) -> ChangeId {
        self.ids.with_timestamp
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
