// Telegate Testdata - Adapter updates
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Adapter update records.
//!
//! One record per line-protocol update, already parsed: either a value
//! update or a fault state operation on a condition point.

use serde::{Deserialize, Serialize};
use telegate::{FaultStateOp, ObservationInput, ValueSet};

/// A parsed adapter update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterUpdate {
    /// Sample or event values.
    Observation {
        device_key: String,
        data_item_key: String,
        timestamp: i64,
        values: ValueSet,
    },
    /// Fault state operation.
    Condition {
        device_key: String,
        data_item_key: String,
        timestamp: i64,
        op: FaultStateOp,
    },
}

impl AdapterUpdate {
    /// Create a value update.
    pub fn observation(
        device_key: &str,
        data_item_key: &str,
        timestamp: i64,
        values: ValueSet,
    ) -> Self {
        Self::Observation {
            device_key: device_key.to_string(),
            data_item_key: data_item_key.to_string(),
            timestamp,
            values,
        }
    }

    /// Create a single-result value update.
    pub fn value(device_key: &str, data_item_key: &str, timestamp: i64, result: &str) -> Self {
        Self::observation(device_key, data_item_key, timestamp, ValueSet::result(result))
    }

    /// Create a fault state update.
    pub fn condition(
        device_key: &str,
        data_item_key: &str,
        timestamp: i64,
        op: FaultStateOp,
    ) -> Self {
        Self::Condition {
            device_key: device_key.to_string(),
            data_item_key: data_item_key.to_string(),
            timestamp,
            op,
        }
    }

    /// Owning device.
    pub fn device_key(&self) -> &str {
        match self {
            Self::Observation { device_key, .. } | Self::Condition { device_key, .. } => {
                device_key
            }
        }
    }

    /// Target data item.
    pub fn data_item_key(&self) -> &str {
        match self {
            Self::Observation { data_item_key, .. } | Self::Condition { data_item_key, .. } => {
                data_item_key
            }
        }
    }

    /// Timestamp in milliseconds.
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Observation { timestamp, .. } | Self::Condition { timestamp, .. } => *timestamp,
        }
    }

    /// Check if this is a fault state operation.
    pub fn is_condition(&self) -> bool {
        matches!(self, Self::Condition { .. })
    }

    /// Convert a value update into an observation input.
    pub fn to_input(&self) -> Option<ObservationInput> {
        match self {
            Self::Observation {
                device_key,
                data_item_key,
                timestamp,
                values,
            } => Some(
                ObservationInput::new(device_key.as_str(), data_item_key.as_str(), *timestamp)
                    .with_values(values.clone()),
            ),
            Self::Condition { .. } => None,
        }
    }
}
