// Telegate Agent - Ingestion and snapshot facade
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for Telegate Agent

use thiserror::Error;

/// Main error type for Agent operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Error from the telegate core
    #[error("Observation rejected: {0}")]
    Core(#[from] telegate::CoreError),

    /// Device not in the catalog
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// Data item belongs to another device
    #[error("Data item {data_item} belongs to device {expected}, not {actual}")]
    DeviceMismatch {
        data_item: String,
        expected: String,
        actual: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for Agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
