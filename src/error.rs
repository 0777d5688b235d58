//! Error types for the telegate core
//!
//! Only boundary validation can fail here. Out-of-order timestamps,
//! duplicate native codes and buffer eviction are handled locally and
//! never surface as errors.

use thiserror::Error;

use crate::observation::Category;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Main error type for core operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Data item has no catalog entry
    #[error("Unknown data item: {0}")]
    UnknownDataItem(String),

    /// Content does not fit the category the catalog assigns
    #[error("Content does not fit {expected} data item {data_item}")]
    CategoryMismatch { data_item: String, expected: Category },

    /// Device or data-item key missing at resolution time
    #[error("Empty {0} key")]
    EmptyKey(&'static str),

    /// Timestamp string is not RFC 3339
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Requested sequence lies outside the buffer window
    #[error("Sequence {sequence} outside buffer window [{first}, {last}]")]
    SequenceOutOfRange { sequence: u64, first: u64, last: u64 },
}
