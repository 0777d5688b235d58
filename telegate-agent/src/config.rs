// Telegate Agent - Ingestion and snapshot facade
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for Telegate Agent

use crate::error::{AgentError, Result};

/// Largest accepted buffer exponent (2^30 records)
pub const MAX_BUFFER_EXPONENT: u32 = 30;

/// Agent-level configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Sequenced buffer capacity (default: 2^17)
    pub buffer_size: usize,

    /// Sender name reported in document headers
    pub sender: String,

    /// Drop value updates and condition operations whose content did not
    /// change, and exact resends
    pub filter_duplicates: bool,

    /// Upper bound on the count of a sample request
    pub max_sample_count: usize,

    /// Instance id override (default: creation time in seconds)
    pub instance_id: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            buffer_size: telegate::DEFAULT_BUFFER_SIZE,
            sender: "telegate".to_string(),
            filter_duplicates: true,
            max_sample_count: 1000,
            instance_id: None,
        }
    }
}

impl AgentConfig {
    /// Create a configuration with a custom buffer size
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            ..Default::default()
        }
    }

    /// Create a configuration with a buffer of `2^exponent` records.
    ///
    /// Exponents above [`MAX_BUFFER_EXPONENT`] are rejected.
    pub fn with_buffer_exponent(exponent: u32) -> Result<Self> {
        if exponent > MAX_BUFFER_EXPONENT {
            return Err(AgentError::InvalidConfig(format!(
                "buffer exponent {} exceeds {}",
                exponent, MAX_BUFFER_EXPONENT
            )));
        }
        Ok(Self::with_buffer_size(1usize << exponent))
    }

    /// Create a configuration with a custom sender name
    pub fn with_sender(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            ..Default::default()
        }
    }

    /// Check the configuration before building an agent
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(AgentError::InvalidConfig(
                "buffer_size must be positive".to_string(),
            ));
        }
        if self.buffer_size > 1usize << MAX_BUFFER_EXPONENT {
            return Err(AgentError::InvalidConfig(format!(
                "buffer_size {} exceeds 2^{}",
                self.buffer_size, MAX_BUFFER_EXPONENT
            )));
        }
        if self.max_sample_count == 0 {
            return Err(AgentError::InvalidConfig(
                "max_sample_count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
