// Telegate Agent - Ingestion and snapshot facade
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Read-side documents handed to the formatting layer

use chrono::{DateTime, Utc};
use serde::Serialize;
use telegate::{BufferHeader, DeviceStream};

/// Header fields of every streams document.
///
/// The sequence fields are copied from the buffer under the same read
/// lock as the observations they accompany.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHeader {
    /// Agent instance id; changes when the agent restarts
    pub instance_id: u64,
    /// Sender name
    pub sender: String,
    /// Document creation time
    pub creation_time: DateTime<Utc>,
    /// Buffer capacity
    pub buffer_size: usize,
    /// Oldest buffered sequence
    pub first_sequence: u64,
    /// Newest buffered sequence
    pub last_sequence: u64,
    /// Sequence the next observation receives
    pub next_sequence: u64,
}

impl DocumentHeader {
    pub(crate) fn new(instance_id: u64, sender: &str, buffer: BufferHeader) -> Self {
        Self {
            instance_id,
            sender: sender.to_string(),
            creation_time: Utc::now(),
            buffer_size: buffer.buffer_size,
            first_sequence: buffer.first_sequence,
            last_sequence: buffer.last_sequence,
            next_sequence: buffer.next_sequence,
        }
    }
}

/// Header plus device streams
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamsDocument {
    /// Header
    pub header: DocumentHeader,
    /// Device streams in order of first observation
    pub streams: Vec<DeviceStream>,
    /// Sequence to request next when polling
    pub end_sequence: u64,
}

impl StreamsDocument {
    /// Device stream by key
    pub fn device(&self, device_key: &str) -> Option<&DeviceStream> {
        self.streams.iter().find(|d| d.device_key() == device_key)
    }

    /// Total observations across all devices
    pub fn observation_count(&self) -> usize {
        self.streams.iter().map(DeviceStream::observation_count).sum()
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
