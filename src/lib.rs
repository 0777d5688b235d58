//! # telegate - telemetry gateway core
//!
//! The ingestion and snapshot layer of an industrial telemetry gateway:
//! adapters push per-point updates in, clients read current state and
//! sequenced history out.
//!
//! ## Key Features
//!
//! - **Change identifiers**: two 128-bit digests per record, with and without
//!   the timestamp, for duplicate suppression
//! - **Fault state aggregation**: lock-light, copy-on-write set of active
//!   condition entries per point
//! - **Sequenced buffer**: bounded, gap-free history with a latest-value
//!   snapshot that survives eviction
//! - **Stream assembly**: device / component / category hierarchy built on
//!   demand from a flat window
//!
//! ## Quick Start
//!
//! ```rust
//! use telegate::{
//!     DataItemDescriptor, FaultReport, FaultStateAggregator, ObservationInput,
//!     ObservationRecord, SequencedBuffer, StaticCatalog, StreamAssembler, TypeCatalog,
//! };
//!
//! let catalog = StaticCatalog::new()
//!     .with_data_item(DataItemDescriptor::event("exec", "mill", "controller"))
//!     .with_data_item(DataItemDescriptor::condition("system", "mill", "controller"));
//! let mut buffer = SequencedBuffer::new(1024);
//!
//! // Sample or event
//! let record = ObservationInput::value("mill", "exec", 1_000, "ACTIVE")
//!     .resolve(&catalog)
//!     .unwrap();
//! buffer.append(record);
//!
//! // Condition
//! let system = FaultStateAggregator::new("mill", "system");
//! let update = system.add_fault(FaultReport::coded("E42"), 1_001);
//! assert!(update.changed);
//! let descriptor = catalog.describe("system").unwrap();
//! let record = ObservationRecord::condition("mill", descriptor, update.snapshot, 1_001).unwrap();
//! buffer.append(record);
//!
//! let current = buffer.current();
//! let streams = StreamAssembler::new().assemble(&current);
//! assert_eq!(streams[0].component("controller").unwrap().len(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`value_set`]: ordered key/value payloads
//! - [`change_id`]: content digests
//! - [`catalog`]: data item type lookup
//! - [`observation`]: inputs and committed records
//! - [`fault_state`]: condition entries and their aggregator
//! - [`buffer`]: sequenced observation buffer
//! - [`streams`]: device/component projection
//! - [`time`]: RFC 3339 timestamp helpers
//!
//! ## Architecture
//!
//! ```text
//! adapter ──► ObservationInput ──resolve──► ObservationRecord ──┐
//!                                                                 ├─► SequencedBuffer ──► StreamAssembler
//! adapter ──► FaultStateOp ──► FaultStateAggregator ──snapshot──┘
//! ```

pub mod buffer;
pub mod catalog;
pub mod change_id;
pub mod error;
pub mod fault_state;
pub mod observation;
pub mod streams;
pub mod time;
pub mod value_set;

// Re-exports for convenient access
pub use buffer::{Appended, BufferHeader, BufferedObservation, SequencedBuffer, Window};
pub use catalog::{ComponentDescriptor, DataItemDescriptor, StaticCatalog, TypeCatalog};
pub use change_id::{ChangeId, ChangeIds};
pub use error::{CoreError, Result};
pub use fault_state::{
    FaultLevel, FaultReport, FaultStateAggregator, FaultStateEntry, FaultStateOp,
    FaultStateSnapshot, FaultStateUpdate, Qualifier,
};
pub use observation::{
    Category, ObservationContent, ObservationInput, ObservationRecord, PointKey, Representation,
};
pub use streams::{ComponentStream, DeviceStream, StreamAssembler};
pub use time::{format_timestamp, now_millis, parse_timestamp};
pub use value_set::{ValueSet, UNAVAILABLE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default buffer capacity (2^17 records)
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 17;
