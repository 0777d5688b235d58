// Telegate Testdata - Adapter stream generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Telegate Testdata
//!
//! Deterministic adapter streams for exercising the telegate gateway.
//!
//! A simulated three-axis mill pushes the updates its adapter would send:
//! execution state, spindle speed and load, axis position, coolant level,
//! controller variables, tool offsets, and fault state operations on
//! three condition points.
//!
//! ## Quick Start
//!
//! ```rust
//! use telegate::TypeCatalog;
//! use telegate_testdata::{demo_catalog, generate_dataset, GeneratorConfig, MachiningScenario};
//!
//! let config = GeneratorConfig::new().with_num_samples(60).with_seed(42);
//! let dataset = generate_dataset(&config, MachiningScenario::CoolantFault);
//! let catalog = demo_catalog(&config.device_key);
//!
//! for update in dataset.updates() {
//!     assert!(catalog.describe(update.data_item_key()).is_some());
//! }
//! ```
//!
//! ## Scenarios
//!
//! - `NormalCycle`: repeating part cycles, conditions stay NORMAL
//! - `CoolantFault`: coded coolant warning raised, then cleared after a refill
//! - `AxisOvertravel`: two coded travel faults collapsed by an uncoded fault
//! - `AdapterDisconnect`: every item goes UNAVAILABLE, then the adapter reconnects
//!
//! Datasets round-trip through JSON or JSON lines, see [`Dataset`].

pub mod dataset;
pub mod generator;
pub mod machining;
pub mod update;

// Re-exports for convenience
pub use dataset::{Dataset, DatasetError, DatasetMetadata};
pub use generator::{generate_dataset, GeneratorConfig};
pub use machining::{demo_catalog, MachiningScenario, DEVICE};
pub use update::AdapterUpdate;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
