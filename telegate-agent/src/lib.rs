// Telegate Agent - Ingestion and snapshot facade
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Telegate Agent - Ingestion and snapshot facade
//!
//! This crate ties the telegate core together behind one thread-safe
//! [`Agent`]: adapters push observations and fault state operations in,
//! clients read current and sample documents out.
//!
//! ## Features
//!
//! - **Catalog validation**: unknown items and device mismatches are rejected
//!   with a typed error before they reach the buffer
//! - **Change filtering**: unchanged values and exact resends are dropped
//! - **Condition routing**: one fault state aggregator per condition point
//! - **Windowed reads**: headers captured with the data, poll-ready
//!   `end_sequence`
//! - **Injected hooks and counters**: no global state
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use telegate::{DataItemDescriptor, StaticCatalog, ValueSet};
//! use telegate_agent::{Agent, AgentConfig, AgentHooks};
//!
//! let catalog = StaticCatalog::new()
//!     .with_data_item(DataItemDescriptor::sample("spindle_speed", "mill", "spindle"));
//!
//! let hooks = AgentHooks::new().on_buffered(|o| println!("#{} {}", o.sequence(), o.key()));
//! let agent = Agent::new(AgentConfig::default(), Arc::new(catalog))
//!     .unwrap()
//!     .with_hooks(hooks);
//!
//! agent.add_observation("mill", "spindle_speed", ValueSet::result("1200"), 1_000).unwrap();
//! agent.add_observation("mill", "spindle_speed", ValueSet::result("1200"), 1_100).unwrap();
//! agent.add_observation("mill", "spindle_speed", ValueSet::result("1250"), 1_200).unwrap();
//!
//! let sample = agent.get_sample(Some("mill"), 1, 100).unwrap();
//! assert_eq!(sample.observation_count(), 2);
//! assert_eq!(sample.end_sequence, 3);
//! println!("{}", agent.metrics().report());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Agent                                                       │
//! │                                                              │
//! │  add_observation ──► catalog ──► change filter ──┐           │
//! │                                                  ▼           │
//! │  add_condition ──► FaultStateAggregator ──► SequencedBuffer  │
//! │                    (per condition point)          │          │
//! │                                                   ▼          │
//! │  get_current / get_sample ◄──── StreamAssembler ◄─┘          │
//! │                                                              │
//! │  AgentHooks, AgentMetrics                                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod agent;
mod config;
mod document;
mod error;
mod hooks;
mod metrics;

// Public API
pub use agent::{Agent, IngestOutcome};
pub use config::{AgentConfig, MAX_BUFFER_EXPONENT};
pub use document::{DocumentHeader, StreamsDocument};
pub use error::{AgentError, Result};
pub use hooks::{AgentHooks, FilterReason};
pub use metrics::{AgentMetrics, MetricsSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
