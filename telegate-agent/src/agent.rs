// Telegate Agent - Ingestion and snapshot facade
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! High-level Agent API
//!
//! The [`Agent`] validates adapter updates against the catalog, drops the
//! ones that carry no new information, routes condition operations
//! through a per-point [`FaultStateAggregator`] and appends everything
//! else to one [`SequencedBuffer`]. Reads project the buffer into
//! [`StreamsDocument`]s.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use telegate::{DataItemDescriptor, FaultReport, FaultStateOp, StaticCatalog, ValueSet};
//! use telegate_agent::{Agent, AgentConfig, IngestOutcome};
//!
//! let catalog = StaticCatalog::new()
//!     .with_data_item(DataItemDescriptor::event("exec", "mill", "controller"))
//!     .with_data_item(DataItemDescriptor::condition("system", "mill", "controller"));
//! let agent = Agent::new(AgentConfig::with_buffer_size(1024), Arc::new(catalog)).unwrap();
//!
//! let outcome = agent
//!     .add_observation("mill", "exec", ValueSet::result("ACTIVE"), 1_000)
//!     .unwrap();
//! assert_eq!(outcome, IngestOutcome::Buffered(1));
//!
//! agent
//!     .add_condition("mill", "system", FaultStateOp::add_fault(FaultReport::coded("E42")), 1_001)
//!     .unwrap();
//!
//! let document = agent.get_current(None).unwrap();
//! assert_eq!(document.header.next_sequence, 3);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use telegate::{
    BufferedObservation, Category, CoreError, DataItemDescriptor, FaultStateAggregator,
    FaultStateOp, FaultStateSnapshot, ObservationInput, ObservationRecord, PointKey,
    SequencedBuffer, StreamAssembler, TypeCatalog, ValueSet,
};

use crate::config::AgentConfig;
use crate::document::{DocumentHeader, StreamsDocument};
use crate::error::{AgentError, Result};
use crate::hooks::{AgentHooks, FilterReason};
use crate::metrics::AgentMetrics;

/// What happened to a submitted observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Appended with this sequence number
    Buffered(u64),
    /// Dropped: content equals the latest record of the point
    Unchanged,
    /// Dropped: content and timestamp equal the latest record of the point
    Resent,
}

impl IngestOutcome {
    /// Sequence number, if buffered
    pub fn sequence(&self) -> Option<u64> {
        match self {
            Self::Buffered(sequence) => Some(*sequence),
            _ => None,
        }
    }

    /// Check if the observation was buffered
    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::Buffered(_))
    }
}

/// What a commit did, carried out of the buffer lock for the hooks
struct Committed {
    outcome: IngestOutcome,
    filtered: Option<(ObservationRecord, FilterReason)>,
    buffered: Option<BufferedObservation>,
    evicted: Option<BufferedObservation>,
}

impl Committed {
    fn filtered(record: ObservationRecord, reason: FilterReason) -> Self {
        let outcome = match reason {
            FilterReason::Unchanged => IngestOutcome::Unchanged,
            FilterReason::Resent => IngestOutcome::Resent,
        };
        Self {
            outcome,
            filtered: Some((record, reason)),
            buffered: None,
            evicted: None,
        }
    }
}

/// Ingestion and snapshot facade over one catalog and one buffer
pub struct Agent {
    /// Agent configuration
    config: AgentConfig,
    /// Data item type lookup
    catalog: Arc<dyn TypeCatalog>,
    /// Sequenced history and latest value per point
    buffer: RwLock<SequencedBuffer>,
    /// Fault state owner per condition point
    conditions: RwLock<HashMap<PointKey, Arc<FaultStateAggregator>>>,
    /// Ingestion counters
    metrics: AgentMetrics,
    /// Injected callbacks
    hooks: AgentHooks,
    instance_id: u64,
    creation_time: DateTime<Utc>,
}

impl Agent {
    /// Create an agent over a catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: AgentConfig, catalog: Arc<dyn TypeCatalog>) -> Result<Self> {
        config.validate()?;

        let creation_time = Utc::now();
        let instance_id = config
            .instance_id
            .unwrap_or_else(|| creation_time.timestamp().max(0) as u64);

        log::info!(
            "agent {} ({}) started: buffer size {}, {} device(s)",
            config.sender,
            instance_id,
            config.buffer_size,
            catalog.devices().len()
        );

        Ok(Self {
            buffer: RwLock::new(SequencedBuffer::new(config.buffer_size)),
            conditions: RwLock::new(HashMap::new()),
            metrics: AgentMetrics::new(),
            hooks: AgentHooks::new(),
            catalog,
            config,
            instance_id,
            creation_time,
        })
    }

    /// Replace the hooks
    pub fn with_hooks(mut self, hooks: AgentHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Submit a value update
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either key is empty
    /// - The data item is not in the catalog, or belongs to another device
    /// - The data item is a condition (use [`Agent::add_condition`])
    pub fn add_observation(
        &self,
        device_key: &str,
        data_item_key: &str,
        values: ValueSet,
        timestamp: i64,
    ) -> Result<IngestOutcome> {
        self.add_input(
            ObservationInput::new(device_key, data_item_key, timestamp).with_values(values),
        )
    }

    /// Submit a prepared observation input
    ///
    /// # Errors
    ///
    /// Same as [`Agent::add_observation`].
    pub fn add_input(&self, input: ObservationInput) -> Result<IngestOutcome> {
        let device_key = input.device_key().to_string();
        let data_item_key = input.data_item_key().to_string();

        let result = self
            .describe(&device_key, &data_item_key)
            .and_then(|descriptor| {
                let discrete = descriptor.discrete;
                let record = input.resolve_with(descriptor)?;
                Ok((record, discrete))
            })
            .map(|(record, discrete)| {
                let committed = self.commit(&mut self.buffer.write(), record, discrete);
                self.notify(committed)
            });

        if let Err(err) = &result {
            self.reject(&device_key, &data_item_key, err);
        }
        result
    }

    /// Apply a fault state operation to a condition point
    ///
    /// # Errors
    ///
    /// Returns an error if either key is empty, the data item is unknown or
    /// belongs to another device, or it is not a condition.
    pub fn add_condition(
        &self,
        device_key: &str,
        data_item_key: &str,
        op: FaultStateOp,
        timestamp: i64,
    ) -> Result<IngestOutcome> {
        let result = self.apply_condition(device_key, data_item_key, &op, timestamp);
        if let Err(err) = &result {
            self.reject(device_key, data_item_key, err);
        }
        result
    }

    fn apply_condition(
        &self,
        device_key: &str,
        data_item_key: &str,
        op: &FaultStateOp,
        timestamp: i64,
    ) -> Result<IngestOutcome> {
        let descriptor = self.describe(device_key, data_item_key)?;
        if descriptor.category != Category::Condition {
            return Err(CoreError::CategoryMismatch {
                data_item: data_item_key.to_string(),
                expected: descriptor.category,
            }
            .into());
        }

        let aggregator = self.aggregator(PointKey::new(device_key, data_item_key));

        // The fault set and the buffered record of a point move together
        let committed = {
            let mut buffer = self.buffer.write();
            let update = aggregator.apply(op, timestamp);
            self.metrics.record_condition();

            let record =
                ObservationRecord::condition(device_key, descriptor, update.snapshot, timestamp)?;
            if !update.changed && self.config.filter_duplicates {
                log::debug!("condition {} unchanged", record.key());
                self.metrics.record_unchanged();
                Committed::filtered(record, FilterReason::Unchanged)
            } else {
                self.commit(&mut buffer, record, false)
            }
        };
        Ok(self.notify(committed))
    }

    /// Report every data item of a device as unavailable.
    ///
    /// Values get an `UNAVAILABLE` result; conditions get a single
    /// UNAVAILABLE entry. Returns how many observations were buffered.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is not in the catalog.
    pub fn set_device_unavailable(&self, device_key: &str, timestamp: i64) -> Result<usize> {
        if !self.catalog.has_device(device_key) {
            return Err(AgentError::UnknownDevice(device_key.to_string()));
        }

        let mut buffered = 0;
        for descriptor in self.catalog.data_items(device_key) {
            let outcome = if descriptor.category == Category::Condition {
                self.add_condition(
                    device_key,
                    &descriptor.key,
                    FaultStateOp::set_unavailable(),
                    timestamp,
                )?
            } else {
                self.add_input(ObservationInput::unavailable(
                    device_key,
                    descriptor.key.as_str(),
                    timestamp,
                ))?
            };
            if outcome.is_buffered() {
                buffered += 1;
            }
        }

        log::debug!(
            "device {} unavailable: {} observation(s) buffered",
            device_key,
            buffered
        );
        Ok(buffered)
    }

    /// Latest observation per point, optionally for one device
    ///
    /// # Errors
    ///
    /// Returns an error if the device filter names an unknown device.
    pub fn get_current(&self, device_key: Option<&str>) -> Result<StreamsDocument> {
        self.check_device(device_key)?;

        let (header, observations) = {
            let buffer = self.buffer.read();
            let header = self.header_of(&buffer);
            let observations = buffer
                .current()
                .into_iter()
                .filter(|o| matches_device(o, device_key))
                .collect::<Vec<_>>();
            (header, observations)
        };

        let end_sequence = header.next_sequence;
        Ok(self.document(header, &observations, end_sequence))
    }

    /// Latest observation per point as of sequence `at`
    ///
    /// # Errors
    ///
    /// Returns an error if the device is unknown or `at` lies outside the
    /// buffer window.
    pub fn get_current_at(&self, device_key: Option<&str>, at: u64) -> Result<StreamsDocument> {
        self.check_device(device_key)?;

        let (header, observations) = {
            let buffer = self.buffer.read();
            let header = self.header_of(&buffer);
            let observations = buffer
                .current_at(at)?
                .into_iter()
                .filter(|o| matches_device(o, device_key))
                .collect::<Vec<_>>();
            (header, observations)
        };

        Ok(self.document(header, &observations, at + 1))
    }

    /// Up to `count` observations starting at sequence `from`.
    ///
    /// `count` is clamped to the configured maximum. With a device filter
    /// the scan skips other devices' observations; `end_sequence` of the
    /// result is where the next poll should start.
    ///
    /// # Errors
    ///
    /// Returns an error if the device filter names an unknown device.
    pub fn get_sample(
        &self,
        device_key: Option<&str>,
        from: u64,
        count: usize,
    ) -> Result<StreamsDocument> {
        self.check_device(device_key)?;
        let count = count.min(self.config.max_sample_count);

        let (header, window) = {
            let buffer = self.buffer.read();
            let header = self.header_of(&buffer);
            let window = buffer.scan(from, count, |o| matches_device(o, device_key));
            (header, window)
        };

        Ok(self.document(header, &window.observations, window.end_sequence))
    }

    /// Current header
    pub fn header(&self) -> DocumentHeader {
        self.header_of(&self.buffer.read())
    }

    /// Fault states of a condition point, if it has been reported
    pub fn condition(
        &self,
        device_key: &str,
        data_item_key: &str,
    ) -> Option<Arc<FaultStateSnapshot>> {
        let key = PointKey::new(device_key, data_item_key);
        self.conditions.read().get(&key).map(|agg| agg.snapshot())
    }

    /// Ingestion counters
    pub fn metrics(&self) -> &AgentMetrics {
        &self.metrics
    }

    /// Configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Catalog
    pub fn catalog(&self) -> &dyn TypeCatalog {
        self.catalog.as_ref()
    }

    /// Instance id
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Agent start time
    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    fn describe(&self, device_key: &str, data_item_key: &str) -> Result<&DataItemDescriptor> {
        if device_key.is_empty() {
            return Err(CoreError::EmptyKey("device").into());
        }
        if data_item_key.is_empty() {
            return Err(CoreError::EmptyKey("data item").into());
        }
        let descriptor = self
            .catalog
            .describe(data_item_key)
            .ok_or_else(|| CoreError::UnknownDataItem(data_item_key.to_string()))?;
        if descriptor.device_key != device_key {
            return Err(AgentError::DeviceMismatch {
                data_item: data_item_key.to_string(),
                expected: descriptor.device_key.clone(),
                actual: device_key.to_string(),
            });
        }
        Ok(descriptor)
    }

    fn check_device(&self, device_key: Option<&str>) -> Result<()> {
        match device_key {
            Some(device) if !self.catalog.has_device(device) => {
                Err(AgentError::UnknownDevice(device.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn aggregator(&self, key: PointKey) -> Arc<FaultStateAggregator> {
        if let Some(agg) = self.conditions.read().get(&key) {
            return Arc::clone(agg);
        }
        let mut conditions = self.conditions.write();
        Arc::clone(conditions.entry(key).or_insert_with_key(|key| {
            Arc::new(FaultStateAggregator::new(
                key.device_key.as_str(),
                key.data_item_key.as_str(),
            ))
        }))
    }

    /// Filter against the latest record of the point and append.
    ///
    /// Runs under the buffer write lock; hooks fire later in [`Agent::notify`].
    fn commit(
        &self,
        buffer: &mut SequencedBuffer,
        record: ObservationRecord,
        discrete: bool,
    ) -> Committed {
        if let Some(latest) = buffer.latest(record.key()) {
            if self.config.filter_duplicates {
                if latest.change_id_with_timestamp() == record.change_id_with_timestamp() {
                    log::debug!("dropped resend of {} at {}", record.key(), record.timestamp());
                    self.metrics.record_resent();
                    return Committed::filtered(record, FilterReason::Resent);
                }
                if !discrete && latest.change_id() == record.change_id() {
                    log::debug!("dropped unchanged {} at {}", record.key(), record.timestamp());
                    self.metrics.record_unchanged();
                    return Committed::filtered(record, FilterReason::Unchanged);
                }
            }
        }

        let appended = buffer.append(record);
        self.metrics.record_buffered();
        if let Some(evicted) = &appended.evicted {
            log::debug!("evicted sequence {}", evicted.sequence());
            self.metrics.record_evicted();
        }
        Committed {
            outcome: IngestOutcome::Buffered(appended.sequence),
            filtered: None,
            buffered: buffer.get(appended.sequence).cloned(),
            evicted: appended.evicted,
        }
    }

    /// Run the hooks of a commit once the buffer lock is released
    fn notify(&self, committed: Committed) -> IngestOutcome {
        if let Some((record, reason)) = &committed.filtered {
            self.hooks.filtered(record, *reason);
        }
        if let Some(evicted) = &committed.evicted {
            self.hooks.evicted(evicted);
        }
        if let Some(observation) = &committed.buffered {
            self.hooks.buffered(observation);
        }
        committed.outcome
    }

    fn reject(&self, device_key: &str, data_item_key: &str, error: &AgentError) {
        log::warn!(
            "rejected observation {}/{}: {}",
            device_key,
            data_item_key,
            error
        );
        self.metrics.record_rejected();
        self.hooks.rejected(device_key, data_item_key, error);
    }

    fn header_of(&self, buffer: &SequencedBuffer) -> DocumentHeader {
        DocumentHeader::new(self.instance_id, &self.config.sender, buffer.header())
    }

    fn document(
        &self,
        header: DocumentHeader,
        observations: &[BufferedObservation],
        end_sequence: u64,
    ) -> StreamsDocument {
        let streams = StreamAssembler::with_catalog(self.catalog.as_ref()).assemble(observations);
        StreamsDocument {
            header,
            streams,
            end_sequence,
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("instance_id", &self.instance_id)
            .field("header", &self.buffer.read().header())
            .field("hooks", &self.hooks)
            .finish()
    }
}

fn matches_device(observation: &BufferedObservation, device_key: Option<&str>) -> bool {
    device_key.map_or(true, |device| observation.device_key() == device)
}
