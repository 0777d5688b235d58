// Telegate Agent - Observation hooks
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Observation hooks
//!
//! Callbacks the agent invokes as observations move through it. They are
//! handed to the agent at construction; nothing is registered globally.
//! Hooks run on the producer's thread after the buffer lock is released.
//! They may read from the agent; a hook that ingests into the agent
//! recurses through the hooks again.

use std::fmt;

use telegate::{BufferedObservation, ObservationRecord};

use crate::error::AgentError;

/// Why an observation was not buffered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// Same content as the latest record of the point
    Unchanged,
    /// Same content and timestamp as the latest record of the point
    Resent,
}

type BufferedHook = Box<dyn Fn(&BufferedObservation) + Send + Sync>;
type FilteredHook = Box<dyn Fn(&ObservationRecord, FilterReason) + Send + Sync>;
type RejectedHook = Box<dyn Fn(&str, &str, &AgentError) + Send + Sync>;
type EvictedHook = Box<dyn Fn(&BufferedObservation) + Send + Sync>;

/// Optional callbacks for agent activity
#[derive(Default)]
pub struct AgentHooks {
    on_buffered: Option<BufferedHook>,
    on_filtered: Option<FilteredHook>,
    on_rejected: Option<RejectedHook>,
    on_evicted: Option<EvictedHook>,
}

impl AgentHooks {
    /// No hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with every newly buffered observation
    pub fn on_buffered(
        mut self,
        hook: impl Fn(&BufferedObservation) + Send + Sync + 'static,
    ) -> Self {
        self.on_buffered = Some(Box::new(hook));
        self
    }

    /// Called with every observation dropped by the change filter
    pub fn on_filtered(
        mut self,
        hook: impl Fn(&ObservationRecord, FilterReason) + Send + Sync + 'static,
    ) -> Self {
        self.on_filtered = Some(Box::new(hook));
        self
    }

    /// Called with the device key, data item key and error of every
    /// rejected observation
    pub fn on_rejected(
        mut self,
        hook: impl Fn(&str, &str, &AgentError) + Send + Sync + 'static,
    ) -> Self {
        self.on_rejected = Some(Box::new(hook));
        self
    }

    /// Called with every observation pushed out of the buffer window
    pub fn on_evicted(
        mut self,
        hook: impl Fn(&BufferedObservation) + Send + Sync + 'static,
    ) -> Self {
        self.on_evicted = Some(Box::new(hook));
        self
    }

    pub(crate) fn buffered(&self, observation: &BufferedObservation) {
        if let Some(hook) = &self.on_buffered {
            hook(observation);
        }
    }

    pub(crate) fn filtered(&self, record: &ObservationRecord, reason: FilterReason) {
        if let Some(hook) = &self.on_filtered {
            hook(record, reason);
        }
    }

    pub(crate) fn rejected(&self, device_key: &str, data_item_key: &str, error: &AgentError) {
        if let Some(hook) = &self.on_rejected {
            hook(device_key, data_item_key, error);
        }
    }

    pub(crate) fn evicted(&self, observation: &BufferedObservation) {
        if let Some(hook) = &self.on_evicted {
            hook(observation);
        }
    }
}

impl fmt::Debug for AgentHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHooks")
            .field("on_buffered", &self.on_buffered.is_some())
            .field("on_filtered", &self.on_filtered.is_some())
            .field("on_rejected", &self.on_rejected.is_some())
            .field("on_evicted", &self.on_evicted.is_some())
            .finish()
    }
}
