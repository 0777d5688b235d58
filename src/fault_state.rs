//! Condition aggregation
//!
//! A condition point reports qualitative health rather than a scalar. Its
//! state is the ordered set of [`FaultStateEntry`] values currently
//! active, at most one per native code, with uncoded entries occupying a
//! single slot.
//!
//! Producers mutate that set through [`FaultStateOp`]s:
//!
//! - `Set*` replaces the whole set with exactly one entry.
//! - `Add*` inserts or replaces the entry with the same native code. An
//!   uncoded WARNING or FAULT collapses the set to itself.
//! - `Clear` removes one code, or everything.
//!
//! The [`FaultStateAggregator`] owns the set as an immutable
//! [`FaultStateSnapshot`] behind a narrow mutex. Writers build the next
//! snapshot (digests included) outside the lock and swap it in only if
//! nobody else swapped first, so readers always see a whole snapshot.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::change_id::{self, ChangeId, ChangeIds};
use crate::value_set::{keys, ValueSet};

/// Level of a fault state entry, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum FaultLevel {
    /// No data available for the point
    Unavailable,
    /// Operating normally
    Normal,
    /// Needs attention
    Warning,
    /// Failed; intervention required
    Fault,
}

impl FaultLevel {
    /// Document name of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "UNAVAILABLE",
            Self::Normal => "NORMAL",
            Self::Warning => "WARNING",
            Self::Fault => "FAULT",
        }
    }

    /// WARNING or FAULT
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Warning | Self::Fault)
    }
}

impl fmt::Display for FaultLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of an out-of-range condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Qualifier {
    /// No qualifier reported
    #[default]
    NotSpecified,
    /// Value below range
    Low,
    /// Value above range
    High,
}

impl Qualifier {
    /// Document name, `None` when not specified
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::NotSpecified => None,
            Self::Low => Some("LOW"),
            Self::High => Some("HIGH"),
        }
    }
}

/// Descriptive fields of a fault report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FaultReport {
    /// Native diagnostic code; empty is treated as absent
    pub native_code: Option<String>,
    /// Native severity
    pub native_severity: Option<String>,
    /// LOW / HIGH qualifier
    pub qualifier: Qualifier,
    /// Free-form message
    pub message: Option<String>,
}

impl FaultReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a report carrying only a native code
    pub fn coded(native_code: impl Into<String>) -> Self {
        Self::new().with_native_code(native_code)
    }

    /// Create a report carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self::new().with_message(message)
    }

    /// Set the native code
    pub fn with_native_code(mut self, native_code: impl Into<String>) -> Self {
        self.native_code = Some(native_code.into());
        self
    }

    /// Set the native severity
    pub fn with_native_severity(mut self, severity: impl Into<String>) -> Self {
        self.native_severity = Some(severity.into());
        self
    }

    /// Set the qualifier
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// One qualitative health report
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FaultStateEntry {
    level: FaultLevel,
    native_code: Option<String>,
    native_severity: Option<String>,
    qualifier: Qualifier,
    message: Option<String>,
    timestamp: i64,
    device_key: String,
    data_item_key: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    ids: ChangeIds,
}

impl FaultStateEntry {
    fn new(
        level: FaultLevel,
        report: FaultReport,
        timestamp: i64,
        device_key: &str,
        data_item_key: &str,
    ) -> Self {
        let FaultReport {
            native_code,
            native_severity,
            qualifier,
            message,
        } = report;

        let mut entry = Self {
            level,
            native_code: native_code.filter(|c| !c.is_empty()),
            native_severity: native_severity.filter(|s| !s.is_empty()),
            qualifier,
            message: message.filter(|m| !m.is_empty()),
            timestamp,
            device_key: device_key.to_string(),
            data_item_key: data_item_key.to_string(),
            ids: ChangeIds::default(),
        };
        entry.ids = ChangeIds::compute(
            Some(device_key),
            entry.values().canonical().as_bytes(),
            timestamp,
        );
        entry
    }

    /// Entry level
    pub fn level(&self) -> FaultLevel {
        self.level
    }

    /// Native code, if any
    pub fn native_code(&self) -> Option<&str> {
        self.native_code.as_deref()
    }

    /// Native severity, if any
    pub fn native_severity(&self) -> Option<&str> {
        self.native_severity.as_deref()
    }

    /// Qualifier
    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    /// Message, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Report timestamp (ms since epoch)
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Owning device
    pub fn device_key(&self) -> &str {
        &self.device_key
    }

    /// Owning condition point
    pub fn data_item_key(&self) -> &str {
        &self.data_item_key
    }

    /// Digests of this entry
    pub fn change_ids(&self) -> &ChangeIds {
        &self.ids
    }

    /// The entry as a value set (level first, optional fields in order)
    pub fn values(&self) -> ValueSet {
        let mut values = ValueSet::new().with(keys::LEVEL, self.level.as_str());
        if let Some(code) = &self.native_code {
            values.insert(keys::NATIVE_CODE, code.as_str());
        }
        if let Some(severity) = &self.native_severity {
            values.insert(keys::NATIVE_SEVERITY, severity.as_str());
        }
        if let Some(qualifier) = self.qualifier.as_str() {
            values.insert(keys::QUALIFIER, qualifier);
        }
        if let Some(message) = &self.message {
            values.insert(keys::MESSAGE, message.as_str());
        }
        values
    }
}

/// A mutation of a condition point's fault states
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum FaultStateOp {
    /// Replace every entry with a single one
    Set { level: FaultLevel, report: FaultReport },
    /// Insert or replace the entry with the same native code
    Add { level: FaultLevel, report: FaultReport },
    /// Remove entries with the given code, or all entries
    Clear { native_code: Option<String> },
}

impl FaultStateOp {
    /// `SetUnavailable()`
    pub fn set_unavailable() -> Self {
        Self::Set {
            level: FaultLevel::Unavailable,
            report: FaultReport::new(),
        }
    }

    /// `SetNormal()`
    pub fn set_normal() -> Self {
        Self::Set {
            level: FaultLevel::Normal,
            report: FaultReport::new(),
        }
    }

    /// `SetWarning(...)`
    pub fn set_warning(report: FaultReport) -> Self {
        Self::Set {
            level: FaultLevel::Warning,
            report,
        }
    }

    /// `SetFault(...)`
    pub fn set_fault(report: FaultReport) -> Self {
        Self::Set {
            level: FaultLevel::Fault,
            report,
        }
    }

    /// `AddNormal(nativeCode, ...)`
    pub fn add_normal(report: FaultReport) -> Self {
        Self::Add {
            level: FaultLevel::Normal,
            report,
        }
    }

    /// `AddWarning(...)`
    pub fn add_warning(report: FaultReport) -> Self {
        Self::Add {
            level: FaultLevel::Warning,
            report,
        }
    }

    /// `AddFault(...)`
    pub fn add_fault(report: FaultReport) -> Self {
        Self::Add {
            level: FaultLevel::Fault,
            report,
        }
    }

    /// `ClearFaultStates(nativeCode)`
    pub fn clear(native_code: impl Into<String>) -> Self {
        Self::Clear {
            native_code: Some(native_code.into()),
        }
    }

    /// `ClearFaultStates()`
    pub fn clear_all() -> Self {
        Self::Clear { native_code: None }
    }
}

/// Immutable view of a condition point's entries
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FaultStateSnapshot {
    entries: Arc<Vec<FaultStateEntry>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    ids: ChangeIds,
}

impl FaultStateSnapshot {
    fn new(device_key: &str, entries: Vec<FaultStateEntry>) -> Self {
        let ids = ChangeIds {
            content: change_id::combine(Some(device_key), entries.iter().map(|e| &e.ids.content)),
            with_timestamp: change_id::combine(
                Some(device_key),
                entries.iter().map(|e| &e.ids.with_timestamp),
            ),
        };
        Self {
            entries: Arc::new(entries),
            ids,
        }
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[FaultStateEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries: the point has never been reported (or was cleared)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the given native code
    pub fn find(&self, native_code: &str) -> Option<&FaultStateEntry> {
        self.entries
            .iter()
            .find(|e| e.native_code() == Some(native_code))
    }

    /// Most severe level present
    pub fn worst_level(&self) -> Option<FaultLevel> {
        self.entries.iter().map(|e| e.level).max()
    }

    /// Latest entry timestamp
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.entries.iter().map(|e| e.timestamp).max()
    }

    /// Aggregate digests over the ordered entry digests
    pub fn change_ids(&self) -> &ChangeIds {
        &self.ids
    }

    /// Aggregate digest excluding timestamps
    pub fn change_id(&self) -> ChangeId {
        self.ids.content
    }
}

/// Result of applying a [`FaultStateOp`]
#[derive(Debug, Clone)]
pub struct FaultStateUpdate {
    /// State after the operation
    pub snapshot: Arc<FaultStateSnapshot>,
    /// Whether the aggregate content digest changed
    pub changed: bool,
}

/// Owns the fault states of one condition point
#[derive(Debug)]
pub struct FaultStateAggregator {
    device_key: String,
    data_item_key: String,
    state: Mutex<Arc<FaultStateSnapshot>>,
}

impl FaultStateAggregator {
    /// Create an unreported condition point
    pub fn new(device_key: impl Into<String>, data_item_key: impl Into<String>) -> Self {
        let device_key = device_key.into();
        let empty = FaultStateSnapshot::new(&device_key, Vec::new());
        Self {
            device_key,
            data_item_key: data_item_key.into(),
            state: Mutex::new(Arc::new(empty)),
        }
    }

    /// Owning device
    pub fn device_key(&self) -> &str {
        &self.device_key
    }

    /// Condition point
    pub fn data_item_key(&self) -> &str {
        &self.data_item_key
    }

    /// Current state
    pub fn snapshot(&self) -> Arc<FaultStateSnapshot> {
        Arc::clone(&self.state.lock())
    }

    /// Apply an operation
    pub fn apply(&self, op: &FaultStateOp, timestamp: i64) -> FaultStateUpdate {
        let candidate = match op {
            FaultStateOp::Set { level, report } | FaultStateOp::Add { level, report } => Some(
                FaultStateEntry::new(
                    *level,
                    report.clone(),
                    timestamp,
                    &self.device_key,
                    &self.data_item_key,
                ),
            ),
            FaultStateOp::Clear { .. } => None,
        };

        loop {
            let before = self.snapshot();
            let entries = match transition(before.entries(), op, candidate.as_ref()) {
                Some(entries) => entries,
                None => {
                    return FaultStateUpdate {
                        snapshot: before,
                        changed: false,
                    }
                }
            };

            let next = FaultStateSnapshot::new(&self.device_key, entries);
            if next.change_id() == before.change_id() {
                return FaultStateUpdate {
                    snapshot: before,
                    changed: false,
                };
            }

            let next = Arc::new(next);
            let mut guard = self.state.lock();
            if Arc::ptr_eq(&guard, &before) {
                *guard = Arc::clone(&next);
                return FaultStateUpdate {
                    snapshot: next,
                    changed: true,
                };
            }
            drop(guard);
            log::trace!(
                "fault state of {}/{} changed concurrently, retrying",
                self.device_key,
                self.data_item_key
            );
        }
    }

    /// Replace everything with an UNAVAILABLE entry
    pub fn set_unavailable(&self, timestamp: i64) -> FaultStateUpdate {
        self.apply(&FaultStateOp::set_unavailable(), timestamp)
    }

    /// Replace everything with an uncoded NORMAL entry
    pub fn set_normal(&self, timestamp: i64) -> FaultStateUpdate {
        self.apply(&FaultStateOp::set_normal(), timestamp)
    }

    /// Replace everything with a WARNING entry
    pub fn set_warning(&self, report: FaultReport, timestamp: i64) -> FaultStateUpdate {
        self.apply(&FaultStateOp::set_warning(report), timestamp)
    }

    /// Replace everything with a FAULT entry
    pub fn set_fault(&self, report: FaultReport, timestamp: i64) -> FaultStateUpdate {
        self.apply(&FaultStateOp::set_fault(report), timestamp)
    }

    /// Insert or replace a NORMAL entry by native code
    pub fn add_normal(&self, report: FaultReport, timestamp: i64) -> FaultStateUpdate {
        self.apply(&FaultStateOp::add_normal(report), timestamp)
    }

    /// Insert or replace a WARNING entry by native code
    pub fn add_warning(&self, report: FaultReport, timestamp: i64) -> FaultStateUpdate {
        self.apply(&FaultStateOp::add_warning(report), timestamp)
    }

    /// Insert or replace a FAULT entry by native code
    pub fn add_fault(&self, report: FaultReport, timestamp: i64) -> FaultStateUpdate {
        self.apply(&FaultStateOp::add_fault(report), timestamp)
    }

    /// Remove the entries with a native code, or all entries when `None`
    pub fn clear_fault_states(&self, native_code: Option<&str>) -> FaultStateUpdate {
        let op = FaultStateOp::Clear {
            native_code: native_code.map(str::to_string),
        };
        self.apply(&op, 0)
    }
}

/// Compute the entry list after `op`, or `None` when it is a no-op
fn transition(
    current: &[FaultStateEntry],
    op: &FaultStateOp,
    candidate: Option<&FaultStateEntry>,
) -> Option<Vec<FaultStateEntry>> {
    match (op, candidate) {
        (FaultStateOp::Set { .. }, Some(entry)) => Some(vec![entry.clone()]),
        (FaultStateOp::Add { .. }, Some(entry)) => {
            if current
                .iter()
                .any(|e| e.ids.content == entry.ids.content)
            {
                return None;
            }

            if entry.native_code.is_none() && entry.level.is_active() {
                if !current.is_empty() {
                    log::debug!(
                        "uncoded {} on {}/{} collapses {} entries",
                        entry.level,
                        entry.device_key,
                        entry.data_item_key,
                        current.len()
                    );
                }
                return Some(vec![entry.clone()]);
            }

            let mut next = current.to_vec();
            match next.iter_mut().find(|e| e.native_code == entry.native_code) {
                Some(slot) => *slot = entry.clone(),
                None => next.push(entry.clone()),
            }
            Some(next)
        }
        (FaultStateOp::Clear { native_code: None }, _) => {
            if current.is_empty() {
                None
            } else {
                Some(Vec::new())
            }
        }
        (FaultStateOp::Clear { native_code: Some(code) }, _) => {
            let next: Vec<_> = current
                .iter()
                .filter(|e| e.native_code() != Some(code.as_str()))
                .cloned()
                .collect();
            if next.len() == current.len() {
                None
            } else {
                Some(next)
            }
        }
        // Set/Add always carry a candidate
        (_, None) => None,
    }
}
