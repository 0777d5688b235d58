//! Sequenced ring buffer of observations
//!
//! Every appended record gets the next sequence number. Sequences are
//! dense: the buffer always holds `[first_sequence, last_sequence]` with
//! no gaps, evicting from the front once `capacity` is reached. The most
//! recent record per point is kept separately so the current snapshot
//! survives eviction.
//!
//! The buffer itself is single-threaded; callers share it behind a
//! read/write lock (one writer appending, many readers slicing).

use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::observation::{ObservationRecord, PointKey};

/// A record together with its assigned sequence number
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BufferedObservation {
    sequence: u64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    record: Arc<ObservationRecord>,
}

impl BufferedObservation {
    /// Assigned sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Shared record
    pub fn record(&self) -> &Arc<ObservationRecord> {
        &self.record
    }
}

impl Deref for BufferedObservation {
    type Target = ObservationRecord;

    fn deref(&self) -> &ObservationRecord {
        &self.record
    }
}

/// Sequence counters at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BufferHeader {
    /// Buffer capacity
    pub buffer_size: usize,
    /// Oldest sequence held (1 when empty)
    pub first_sequence: u64,
    /// Newest sequence held (`next_sequence - 1`)
    pub last_sequence: u64,
    /// Sequence the next append receives
    pub next_sequence: u64,
}

/// Outcome of [`SequencedBuffer::append`]
#[derive(Debug, Clone)]
pub struct Appended {
    /// Sequence assigned to the new record
    pub sequence: u64,
    /// Record pushed out of the window, if the buffer was full
    pub evicted: Option<BufferedObservation>,
}

/// Result of a filtered forward scan
#[derive(Debug, Clone, Default)]
pub struct Window {
    /// Matching records in sequence order
    pub observations: Vec<BufferedObservation>,
    /// Sequence to resume the scan from
    pub end_sequence: u64,
}

/// Bounded, monotonically sequenced observation buffer
#[derive(Debug)]
pub struct SequencedBuffer {
    capacity: usize,
    entries: VecDeque<BufferedObservation>,
    first_sequence: u64,
    next_sequence: u64,
    latest: HashMap<PointKey, BufferedObservation>,
    evicted: u64,
}

impl SequencedBuffer {
    /// Create a buffer holding at most `capacity` records (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(4096)),
            first_sequence: 1,
            next_sequence: 1,
            latest: HashMap::new(),
            evicted: 0,
        }
    }

    /// Append a record, evicting the oldest one if full
    pub fn append(&mut self, record: impl Into<Arc<ObservationRecord>>) -> Appended {
        let record = record.into();
        let sequence = self.next_sequence;

        if let Some(previous) = self.latest.get(record.key()) {
            if previous.timestamp() > record.timestamp() {
                log::warn!(
                    "out-of-order timestamp for {}: {} after {}",
                    record.key(),
                    record.timestamp(),
                    previous.timestamp()
                );
            }
        }

        let evicted = if self.entries.len() == self.capacity {
            let evicted = self.entries.pop_front();
            self.first_sequence += 1;
            self.evicted += 1;
            evicted
        } else {
            None
        };

        let observation = BufferedObservation { sequence, record };
        self.latest
            .insert(observation.key().clone(), observation.clone());
        self.entries.push_back(observation);
        self.next_sequence += 1;

        log::trace!("appended sequence {}", sequence);
        Appended { sequence, evicted }
    }

    /// Up to `count` records starting at `max(from, first_sequence)`.
    ///
    /// Empty when `from` is past the last sequence.
    pub fn slice(&self, from: u64, count: usize) -> Vec<BufferedObservation> {
        if count == 0 || self.entries.is_empty() || from > self.last_sequence() {
            return Vec::new();
        }
        let start = (from.max(self.first_sequence) - self.first_sequence) as usize;
        self.entries.iter().skip(start).take(count).cloned().collect()
    }

    /// Scan forward from `from`, collecting up to `count` records that
    /// match `filter`.
    pub fn scan<F>(&self, from: u64, count: usize, filter: F) -> Window
    where
        F: Fn(&BufferedObservation) -> bool,
    {
        let mut window = Window {
            observations: Vec::new(),
            end_sequence: self.next_sequence,
        };
        if count == 0 || self.entries.is_empty() || from > self.last_sequence() {
            return window;
        }

        let start = (from.max(self.first_sequence) - self.first_sequence) as usize;
        for observation in self.entries.iter().skip(start) {
            if filter(observation) {
                window.observations.push(observation.clone());
                if window.observations.len() == count {
                    window.end_sequence = observation.sequence + 1;
                    break;
                }
            }
        }
        window
    }

    /// Record with the given sequence, if still buffered
    pub fn get(&self, sequence: u64) -> Option<&BufferedObservation> {
        if sequence < self.first_sequence || sequence >= self.next_sequence {
            return None;
        }
        self.entries.get((sequence - self.first_sequence) as usize)
    }

    /// Most recent record of a point, buffered or evicted
    pub fn latest(&self, key: &PointKey) -> Option<&BufferedObservation> {
        self.latest.get(key)
    }

    /// Most recent record per point, in sequence order
    pub fn current(&self) -> Vec<BufferedObservation> {
        let mut current: Vec<_> = self.latest.values().cloned().collect();
        current.sort_by_key(|o| o.sequence);
        current
    }

    /// Most recent record per point as of sequence `at`.
    ///
    /// Only points with a record inside the buffer window at or before
    /// `at` appear.
    pub fn current_at(&self, at: u64) -> Result<Vec<BufferedObservation>> {
        if self.entries.is_empty() || at < self.first_sequence || at > self.last_sequence() {
            return Err(CoreError::SequenceOutOfRange {
                sequence: at,
                first: self.first_sequence,
                last: self.last_sequence(),
            });
        }

        let mut points: HashMap<&PointKey, &BufferedObservation> = HashMap::new();
        for observation in self.entries.iter().take_while(|o| o.sequence <= at) {
            points.insert(observation.key(), observation);
        }
        let mut current: Vec<_> = points.into_values().cloned().collect();
        current.sort_by_key(|o| o.sequence);
        Ok(current)
    }

    /// Counters at this instant
    pub fn header(&self) -> BufferHeader {
        BufferHeader {
            buffer_size: self.capacity,
            first_sequence: self.first_sequence,
            last_sequence: self.last_sequence(),
            next_sequence: self.next_sequence,
        }
    }

    /// Capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been buffered (or everything was evicted)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest buffered sequence
    pub fn first_sequence(&self) -> u64 {
        self.first_sequence
    }

    /// Newest buffered sequence
    pub fn last_sequence(&self) -> u64 {
        self.next_sequence - 1
    }

    /// Sequence of the next append
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Records evicted since creation
    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }

    /// Number of distinct points seen
    pub fn point_count(&self) -> usize {
        self.latest.len()
    }
}
