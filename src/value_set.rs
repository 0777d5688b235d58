//! Ordered key/value payload of a single observation
//!
//! A [`ValueSet`] carries one update to one monitored point: a `result`
//! for plain values, one key per entry for data sets, or the
//! `level`/`nativeCode`/... keys of a fault state. Keys are unique and
//! insertion order is part of the canonical form fed to the change
//! identifier, so two sets with the same pairs in a different order
//! digest differently.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Well-known semantic keys
pub mod keys {
    /// Scalar result of a sample or event
    pub const RESULT: &str = "result";
    /// Fault state level
    pub const LEVEL: &str = "level";
    /// Native diagnostic code distinguishing concurrent faults
    pub const NATIVE_CODE: &str = "nativeCode";
    /// Native severity reported by the controller
    pub const NATIVE_SEVERITY: &str = "nativeSeverity";
    /// LOW / HIGH qualifier
    pub const QUALIFIER: &str = "qualifier";
    /// Free-form fault message
    pub const MESSAGE: &str = "message";
    /// Number of samples in a time series
    pub const COUNT: &str = "count";
    /// Sample rate of a time series (Hz)
    pub const SAMPLE_RATE: &str = "sampleRate";
    /// Space separated time series samples
    pub const SAMPLES: &str = "samples";
}

/// Result value for a point that has no data
pub const UNAVAILABLE: &str = "UNAVAILABLE";

/// Ordered mapping from semantic keys to string values
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ValueSet {
    entries: Vec<(String, String)>,
}

impl ValueSet {
    /// Create an empty value set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a value set holding a single `result`
    pub fn result(value: impl Into<String>) -> Self {
        Self::new().with(keys::RESULT, value)
    }

    /// Create the value set of an unavailable point
    pub fn unavailable() -> Self {
        Self::result(UNAVAILABLE)
    }

    /// Builder form of [`ValueSet::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value.
    ///
    /// Replacing keeps the key at its original position. Returns the
    /// previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a key, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// The `result` value, if present
    pub fn result_value(&self) -> Option<&str> {
        self.get(keys::RESULT)
    }

    /// Check if the set reports an unavailable point
    pub fn is_unavailable(&self) -> bool {
        self.result_value() == Some(UNAVAILABLE)
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical text form used for digesting.
    ///
    /// `{len}:{key}{len}:{value}` per entry, in insertion order, with
    /// lengths in bytes. Keys and values may contain any character.
    pub fn canonical(&self) -> String {
        let capacity = self
            .entries
            .iter()
            .map(|(k, v)| k.len() + v.len() + 8)
            .sum();
        let mut out = String::with_capacity(capacity);
        for (key, value) in &self.entries {
            push_field(&mut out, key);
            push_field(&mut out, value);
        }
        out
    }
}

fn push_field(out: &mut String, field: &str) {
    out.push_str(&field.len().to_string());
    out.push(':');
    out.push_str(field);
}

impl<K, V> FromIterator<(K, V)> for ValueSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        set.extend(iter);
        set
    }
}

impl<K, V> Extend<(K, V)> for ValueSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}
