//! Change identifiers: deterministic content digests
//!
//! The canonical byte form of an observation is
//!
//! ```text
//! [device_key] 0x1F [payload] ( '@' [timestamp, decimal] )?
//! ```
//!
//! hashed with XXH3-128. Collision resistance is only needed for dedup,
//! not for security. Every record carries two digests: one without the
//! timestamp (detects "nothing changed since the last value") and one
//! with it (detects an exact resend).

use std::fmt;

use xxhash_rust::xxh3::xxh3_128;

/// Separator between the device key and the payload
const SEPARATOR: u8 = 0x1F;

/// Marker introducing the timestamp
const TIMESTAMP_MARKER: u8 = b'@';

/// Fixed-size content digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChangeId([u8; ChangeId::LEN]);

impl ChangeId {
    /// Digest length in bytes
    pub const LEN: usize = 16;

    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Lower-case hex rendering
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ChangeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// The two digests maintained per record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChangeIds {
    /// Digest excluding the timestamp
    pub content: ChangeId,
    /// Digest including the timestamp
    pub with_timestamp: ChangeId,
}

impl ChangeIds {
    /// Compute both digests over the same payload
    pub fn compute(device_key: Option<&str>, payload: &[u8], timestamp: i64) -> Self {
        Self {
            content: digest(device_key, payload, None),
            with_timestamp: digest(device_key, payload, Some(timestamp)),
        }
    }
}

/// Digest a payload, optionally including the timestamp
pub fn digest(device_key: Option<&str>, payload: &[u8], timestamp: Option<i64>) -> ChangeId {
    let device = device_key.unwrap_or_default();
    let mut data = Vec::with_capacity(device.len() + payload.len() + 24);
    data.extend_from_slice(device.as_bytes());
    data.push(SEPARATOR);
    data.extend_from_slice(payload);
    if let Some(ts) = timestamp {
        data.push(TIMESTAMP_MARKER);
        data.extend_from_slice(ts.to_string().as_bytes());
    }
    ChangeId(xxh3_128(&data).to_be_bytes())
}

/// Digest an ordered sequence of digests.
///
/// Order sensitive: the same ids in a different order yield a different
/// digest.
pub fn combine<'a, I>(device_key: Option<&str>, ids: I) -> ChangeId
where
    I: IntoIterator<Item = &'a ChangeId>,
{
    let mut payload = Vec::new();
    for id in ids {
        payload.extend_from_slice(id.as_bytes());
    }
    digest(device_key, &payload, None)
}
