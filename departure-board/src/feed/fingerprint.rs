//! Feed content fingerprints.

use std::fmt;

/// Identifies the content of a feed.
///
/// Persisted next to the stop-time cache; a different fingerprint on
/// startup means the feed was replaced and every cached stop is stale.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FeedFingerprint(String);

impl FeedFingerprint {
    /// Wrap an already computed fingerprint.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build a fingerprint from per-table entries of (name, checksum, size).
    ///
    /// Entries are sorted first so archive order does not matter.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, u32, u64)>) -> Self {
        let mut parts: Vec<String> = entries
            .into_iter()
            .map(|(name, crc, size)| format!("{name}:{crc:08x}:{size}"))
            .collect();
        parts.sort();
        Self(parts.join(";"))
    }

    /// Returns the fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FeedFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedFingerprint({})", self.0)
    }
}

impl fmt::Display for FeedFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
